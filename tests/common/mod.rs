#![allow(dead_code)]

use macropanel_rs::{Error, RawResponse, Result, Sleeper, Transport};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

/// Transport that replays a fixed list of outcomes and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: RefCell<VecDeque<Result<RawResponse>>>,
    pub calls: Cell<usize>,
    pub urls: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<RawResponse>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            ..Self::default()
        }
    }

    pub fn ok_json(v: &Value) -> Result<RawResponse> {
        Ok(RawResponse::new(200, serde_json::to_vec(v).unwrap()))
    }

    pub fn status(code: u16) -> Result<RawResponse> {
        Ok(RawResponse::new(code, format!("status {code}")))
    }

    pub fn refused() -> Result<RawResponse> {
        Err(Error::TransientTransport("connection refused".into()))
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<RawResponse> {
        self.calls.set(self.calls.get() + 1);
        self.urls.borrow_mut().push(url.to_string());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(Error::TransientTransport("script exhausted".into())))
    }
}

/// Sleeper that records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.delays.borrow_mut().push(delay);
    }
}

/// SDMX-JSON dataset: freq(1) x geo(2) x TIME_PERIOD(2), three observations.
pub fn sdmx_sample() -> Value {
    json!({
        "header": {"id": "STS_RT_M"},
        "structure": {
            "dimensions": {
                "observation": [
                    {"id": "freq", "values": [{"id": "M", "name": "Monthly"}]},
                    {"id": "geo", "values": [
                        {"id": "DE", "name": "Germany"},
                        {"id": "FR"}
                    ]},
                    {"id": "TIME_PERIOD", "values": [
                        {"id": "2020-01", "name": "2020-01"},
                        {"id": "2020-02", "name": "2020-02"}
                    ]}
                ]
            }
        },
        "dataSets": [{
            "observations": {
                "0:1:1": [2.5, 0],
                "0:0:0": [1.5],
                "0:0:1": []
            }
        }]
    })
}

/// JSON-stat 2.0 dataset: geo(2) x time(3), sparse values at flat 0, 4 and 5.
pub fn json_stat_sample() -> Value {
    json!({
        "version": "2.0",
        "class": "dataset",
        "id": ["geo", "time"],
        "size": [2, 3],
        "dimension": {
            "geo": {"category": {
                "index": {"DE": 0, "FR": 1},
                "label": {"DE": "Germany", "FR": "France"}
            }},
            "time": {"category": {
                "index": ["2020-01", "2020-02", "2020-03"]
            }}
        },
        "value": {"5": 3.0, "0": 1.5, "4": 2.5}
    })
}
