mod common;

use macropanel_rs::{
    Category, Dataset, Dimension, DimensionSet, Error, IndexStyle, ObservationMap, decode,
};
use serde_json::json;

#[test]
fn sparse_flat_keys_in_ascending_order() {
    let dataset = Dataset::from_json(&common::json_stat_sample()).unwrap();
    assert_eq!(dataset.style(), IndexStyle::Flat);
    let table = dataset.decode().unwrap();

    assert_eq!(table.len(), 3);
    assert!(table.len() <= dataset.dimensions.address_space().unwrap());
    assert_eq!(table.columns(), ["geo", "period", "value"]);

    let got: Vec<(&str, &str, Option<f64>)> = table
        .rows()
        .iter()
        .map(|r| (r.label("geo").unwrap(), r.label("period").unwrap(), r.value()))
        .collect();
    assert_eq!(
        got,
        vec![
            ("Germany", "2020-01", Some(1.5)),
            ("France", "2020-02", Some(2.5)),
            ("France", "2020-03", Some(3.0)),
        ]
    );
}

#[test]
fn first_dimension_varies_slowest() {
    // 2 x 3 x 2 cube; flat 7 = 1*6 + 0*2 + 1.
    let dims = DimensionSet::from_ordered(vec![
        Dimension::new("a", vec![Category::new("a0", None), Category::new("a1", None)]),
        Dimension::new(
            "b",
            vec![
                Category::new("b0", None),
                Category::new("b1", None),
                Category::new("b2", None),
            ],
        ),
        Dimension::new("c", vec![Category::new("c0", None), Category::new("c1", None)]),
    ]);
    let mut obs = ObservationMap::new(IndexStyle::Flat);
    obs.insert("7", Some(7.0));
    obs.insert("11", Some(11.0));
    let table = decode(&obs, &dims).unwrap();
    let r = &table.rows()[0];
    assert_eq!(
        (r.label("a"), r.label("b"), r.label("c")),
        (Some("a1"), Some("b0"), Some("c1"))
    );
    let r = &table.rows()[1];
    assert_eq!(
        (r.label("a"), r.label("b"), r.label("c")),
        (Some("a1"), Some("b2"), Some("c1"))
    );
}

#[test]
fn dense_value_array_skips_nulls() {
    let mut payload = common::json_stat_sample();
    payload["value"] = json!([1.0, null, null, null, 2.0, null]);
    let table = Dataset::from_json(&payload).unwrap().decode().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[1].label("geo"), Some("France"));
    assert_eq!(table.rows()[1].label("period"), Some("2020-02"));
}

#[test]
fn flat_index_past_address_space_is_out_of_range() {
    let mut payload = common::json_stat_sample();
    payload["value"] = json!({"6": 1.0});
    match Dataset::from_json(&payload).unwrap().decode() {
        Err(Error::IndexOutOfRange { dimension, index, .. }) => {
            assert_eq!(dimension, "geo");
            assert_eq!(index, 2);
        }
        other => panic!("expected IndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn non_numeric_flat_key_is_malformed() {
    let mut payload = common::json_stat_sample();
    payload["value"] = json!({"zero": 1.0});
    assert!(matches!(
        Dataset::from_json(&payload).unwrap().decode(),
        Err(Error::MalformedPayload(_))
    ));
}

#[test]
fn zero_padded_or_spaced_flat_keys_are_malformed() {
    let mut payload = common::json_stat_sample();
    payload["value"] = json!({"1": 1.0, "01": 2.0, " 1": 3.0});
    assert!(matches!(
        Dataset::from_json(&payload).unwrap().decode(),
        Err(Error::MalformedPayload(_))
    ));
}

#[test]
fn canonical_flat_keys_give_one_row_per_position() {
    let mut payload = common::json_stat_sample();
    payload["value"] = json!({"1": 1.0, "0": 2.0});
    let dataset = Dataset::from_json(&payload).unwrap();
    let table = dataset.decode().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[0].value(), Some(2.0));
    assert_eq!(table.rows()[1].label("period"), Some("2020-02"));
}

#[test]
fn flat_key_without_dimensions_is_out_of_range() {
    let dims = DimensionSet::from_ordered(Vec::new());
    assert_eq!(dims.address_space(), Some(1));
    let mut obs = ObservationMap::new(IndexStyle::Flat);
    obs.insert("5", Some(5.0));
    match decode(&obs, &dims) {
        Err(Error::IndexOutOfRange { index, size, .. }) => {
            assert_eq!(index, 5);
            assert_eq!(size, 1);
        }
        other => panic!("expected IndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn time_dimension_next_to_period_dimension_is_malformed() {
    let payload = json!({
        "id": ["period", "time"],
        "size": [1, 1],
        "dimension": {
            "period": {"category": {"index": ["P1M"]}},
            "time": {"category": {"index": ["2020-01"]}}
        },
        "value": [1.0]
    });
    assert!(matches!(
        Dataset::from_json(&payload).unwrap().decode(),
        Err(Error::MalformedPayload(_))
    ));
}
