mod common;

use macropanel_rs::{
    Category, Cell, Dataset, Dimension, DimensionSet, Error, IndexStyle, LabelMode, ObservationMap,
    decode,
};

fn two_dims() -> DimensionSet {
    DimensionSet::from_ordered(vec![
        Dimension::new(
            "geo",
            vec![
                Category::new("DE", Some("Germany".into())),
                Category::new("FR", None),
            ],
        ),
        Dimension::new(
            "unit",
            vec![
                Category::new("I15", Some("Index".into())),
                Category::new("PCH", Some("Percent change".into())),
                Category::new("RT", None),
            ],
        ),
    ])
}

#[test]
fn one_row_per_present_key_in_source_order() {
    let dataset = Dataset::from_json(&common::sdmx_sample()).unwrap();
    assert_eq!(dataset.style(), IndexStyle::Composite);
    let table = dataset.decode().unwrap();

    assert_eq!(table.len(), dataset.observations.len());
    assert_eq!(table.len(), 3);
    assert_eq!(table.columns(), ["freq", "geo", "period", "value"]);

    let rows = table.rows();
    assert_eq!(rows[0].label("geo"), Some("FR"));
    assert_eq!(rows[0].label("period"), Some("2020-02"));
    assert_eq!(rows[0].value(), Some(2.5));
    assert_eq!(rows[1].label("geo"), Some("Germany"));
    assert_eq!(rows[1].label("freq"), Some("Monthly"));
    assert_eq!(rows[1].value(), Some(1.5));
    // Present but empty value record.
    assert_eq!(rows[2].get("value"), Some(&Cell::Null));
    assert!(rows[2].get("TIME_PERIOD").is_none());
}

#[test]
fn label_falls_back_to_code() {
    let mut obs = ObservationMap::new(IndexStyle::Composite);
    obs.insert("0:0", Some(1.0));
    obs.insert("1:2", Some(2.0));
    let table = decode(&obs, &two_dims()).unwrap();
    assert_eq!(table.rows()[0].label("geo"), Some("Germany"));
    assert_eq!(table.rows()[1].label("geo"), Some("FR"));
    assert_eq!(table.rows()[1].label("unit"), Some("RT"));
}

#[test]
fn out_of_range_names_the_dimension() {
    let mut obs = ObservationMap::new(IndexStyle::Composite);
    obs.insert("0:0", Some(1.0));
    obs.insert("1:5", Some(2.0));
    match decode(&obs, &two_dims()) {
        Err(Error::IndexOutOfRange {
            dimension,
            index,
            size,
        }) => {
            assert_eq!(dimension, "unit");
            assert_eq!(index, 5);
            assert_eq!(size, 3);
        }
        other => panic!("expected IndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn out_of_range_in_payload_fails_whole_decode() {
    let mut payload = common::sdmx_sample();
    payload["dataSets"][0]["observations"]["0:2:0"] = serde_json::json!([9.0]);
    let err = Dataset::from_json(&payload).unwrap().decode().unwrap_err();
    assert!(err.to_string().contains("geo"), "{err}");
    assert!(!err.is_retriable());
}

#[test]
fn wrong_arity_is_malformed() {
    let mut obs = ObservationMap::new(IndexStyle::Composite);
    obs.insert("0:0:0", Some(1.0));
    assert!(matches!(
        decode(&obs, &two_dims()),
        Err(Error::MalformedPayload(_))
    ));
}

#[test]
fn decoding_is_deterministic() {
    let dataset = Dataset::from_json(&common::sdmx_sample()).unwrap();
    let a = serde_json::to_string(dataset.decode().unwrap().rows()).unwrap();
    let b = serde_json::to_string(dataset.decode().unwrap().rows()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn code_mode_emits_codes() {
    let dataset = Dataset::from_json(&common::sdmx_sample()).unwrap();
    let table = dataset.decode_with(LabelMode::Code).unwrap();
    assert_eq!(table.rows()[1].label("geo"), Some("DE"));
    assert_eq!(table.rows()[1].label("freq"), Some("M"));
}

#[test]
fn series_keyed_sdmx_decodes() {
    let payload = serde_json::json!({
        "structure": {"dimensions": {
            "series": [
                {"id": "FREQ", "values": [{"id": "M"}]},
                {"id": "CURRENCY", "values": [{"id": "USD", "name": "US dollar"}, {"id": "GBP", "name": "UK pound"}]}
            ],
            "observation": [{"id": "TIME_PERIOD", "values": [{"id": "2024-01"}, {"id": "2024-02"}]}]
        }},
        "dataSets": [{"series": {
            "0:0": {"observations": {"0": [1.09], "1": [1.08]}},
            "0:1": {"observations": {"1": [0.85]}}
        }}]
    });
    let table = Dataset::from_json(&payload).unwrap().decode().unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows()[2].label("CURRENCY"), Some("UK pound"));
    assert_eq!(table.rows()[2].label("period"), Some("2024-02"));
    assert_eq!(table.rows()[2].value(), Some(0.85));
}
