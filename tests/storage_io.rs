mod common;

use macropanel_rs::{CsvLayout, Dataset, Panel, Series, SeriesSpec, decode_csv, storage};
use std::fs;
use tempfile::tempdir;

#[test]
fn save_table_csv_and_json() {
    let table = Dataset::from_json(&common::sdmx_sample())
        .unwrap()
        .decode()
        .unwrap();
    let dir = tempdir().unwrap();

    let csv_path = dir.path().join("table.csv");
    storage::save_table_csv(&table, &csv_path).unwrap();
    let csv_txt = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_txt.starts_with("freq,geo,period,value"));
    assert_eq!(csv_txt.lines().count(), 1 + table.len());
    // Null value is an empty cell.
    assert!(csv_txt.lines().last().unwrap().ends_with(','));

    let json_path = dir.path().join("table.json");
    storage::save_table_json(&table, &json_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), table.len());
    assert_eq!(arr[0]["geo"], "FR");
    assert_eq!(arr[0]["value"], 2.5);
    assert!(arr[2]["value"].is_null());
}

//labels come straight from remote metadata and could carry spreadsheet formulas;
//those cells get a leading single quote
#[test]
fn csv_cells_are_prefixed_to_avoid_formulas() {
    let text = "geo,TIME_PERIOD,OBS_VALUE,note\n=HYPERLINK(1),2020-01,-1.5,@foo\n";
    let table = decode_csv(text, &CsvLayout::sdmx()).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("injection.csv");
    storage::save_table_csv(&table, &path).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    let row = rdr.records().next().expect("one data row expected").unwrap();
    let cell = |name: &str| {
        let idx = headers.iter().position(|h| h == name).expect("header present");
        row.get(idx).unwrap().to_string()
    };

    assert!(cell("geo").starts_with("'=HYPERLINK"), "geo not prefixed");
    assert_eq!(cell("note"), "'@foo");
    // Negative numbers are values, not formulas.
    assert_eq!(cell("value"), "-1.5");
}

#[test]
fn save_panel_csv_writes_empty_cells_for_gaps() {
    let table = decode_csv(
        "geo,TIME_PERIOD,OBS_VALUE\nDE,2020-01,1\nFR,2020-01,2\n",
        &CsvLayout::sdmx(),
    )
    .unwrap();
    let a = Series::from_table(&table, "a", &SeriesSpec::by_country("geo")).unwrap();
    let b_table = decode_csv("geo,TIME_PERIOD,OBS_VALUE\nDE,2020-01,5\n", &CsvLayout::sdmx()).unwrap();
    let b = Series::from_table(&b_table, "b", &SeriesSpec::by_country("geo")).unwrap();
    let mut panel = Panel::from_series(&a);
    panel.merge(&b, macropanel_rs::JoinKind::Left).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("panel.csv");
    storage::save_panel_csv(&panel, &path).unwrap();
    let txt = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = txt.lines().collect();
    assert_eq!(lines, ["country,month,a,b", "DE,2020-01,1,5", "FR,2020-01,2,"]);
}
