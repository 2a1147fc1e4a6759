use macropanel_rs::{CsvLayout, Error, decode_csv};

#[test]
fn sdmx_csv_columns_are_normalized() {
    let text = "DATAFLOW,LAST UPDATE,freq,geo,TIME_PERIOD,OBS_VALUE,OBS_FLAG\n\
                ESTAT:PRC_HICP_MIDX(1.0),01/02/25,M,DE,2024-01,125.3,\n\
                ESTAT:PRC_HICP_MIDX(1.0),01/02/25,M,DE,2024-02,126.1,p\n";
    let table = decode_csv(text, &CsvLayout::sdmx()).unwrap();
    assert_eq!(
        table.columns(),
        ["DATAFLOW", "LAST UPDATE", "freq", "geo", "period", "value", "OBS_FLAG"]
    );
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[1].label("period"), Some("2024-02"));
    assert_eq!(table.rows()[1].value(), Some(126.1));
    assert_eq!(table.rows()[1].label("OBS_FLAG"), Some("p"));
    assert!(table.rows()[0].get("OBS_FLAG").unwrap().is_null());
}

#[test]
fn missing_layout_column_is_malformed() {
    let err = decode_csv("a,b\n1,2\n", &CsvLayout::sdmx()).unwrap_err();
    assert!(matches!(err, Error::MalformedPayload(_)));
}

#[test]
fn ragged_rows_are_rejected() {
    let err = decode_csv("TIME_PERIOD,OBS_VALUE\n2020-01,1,extra\n", &CsvLayout::sdmx()).unwrap_err();
    assert!(matches!(err, Error::Csv(_)));
}
