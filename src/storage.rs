use crate::error::Result;
use crate::models::{Cell, TidyTable};
use crate::panel::Panel;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn sanitize(s: &str) -> String {
    let risky = match s.chars().next() {
        Some('=' | '+' | '@' | '\t' | '\r') => true,
        Some('-') => s.parse::<f64>().is_err(),
        _ => false,
    };
    if risky { format!("'{s}") } else { s.to_string() }
}

fn cell_text(cell: Option<&Cell>) -> String {
    match cell {
        Some(Cell::Label(s)) => sanitize(s),
        Some(Cell::Number(n)) => n.to_string(),
        Some(Cell::Null) | None => String::new(),
    }
}

/// Save a tidy table as CSV with a header row, columns in table order.
pub fn save_table_csv<P: AsRef<Path>>(table: &TidyTable, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(table.columns().iter().map(|c| cell_text(row.get(c))))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a tidy table as a pretty JSON array of row objects.
pub fn save_table_json<P: AsRef<Path>>(table: &TidyTable, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(table.rows())?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Save a panel as CSV: `country,month,<series...>`; missing values are empty.
pub fn save_panel_csv<P: AsRef<Path>>(panel: &Panel, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    let mut header = vec!["country".to_string(), "month".to_string()];
    header.extend(panel.columns().iter().cloned());
    wtr.write_record(&header)?;
    for (key, values) in panel.rows() {
        let mut record = vec![
            key.country.as_deref().map(sanitize).unwrap_or_default(),
            key.month.clone(),
        ];
        record.extend(values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
