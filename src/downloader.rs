use std::error::Error;

use crate::metrics::{MetricsTable, Schema};

/// Convert a metrics table to CSV format.
///
/// Produces the fixed header row of the given layout followed by one line
/// per week, in table order. Fields containing commas, quotes or newlines
/// are quoted with doubled inner quotes. This is both the persistence format
/// of the storage layer and the payload of the `/export.csv` download.
///
/// # Arguments
/// * `table` - The table to serialize
/// * `schema` - Column layout to emit
///
/// # Examples
/// ```
/// use suivi_vsx::downloader::to_csv;
/// use suivi_vsx::metrics::{MetricsRow, MetricsTable, Schema};
///
/// let table = MetricsTable::new().upsert(MetricsRow {
///     week: "Semaine 1".to_string(),
///     new_cases_j0: 50,
///     returns_j7: 26,
///     ..Default::default()
/// });
/// let csv = to_csv(&table, Schema::Core);
/// assert!(csv.starts_with("Semaine,Nouveaux_Cas_J0"));
/// assert!(csv.contains("Semaine 1,50,26,0,0"));
/// ```
pub fn to_csv(table: &MetricsTable, schema: Schema) -> String {
    let mut csv_content = String::new();

    csv_content.push_str(&schema.headers().join(","));
    csv_content.push('\n');

    for row in &table.rows {
        csv_content.push_str(&escape_field(&row.week));
        for value in row.counters(schema) {
            csv_content.push(',');
            csv_content.push_str(&value.to_string());
        }
        csv_content.push('\n');
    }

    csv_content
}

/// Convert a metrics table to XLSX format.
///
/// Exports the raw counters (never the derived rates) to an Excel workbook
/// using the rust_xlsxwriter library, returned as an in-memory buffer for
/// the `/export.xlsx` download. No round-trip import of this file exists.
///
/// # Arguments
/// * `table` - The table to export
/// * `schema` - Column layout to emit
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
pub fn to_xlsx(table: &MetricsTable, schema: Schema) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (col, header) in schema.headers().iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.week)?;
        for (j, value) in row.counters(schema).iter().enumerate() {
            worksheet.write_number(r, (j + 1) as u16, *value as f64)?;
        }
    }

    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Quote a CSV field if it contains a comma, quote or newline.
fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}
