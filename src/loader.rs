use std::error::Error;

use crate::metrics::{MetricsRow, MetricsTable, Schema};

/// Parse CSV text into a metrics table.
///
/// The first line must carry exactly the headers of the given layout (see
/// [`Schema::headers`]); every following non-empty line becomes one row, in
/// file order. Counter cells are coerced leniently: spreadsheet services
/// export integers as floats (`26.0`), and a blank or unparseable cell loads
/// as 0 rather than failing the whole table.
///
/// # Arguments
/// * `text` - Full CSV document, header included
/// * `schema` - Column layout the document is expected to follow
///
/// # Returns
/// * `Result<MetricsTable, Box<dyn Error>>` - The parsed table or an error
///
/// # Examples
/// ```
/// use suivi_vsx::loader::from_csv_text;
/// use suivi_vsx::metrics::Schema;
///
/// let text = "Semaine,Nouveaux_Cas_J0,Retours_J7,RDV_Doc_Med,Screening_Psy\n\
///             Semaine 1,50,26,40,30\n";
/// let table = from_csv_text(text, Schema::Core).unwrap();
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.rows[0].returns_j7, 26);
/// ```
pub fn from_csv_text(text: &str, schema: Schema) -> Result<MetricsTable, Box<dyn Error>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header_line = match lines.next() {
        Some(line) => line,
        // An empty body is an empty table, not an error: a freshly created
        // sheet has no header yet.
        None => return Ok(MetricsTable::new()),
    };

    let headers = parse_csv_row(header_line);
    let expected = schema.headers();
    if headers.len() != expected.len() {
        return Err(format!(
            "expected {} columns ({}), found {}",
            expected.len(),
            expected.join(", "),
            headers.len()
        )
        .into());
    }
    for (found, want) in headers.iter().zip(expected.iter()) {
        if found.trim() != *want {
            return Err(format!("unexpected column '{}' (expected '{}')", found, want).into());
        }
    }

    let mut table = MetricsTable::new();
    for line in lines {
        let fields = parse_csv_row(line);
        let week = fields.first().cloned().unwrap_or_default();
        let counter = |i: usize| -> u32 { fields.get(i).map(|f| coerce_counter(f)).unwrap_or(0) };

        let row = match schema {
            Schema::Full => MetricsRow {
                week,
                new_cases_j0: counter(1),
                returns_j7: counter(2),
                med_appointments: counter(3),
                psy_screenings: counter(4),
                at_risk_contacted: counter(5),
                hp_recalls: counter(6),
            },
            Schema::Core => MetricsRow {
                week,
                new_cases_j0: counter(1),
                returns_j7: counter(2),
                med_appointments: counter(3),
                psy_screenings: counter(4),
                at_risk_contacted: 0,
                hp_recalls: 0,
            },
        };
        table.rows.push(row);
    }

    Ok(table)
}

/// Coerce one counter cell to a non-negative integer.
///
/// Accepts plain integers and float renderings; anything else (including a
/// blank cell) becomes 0.
fn coerce_counter(field: &str) -> u32 {
    let trimmed = field.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return n;
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f > 0.0 => f.round() as u32,
        _ => 0,
    }
}

/// Parse a CSV row into a vector of strings.
///
/// Tracks quote state explicitly so commas inside quoted fields and doubled
/// quotes are handled correctly.
pub(crate) fn parse_csv_row(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if let Some(&next) = chars.peek() {
                    if next == '"' && in_quotes {
                        // Doubled quote inside a quoted field - literal quote
                        current_field.push('"');
                        chars.next();
                    } else {
                        in_quotes = !in_quotes;
                    }
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(current_field);
                current_field = String::new();
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    result.push(current_field);
    result
}
