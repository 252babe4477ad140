use crate::data::{Dataset, Record, Value};
use thiserror::Error;

/// Errors from CSV ingestion, distinguishing grammar violations from
/// structurally valid but empty input.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV Parsing Error: {0}")]
    Malformed(String),
    #[error("CSV data is empty or contains only headers.")]
    Empty,
}

/// Parse raw CSV text into a dataset.
///
/// The first non-empty line is the header row; subsequent non-empty lines
/// are data rows mapped positionally to the headers. Ragged rows are
/// permitted: missing trailing fields are absent from that record, extra
/// fields beyond the header count are dropped. Field values are typed
/// opportunistically (see [`Value::from_field`]).
pub fn parse_csv(csv_text: &str) -> Result<Dataset, CsvError> {
    check_quotes(csv_text)?;

    // The csv reader treats the first record as headers and skips fully
    // blank lines on its own; leading blank lines are stripped here so the
    // header row really is the first non-empty line.
    let body = csv_text.trim_start_matches(['\r', '\n']);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::Malformed(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::Empty);
    }

    let mut records: Vec<Record> = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| CsvError::Malformed(e.to_string()))?;
        let mut record = Record::new();
        for (i, field) in row.iter().enumerate() {
            if let Some(header) = headers.get(i) {
                record.insert(header.clone(), Value::from_field(field));
            }
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(CsvError::Empty);
    }

    Ok(Dataset { headers, records })
}

/// Pre-scan for unterminated quoted fields.
///
/// The csv reader is lenient about a quote left open at end of input (it
/// silently swallows the rest of the file into one field), so quote balance
/// is checked up front with the offending row number in the error.
fn check_quotes(csv_text: &str) -> Result<(), CsvError> {
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut row = 1usize;
    let mut open_row = 1usize;

    let mut chars = csv_text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote inside a quoted field
                    chars.next();
                } else {
                    in_quotes = false;
                    at_field_start = false;
                }
            }
            continue;
        }
        match c {
            '"' if at_field_start => {
                in_quotes = true;
                open_row = row;
            }
            ',' => at_field_start = true,
            '\n' => {
                row += 1;
                at_field_start = true;
            }
            '\r' => {}
            _ => at_field_start = false,
        }
    }

    if in_quotes {
        return Err(CsvError::Malformed(format!(
            "unterminated quoted field on row {open_row}"
        )));
    }
    Ok(())
}
