use crate::error::ImportError;
use crate::schema::SheetRow;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::Timelike;
use std::collections::HashMap;
use std::io::Cursor;

/// Header used for columns whose header cell is blank.
const EMPTY_HEADER: &str = "__EMPTY";

/// Decode a workbook held in memory and return the rows of its first sheet
///
/// The format (xlsx, xlsm, xlsb, xls, ods) is detected from the bytes. The
/// first sheet is chosen by position, its first row supplies the keys and
/// every following row becomes one [`SheetRow`] whose values are the cells'
/// display text.
///
/// # Arguments
/// * `bytes` - The complete file contents
///
/// # Returns
/// * `Result<Vec<SheetRow>, ImportError>` - The data rows in sheet order, or a parse error
///
/// # Examples
/// ```no_run
/// use corridas_dashboard::workbook::read_first_sheet;
///
/// let bytes = std::fs::read("corridas.xlsx").unwrap();
/// match read_first_sheet(&bytes) {
///     Ok(rows) => println!("Sheet has {} data rows", rows.len()),
///     Err(e) => eprintln!("Error reading workbook: {}", e),
/// }
/// ```
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<SheetRow>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoSheets)??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_keys(header_row),
        None => return Ok(Vec::new()),
    };

    let records = rows
        .map(|cells| {
            headers
                .iter()
                .zip(cells)
                .filter_map(|(header, cell)| Some((header.clone(), display_text(cell)?)))
                .collect::<SheetRow>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(records)
}

/// Keys for each header cell; blanks become `__EMPTY` and repeats get `_1`, `_2`, ...
fn header_keys(cells: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    cells
        .iter()
        .map(|cell| {
            let base = display_text(cell).unwrap_or_else(|| EMPTY_HEADER.to_string());
            let count = seen.entry(base.clone()).or_insert(0);
            let key = if *count == 0 {
                base
            } else {
                format!("{}_{}", base, count)
            };
            *count += 1;
            key
        })
        .collect()
}

/// Text shown for a cell, or `None` when the cell is empty
///
/// Numbers and dates are rendered as text rather than kept as native values.
pub fn display_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) if dt.is_duration() => format_duration(dt.as_f64()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time().num_seconds_from_midnight() == 0 => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    };
    Some(text)
}

/// Significant digits kept when a fractional number is shown, as Excel's
/// General format does.
const GENERAL_DIGITS: usize = 11;

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    // Round through scientific notation so binary noise like 0.30000000000000004 goes away.
    let rounded = format!("{:.*e}", GENERAL_DIGITS - 1, value)
        .parse::<f64>()
        .unwrap_or(value);
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

// Excel stores durations as fractional days.
fn format_duration(days: f64) -> String {
    let total = (days * 86_400.0).round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
