//! Uploaded spreadsheet → `{columns, rows}`.
//!
//! Workbooks (xlsx, xlsm, xlsb, xls, ods) are read with calamine; anything
//! else is read as CSV text, UTF-8 when valid and Windows-1252 otherwise. Only the first worksheet
//! is used. Its first row names the columns and every later non-blank row
//! becomes one JSON object keyed by those names.

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::api::format::number_value;

/// Name given to columns whose header cell is blank
const EMPTY_HEADER: &str = "__EMPTY";

/// ZIP container (xlsx, xlsm, xlsb, ods)
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// OLE compound document (legacy xls)
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Workbook has no worksheets")]
    NoWorksheet,

    #[error("Unrecognized file format")]
    UnknownFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetTable {
    /// Keys of the first row object, in header order
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

/// Parse an uploaded file held in memory
pub fn parse_workbook(bytes: &[u8]) -> Result<SheetTable, SheetError> {
    let grid = if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        read_workbook(bytes)?
    } else {
        read_csv(bytes)?
    };
    Ok(table_from_grid(grid))
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<Value>>, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook.worksheet_range_at(0).ok_or(SheetError::NoWorksheet)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect())
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => number_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        // Dates go out as Excel serial numbers
        Data::DateTime(dt) => number_value(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(e.to_string()),
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<Value>>, SheetError> {
    // NUL never appears in text exports
    if bytes.contains(&0) {
        return Err(SheetError::UnknownFormat);
    }
    let decoded = decode_text(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&*decoded);

    Ok(parse_csv_records(text)
        .into_iter()
        .map(|record| record.iter().map(|field| csv_value(field)).collect())
        .collect())
}

/// Code points for 0x80..=0x9F in Windows-1252. Unassigned bytes keep
/// their Latin-1 control character.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

/// UTF-8 when the bytes are valid UTF-8, otherwise Windows-1252 as spreadsheet
/// programs write it on Windows
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(
            bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9F => CP1252_HIGH[usize::from(b - 0x80)],
                    _ => char::from(b),
                })
                .collect(),
        ),
    }
}

/// Split CSV text into records. Quoted fields may hold commas, newlines and
/// doubled quotes.
fn parse_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => record.push(std::mem::take(&mut field)),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

fn csv_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    let trimmed = field.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if trimmed.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return number_value(n);
            }
        }
    }
    Value::String(field.to_string())
}

fn table_from_grid(grid: Vec<Vec<Value>>) -> SheetTable {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let mut grid = grid.into_iter();
    let Some(header) = grid.next() else {
        return SheetTable::default();
    };

    let keys = header_names(&header, width);
    let rows: Vec<Map<String, Value>> = grid
        .map(|row| {
            keys.iter()
                .zip(row)
                .filter(|(_, cell)| !cell.is_null())
                .map(|(key, cell)| (key.clone(), cell))
                .collect::<Map<String, Value>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    let columns = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    SheetTable { columns, rows }
}

/// One unique key per column: blank headers become `__EMPTY`, and repeats
/// get `_1`, `_2`, ... appended until unique.
fn header_names(header: &[Value], width: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    (0..width)
        .map(|i| {
            let base = header.get(i).map(header_text).unwrap_or_default();
            let base = if base.is_empty() { EMPTY_HEADER.to_string() } else { base };

            let mut name = base.clone();
            let mut n = 1;
            while seen.contains(&name) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

fn header_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}
