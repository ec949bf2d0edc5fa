//! Upload ingestion - CSV and Excel (.xlsx) readers
//!
//! Both readers produce a `Dataset` of observations taken from the four
//! required columns. Other columns (including any pre-existing `failure`
//! column) are ignored.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use super::PipelineError;
use crate::models::{Observation, FEATURE_COLUMNS, FEATURE_COUNT};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Uploaded file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Pick format from the file name, falling back to content sniffing
    pub fn detect(file_name: Option<&str>, bytes: &[u8]) -> Result<Self, PipelineError> {
        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("xlsx") => Ok(SourceFormat::Xlsx),
            Some(other) => Err(PipelineError::UnsupportedFormat(other.to_string())),
            None if bytes.starts_with(ZIP_MAGIC) => Ok(SourceFormat::Xlsx),
            None => Ok(SourceFormat::Csv),
        }
    }
}

/// Rows parsed from an upload, in file order
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<Observation>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Parse an uploaded file
pub fn parse_upload(file_name: Option<&str>, bytes: &[u8]) -> Result<Dataset, PipelineError> {
    match SourceFormat::detect(file_name, bytes)? {
        SourceFormat::Csv => read_csv(bytes),
        SourceFormat::Xlsx => read_xlsx(bytes),
    }
}

pub fn read_csv(bytes: &[u8]) -> Result<Dataset, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::Parse(format!("failed to read header: {}", e)))?;
    let columns = ColumnMap::resolve(headers.iter())?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| PipelineError::Parse(format!("failed to read row {}: {}", index + 1, e)))?;
        let row = columns.extract(index + 1, |col| {
            record.get(col).map(parse_cell).unwrap_or(Cell::Missing)
        })?;
        rows.push(row);
    }

    Ok(Dataset { rows })
}

pub fn read_xlsx(bytes: &[u8]) -> Result<Dataset, PipelineError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| PipelineError::Parse(format!("failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(PipelineError::EmptyWorkbook)?
        .map_err(|e| PipelineError::Parse(format!("failed to read worksheet: {}", e)))?;

    let mut sheet_rows = range.rows();
    let header = sheet_rows.next().ok_or(PipelineError::EmptyWorkbook)?;
    let header_names: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();
    let columns = ColumnMap::resolve(header_names.iter().map(String::as_str))?;

    let mut rows = Vec::new();
    for (index, sheet_row) in sheet_rows.enumerate() {
        // Trailing blank rows are common in spreadsheets
        if sheet_row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let row = columns.extract(index + 1, |col| {
            sheet_row.get(col).map(xlsx_cell).unwrap_or(Cell::Missing)
        })?;
        rows.push(row);
    }

    Ok(Dataset { rows })
}

enum Cell {
    Number(f64),
    Missing,
    Invalid(String),
}

fn parse_cell(raw: &str) -> Cell {
    if raw.is_empty() {
        return Cell::Missing;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Cell::Number(value),
        _ => Cell::Invalid(raw.to_string()),
    }
}

fn xlsx_cell(cell: &Data) -> Cell {
    match cell {
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::String(text) => parse_cell(text.trim()),
        Data::Empty => Cell::Missing,
        other => Cell::Invalid(other.to_string()),
    }
}

/// Positions of the required columns within a header row
struct ColumnMap {
    indices: [usize; FEATURE_COUNT],
}

impl ColumnMap {
    fn resolve<'a>(headers: impl Iterator<Item = &'a str>) -> Result<Self, PipelineError> {
        let headers: Vec<&str> = headers.map(str::trim).collect();
        let mut indices = [0usize; FEATURE_COUNT];
        let mut missing = Vec::new();

        for (slot, name) in FEATURE_COLUMNS.iter().enumerate() {
            match headers.iter().position(|h| h == name) {
                Some(pos) => indices[slot] = pos,
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns(missing));
        }
        Ok(Self { indices })
    }

    fn extract(
        &self,
        row: usize,
        cell_at: impl Fn(usize) -> Cell,
    ) -> Result<Observation, PipelineError> {
        let mut values = [0.0; FEATURE_COUNT];
        for (slot, &col) in self.indices.iter().enumerate() {
            values[slot] = match cell_at(col) {
                Cell::Number(value) => value,
                Cell::Missing => {
                    return Err(PipelineError::InvalidValue {
                        row,
                        column: FEATURE_COLUMNS[slot],
                        value: String::new(),
                    })
                }
                Cell::Invalid(value) => {
                    return Err(PipelineError::InvalidValue {
                        row,
                        column: FEATURE_COLUMNS[slot],
                        value,
                    })
                }
            };
        }
        Ok(Observation::new(values[0], values[1], values[2], values[3]))
    }
}
