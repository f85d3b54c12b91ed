// src/sheet/mod.rs
pub mod cache;
pub mod date_parser;
pub mod utils;

use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use utils::{cell_to_string, clean_str};

pub use cache::TableCache;

/// Prefix pandas gives to header-less spreadsheet columns.
const JUNK_COLUMN_PREFIX: &str = "Unnamed";

/// A sheet read wholesale into memory, every cell already cleaned to a string.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    /// Column names from the header row, junk columns removed.
    pub headers: Vec<String>,
    /// Data rows, each exactly `headers.len()` wide.
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    /// Build a sheet from a header row and data rows, dropping junk columns
    /// (empty or `Unnamed…` headers) and blank rows.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let keep: Vec<usize> = header
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty() && !h.starts_with(JUNK_COLUMN_PREFIX))
            .map(|(i, _)| i)
            .collect();
        if keep.len() != header.len() {
            debug!(dropped = header.len() - keep.len(), "dropped junk columns");
        }

        let headers = keep.iter().map(|&i| header[i].clone()).collect();
        let rows = rows
            .into_iter()
            .filter(|r| r.iter().any(|c| !c.is_empty()))
            .map(|r| {
                keep.iter()
                    .map(|&i| r.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell by row index and column name; `None` when the column is absent.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// Hard stop when any of `required` is absent, reporting what *was* found.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| self.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingColumns {
                missing,
                found: self.headers.clone(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetFormat {
    Workbook,
    Csv,
}

fn detect_format(path: &Path) -> Option<SheetFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SheetFormat::Workbook),
        "csv" => Some(SheetFormat::Csv),
        _ => None,
    }
}

/// List the sheet names of a workbook (a CSV file has a single unnamed sheet).
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    match detect_format(path) {
        Some(SheetFormat::Workbook) => {
            let workbook =
                open_workbook_auto(path).map_err(|e| Error::Workbook(e.to_string()))?;
            Ok(workbook.sheet_names())
        }
        Some(SheetFormat::Csv) => Ok(vec![String::new()]),
        None => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load a spreadsheet into memory.
///
/// `sheet` picks a worksheet by name; `None` takes the first one. It is
/// ignored for CSV input.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_sheet<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<RawSheet> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let raw = match detect_format(path) {
        Some(SheetFormat::Workbook) => load_workbook(path, sheet)?,
        Some(SheetFormat::Csv) => {
            if sheet.is_some() {
                debug!("sheet name ignored for CSV input");
            }
            let file = File::open(path)?;
            read_csv(file)?
        }
        None => return Err(Error::UnsupportedFormat(path.to_path_buf())),
    };

    info!(
        rows = raw.rows.len(),
        columns = raw.headers.len(),
        "loaded spreadsheet"
    );
    Ok(raw)
}

fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::Workbook(e.to_string()))?;
    let available = workbook.sheet_names();

    let name = match sheet {
        Some(name) if available.iter().any(|s| s == name) => name.to_string(),
        Some(name) => {
            return Err(Error::SheetNotFound {
                name: name.to_string(),
                available,
            })
        }
        None => available
            .first()
            .cloned()
            .ok_or_else(|| Error::Workbook("workbook has no sheets".into()))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| Error::Workbook(format!("reading sheet `{}`: {}", name, e)))?;
    Ok(range_to_sheet(&range))
}

fn range_to_sheet(range: &Range<Data>) -> RawSheet {
    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(h) => h.iter().map(cell_to_string).collect(),
        None => {
            warn!("sheet is empty");
            return RawSheet {
                headers: Vec::new(),
                rows: Vec::new(),
            };
        }
    };
    let data = rows
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect();
    RawSheet::from_rows(header, data)
}

/// Parse CSV text (first record = header) into a sheet.
pub fn read_csv<R: Read>(reader: R) -> Result<RawSheet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records();
    let header: Vec<String> = match records.next() {
        Some(rec) => rec?.iter().map(clean_str).collect(),
        None => {
            return Ok(RawSheet {
                headers: Vec::new(),
                rows: Vec::new(),
            })
        }
    };

    let mut data = Vec::new();
    for rec in records {
        let rec = rec?;
        data.push(rec.iter().map(clean_str).collect());
    }
    Ok(RawSheet::from_rows(header, data))
}
