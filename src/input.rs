use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::LoadError;

pub const ID_COLUMN: &str = "URL_ID";
pub const URL_COLUMN: &str = "URL";

/// One input row. The id is opaque and echoed back in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlRecord {
    pub id: String,
    pub url: String,
}

/// Read the (URL_ID, URL) sheet, preserving row order.
pub fn load_urls(path: &Path) -> Result<Vec<UrlRecord>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let rows = match ext.as_deref() {
        Some("csv") => read_csv(path)?,
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => read_workbook(path)?,
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let records = records_from_rows(path, rows)?;
    info!("Loaded {} urls from {}", records.len(), path.display());
    Ok(records)
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, LoadError> {
    let sheet_err = |e: csv::Error| LoadError::Sheet {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(sheet_err)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(sheet_err)?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>, LoadError> {
    let sheet_err = |reason: String| LoadError::Sheet {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| sheet_err("workbook has no worksheets".into()))?
        .map_err(|e| sheet_err(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

/// Spreadsheets store numeric ids as floats; render `7.0` as `7`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn records_from_rows(path: &Path, rows: Vec<Vec<String>>) -> Result<Vec<UrlRecord>, LoadError> {
    let mut rows = rows.into_iter();
    let header = rows.next().ok_or_else(|| LoadError::Sheet {
        path: path.to_path_buf(),
        reason: "no header row".into(),
    })?;

    let column = |name: &'static str| {
        header
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
            .ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
    };
    let id_idx = column(ID_COLUMN)?;
    let url_idx = column(URL_COLUMN)?;

    let mut records = Vec::new();
    for (line, row) in rows.enumerate() {
        let id = row.get(id_idx).map(|s| s.trim().to_string()).unwrap_or_default();
        let url = row.get(url_idx).map(|s| s.trim().to_string()).unwrap_or_default();
        if url.is_empty() {
            // +2: one for the header, one for 1-based numbering
            warn!(row = line + 2, id = %id, "Skipping row with empty URL");
            continue;
        }
        records.push(UrlRecord { id, url });
    }
    Ok(records)
}
