//! Offline workbook inspection
//!
//! Lists the sheets of a local `.xlsx`/`.xls` file before it is uploaded. The
//! backend remains the authority on which sheets are valid.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{NominaError, NominaResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SheetSummary {
    pub name: String,
    /// Data rows, header excluded.
    pub rows: usize,
    pub columns: usize,
    pub headers: Vec<String>,
}

/// Sheet names in workbook order with their header row and data row count.
pub fn inspect<P: AsRef<Path>>(path: P) -> NominaResult<Vec<SheetSummary>> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| NominaError::Workbook(format!("{}: {}", path.display(), e)))?;

    let names = workbook.sheet_names().to_vec();
    let mut summaries = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| NominaError::Workbook(format!("sheet '{}': {}", name, e)))?;

        let headers: Vec<String> = range
            .rows()
            .next()
            .map(|row| {
                row.iter()
                    .map(cell_text)
                    .take_while(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let rows = range
            .rows()
            .skip(1)
            .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
            .count();

        debug!(sheet = %name, rows, columns = range.width(), "inspected sheet");
        summaries.push(SheetSummary {
            name,
            rows,
            columns: range.width(),
            headers,
        });
    }
    Ok(summaries)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
