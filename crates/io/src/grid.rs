// Headerless grids and header-aligned datasets

use std::collections::HashSet;

use serde::Serialize;

use crate::cell::CellValue;
use crate::error::RepairError;

/// Rows of cell values with no designated header. Row 0 is real data.
///
/// Every row has exactly `width` cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DecodedGrid {
    width: usize,
    rows: Vec<Vec<CellValue>>,
}

impl DecodedGrid {
    /// Build a rectangular grid from ragged records. The widest record sets
    /// the width; shorter ones are padded with `Empty`.
    pub fn from_records(records: Vec<Vec<CellValue>>) -> Self {
        let width = records.iter().map(Vec::len).max().unwrap_or(0);
        let rows = records
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { width, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.width
    }

    /// Zero rows or zero columns
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Positional column names ("0", "1", ...)
    pub fn column_names(&self) -> Vec<String> {
        (0..self.width).map(|c| c.to_string()).collect()
    }
}

/// Named columns plus data rows aligned to them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset directly from data. Columns are de-duplicated; each
    /// row is padded or cut to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns = unique_column_names(columns);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Split decoded records at `header` (0-based).
    ///
    /// Records before the header are discarded. The header record sets the
    /// width. A later record that is still wider once its trailing empty
    /// fields are dropped is malformed and skipped; narrower records are padded.
    pub fn from_records(records: Vec<Vec<CellValue>>, header: usize) -> Result<Self, RepairError> {
        let row_count = records.len();
        let mut iter = records.into_iter().skip(header);
        let header_cells = iter.next().ok_or(RepairError::HeaderRowOutOfRange {
            requested: header + 1,
            row_count,
        })?;

        let width = header_cells.len();
        let columns = header_names(&header_cells);

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for mut row in iter {
            while row.len() > width && row.last().is_some_and(CellValue::is_empty) {
                row.pop();
            }
            if row.len() > width {
                skipped += 1;
                continue;
            }
            row.resize(width, CellValue::Empty);
            rows.push(row);
        }

        if skipped > 0 {
            log::warn!("skipped {} malformed row(s) wider than the {} header columns", skipped, width);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows a preview of `requested` rows would show, clamped to
    /// `[1, row_count]` (0 for a header-only dataset).
    pub fn preview_len(&self, requested: usize) -> usize {
        requested.max(1).min(self.rows.len())
    }

    pub fn preview(&self, requested: usize) -> &[Vec<CellValue>] {
        &self.rows[..self.preview_len(requested)]
    }
}

/// Turn header cells into column names. Blank cells become `Unnamed: <i>`.
fn header_names(cells: &[CellValue]) -> Vec<String> {
    let names = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell.to_string();
            if name.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            }
        })
        .collect();
    unique_column_names(names)
}

/// Disambiguate repeated names as `name.1`, `name.2`, ... skipping any
/// suffix that already exists elsewhere in the header.
pub fn unique_column_names(names: Vec<String>) -> Vec<String> {
    let originals: HashSet<String> = names.iter().cloned().collect();
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        if used.insert(name.clone()) {
            result.push(name);
            continue;
        }
        let mut n = 1usize;
        let candidate = loop {
            let candidate = format!("{}.{}", name, n);
            if !used.contains(&candidate) && !originals.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        used.insert(candidate.clone());
        result.push(candidate);
    }

    result
}
