// Spreadsheet decoding (xls, xlsb, xlsx/xlsm, ods)
//
// Only the first worksheet is read. Values come through as calamine cached
// them; formulas are not re-evaluated.

use std::io::{Read, Seek};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Xls, Xlsb};

use crate::cell::CellValue;
use crate::error::RepairError;
use crate::source::SourceFormat;

/// Maximum dimensions read from a sheet
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Read the first worksheet of a legacy `.xls` workbook.
pub fn read_xls<RS: Read + Seek>(reader: RS) -> Result<Vec<Vec<CellValue>>, RepairError> {
    let workbook: Xls<_> = Xls::new(reader)
        .map_err(|e| RepairError::decode(SourceFormat::Xls, e.to_string()))?;
    first_sheet_records(workbook, SourceFormat::Xls)
}

/// Read the first worksheet of a binary `.xlsb` workbook.
pub fn read_xlsb<RS: Read + Seek>(reader: RS) -> Result<Vec<Vec<CellValue>>, RepairError> {
    let workbook: Xlsb<_> = Xlsb::new(reader)
        .map_err(|e| RepairError::decode(SourceFormat::Xlsb, e.to_string()))?;
    first_sheet_records(workbook, SourceFormat::Xlsb)
}

/// Read the first worksheet of a zip/XML container. The concrete reader
/// (xlsx or ods) is picked from the content, not the extension.
pub fn read_xml_spreadsheet<RS: Read + Seek + Clone>(reader: RS) -> Result<Vec<Vec<CellValue>>, RepairError> {
    let workbook = open_workbook_auto_from_rs(reader)
        .map_err(|e| RepairError::decode(SourceFormat::XmlSpreadsheet, e.to_string()))?;
    first_sheet_records(workbook, SourceFormat::XmlSpreadsheet)
}

fn first_sheet_records<RS, R>(mut workbook: R, format: SourceFormat) -> Result<Vec<Vec<CellValue>>, RepairError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_names = workbook.sheet_names();
    let Some(first) = sheet_names.first() else {
        return Err(RepairError::decode(format, "workbook contains no sheets"));
    };
    if sheet_names.len() > 1 {
        log::info!("reading sheet '{}', ignoring {} other sheet(s)", first, sheet_names.len() - 1);
    }

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RepairError::decode(format, "workbook contains no sheets"))?
        .map_err(|e| RepairError::decode(format, format!("failed to read sheet '{}': {}", first, e)))?;

    Ok(range_to_records(&range))
}

/// Lay the used range out from A1 so row numbers match what a spreadsheet
/// application shows. Leading rows/columns outside the used range are empty.
fn range_to_records(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return Vec::new();
    }

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let start_row = start_row as usize;
    let start_col = start_col as usize;

    let total_rows = (start_row + height).min(MAX_ROWS);
    let total_cols = (start_col + width).min(MAX_COLS);
    if start_row + height > MAX_ROWS || start_col + width > MAX_COLS {
        log::warn!(
            "sheet truncated from {}x{} to {}x{}",
            start_row + height,
            start_col + width,
            total_rows,
            total_cols
        );
    }

    let mut records = vec![vec![CellValue::Empty; total_cols]; total_rows];
    for (row_idx, row) in range.rows().enumerate() {
        let target_row = start_row + row_idx;
        if target_row >= total_rows {
            break;
        }
        for (col_idx, cell) in row.iter().enumerate() {
            let target_col = start_col + col_idx;
            if target_col >= total_cols {
                break;
            }
            records[target_row][target_col] = convert_cell(cell);
        }
    }

    records
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            if s.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Float(n) => CellValue::from_number(*n),
        Data::Int(n) => CellValue::Int(*n),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Text(e.to_string()),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        // ISO strings (ods) are kept verbatim
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
