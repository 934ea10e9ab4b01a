// xlsx export of a repaired dataset
//
// Produces bytes only. Writing them somewhere is the caller's business.

use std::borrow::Cow;

use rust_xlsxwriter::{Format, FormatBorder, Workbook, Worksheet};

use crate::cell::{CellValue, MAX_EXACT_INT};
use crate::error::RepairError;
use crate::grid::Dataset;

pub const EXPORT_EXTENSION: &str = "xlsx";
pub const EXPORT_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// xlsx sheet limits (header row included)
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Characters an xlsx cell can hold
pub const MAX_CELL_CHARS: usize = 32_767;

const DATE_TIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Exported workbook plus the name it should be offered under.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn mime_type(&self) -> &'static str {
        EXPORT_MIME_TYPE
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// `<stem>_repaired.xlsx`
pub fn repaired_file_name(stem: &str) -> String {
    format!("{}_repaired.{}", stem, EXPORT_EXTENSION)
}

/// Serialize `dataset` as a single-sheet workbook: bold header on row 1,
/// data from row 2, no index column.
pub fn export(dataset: &Dataset, stem: &str) -> Result<ExportArtifact, RepairError> {
    if dataset.row_count() + 1 > MAX_ROWS || dataset.column_count() > MAX_COLS {
        return Err(RepairError::Export(format!(
            "{} rows x {} columns exceeds the xlsx limit of {} rows x {} columns",
            dataset.row_count() + 1,
            dataset.column_count(),
            MAX_ROWS,
            MAX_COLS
        )));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let cells = write_dataset(dataset, worksheet)?;

    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| RepairError::Export(format!("failed to build XLSX file: {}", e)))?;

    log::info!(
        "exported {} rows, {} columns ({} cells, {} bytes)",
        dataset.row_count(),
        dataset.column_count(),
        cells,
        bytes.len()
    );

    Ok(ExportArtifact { file_name: repaired_file_name(stem), bytes })
}

/// Returns the number of cells written
fn write_dataset(dataset: &Dataset, worksheet: &mut Worksheet) -> Result<usize, RepairError> {
    let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);
    let date_format = Format::new().set_num_format(DATE_TIME_FORMAT);
    let mut cells = 0usize;

    for (col, name) in dataset.columns().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, fit_cell_text(name, 0, col), &header_format)
            .map_err(|e| cell_error(0, col, e))?;
        cells += 1;
    }

    for (row_idx, row) in dataset.rows().iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col16 = col as u16;
            let written = match cell {
                CellValue::Empty => continue,
                CellValue::Text(s) if s.is_empty() => continue,
                CellValue::Text(s) => worksheet
                    .write_string(row32, col16, fit_cell_text(s, row_idx + 1, col))
                    .map(|_| ()),
                CellValue::Int(n) if n.unsigned_abs() <= MAX_EXACT_INT => {
                    worksheet.write_number(row32, col16, *n as f64).map(|_| ())
                }
                // Stored as text so no digit is rounded away
                CellValue::Int(n) => worksheet.write_string(row32, col16, n.to_string()).map(|_| ()),
                CellValue::Float(n) if n.is_finite() => worksheet.write_number(row32, col16, *n).map(|_| ()),
                CellValue::Float(n) => worksheet.write_string(row32, col16, n.to_string()).map(|_| ()),
                CellValue::Bool(b) => worksheet.write_boolean(row32, col16, *b).map(|_| ()),
                CellValue::DateTime(serial) => worksheet
                    .write_number_with_format(row32, col16, *serial, &date_format)
                    .map(|_| ()),
            };
            written.map_err(|e| cell_error(row_idx + 1, col, e))?;
            cells += 1;
        }
    }

    Ok(cells)
}

/// Cut text to the xlsx cell limit; the rest of the export goes ahead.
fn fit_cell_text(s: &str, row: usize, col: usize) -> Cow<'_, str> {
    match s.char_indices().nth(MAX_CELL_CHARS) {
        None => Cow::Borrowed(s),
        Some((end, _)) => {
            log::warn!(
                "cell ({}, {}) truncated from {} to {} characters",
                row,
                col,
                s.chars().count(),
                MAX_CELL_CHARS
            );
            Cow::Borrowed(&s[..end])
        }
    }
}

fn cell_error(row: usize, col: usize, e: rust_xlsxwriter::XlsxError) -> RepairError {
    RepairError::Export(format!("failed to write cell ({}, {}): {}", row, col, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::read_xml_spreadsheet;
    use std::io::Cursor;

    #[test]
    fn test_repaired_file_name() {
        assert_eq!(repaired_file_name("sales 2024"), "sales 2024_repaired.xlsx");
    }

    #[test]
    fn test_export_writes_header_and_typed_cells() {
        let ds = Dataset::new(
            vec!["Name".into(), "Qty".into(), "Ok".into(), "When".into()],
            vec![
                vec![
                    CellValue::Text("pen".into()),
                    CellValue::Int(3),
                    CellValue::Bool(false),
                    CellValue::DateTime(45292.25),
                ],
                vec![CellValue::Text("ink".into()), CellValue::Float(0.5)],
            ],
        );
        let artifact = export(&ds, "stock").unwrap();
        assert_eq!(artifact.file_name, "stock_repaired.xlsx");
        assert_eq!(artifact.mime_type(), EXPORT_MIME_TYPE);
        // xlsx is a zip container
        assert_eq!(&artifact.bytes[..2], b"PK");

        let records = read_xml_spreadsheet(Cursor::new(&artifact.bytes)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0][0], CellValue::Text("Name".into()));
        assert_eq!(records[1][1], CellValue::Int(3));
        assert_eq!(records[1][2], CellValue::Bool(false));
        assert_eq!(records[1][3], CellValue::DateTime(45292.25));
        assert_eq!(records[2][1], CellValue::Float(0.5));
        assert_eq!(records[2][2], CellValue::Empty);
    }

    #[test]
    fn test_export_header_only() {
        let ds = Dataset::new(vec!["A".into(), "B".into()], vec![]);
        let artifact = export(&ds, "empty").unwrap();
        let records = read_xml_spreadsheet(Cursor::new(&artifact.bytes)).unwrap();
        assert_eq!(records, vec![vec![CellValue::Text("A".into()), CellValue::Text("B".into())]]);
    }

    #[test]
    fn test_export_non_finite_float_as_text() {
        let ds = Dataset::new(vec!["x".into()], vec![vec![CellValue::Float(f64::INFINITY)]]);
        let artifact = export(&ds, "inf").unwrap();
        let records = read_xml_spreadsheet(Cursor::new(&artifact.bytes)).unwrap();
        assert_eq!(records[1][0], CellValue::Text("inf".into()));
    }

    #[test]
    fn test_export_too_many_columns() {
        let columns: Vec<String> = (0..MAX_COLS + 1).map(|c| format!("c{}", c)).collect();
        let ds = Dataset::new(columns, vec![]);
        assert!(matches!(export(&ds, "wide"), Err(RepairError::Export(_))));
    }

    #[test]
    fn test_export_int_beyond_f64_precision_as_text() {
        let ds = Dataset::new(
            vec!["id".into()],
            vec![vec![CellValue::Int(12_345_678_901_234_567)], vec![CellValue::Int(-42)]],
        );
        let records = read_xml_spreadsheet(Cursor::new(&export(&ds, "ids").unwrap().bytes)).unwrap();
        assert_eq!(records[1][0], CellValue::Text("12345678901234567".into()));
        assert_eq!(records[2][0], CellValue::Int(-42));
    }

    #[test]
    fn test_export_truncates_oversized_text() {
        let long = "x".repeat(MAX_CELL_CHARS + 5000);
        let ds = Dataset::new(
            vec!["note".into(), "n".into()],
            vec![vec![CellValue::Text(long), CellValue::Int(1)]],
        );
        let records = read_xml_spreadsheet(Cursor::new(&export(&ds, "notes").unwrap().bytes)).unwrap();
        match &records[1][0] {
            CellValue::Text(s) => assert_eq!(s.chars().count(), MAX_CELL_CHARS),
            other => panic!("expected text, got {:?}", other),
        }
        assert_eq!(records[1][1], CellValue::Int(1));
    }

    #[test]
    fn test_fit_cell_text_respects_char_boundaries() {
        let s = "é".repeat(MAX_CELL_CHARS + 1);
        let fitted = fit_cell_text(&s, 1, 0);
        assert_eq!(fitted.chars().count(), MAX_CELL_CHARS);
        assert!(matches!(fit_cell_text("short", 1, 0), Cow::Borrowed("short")));
    }
}
