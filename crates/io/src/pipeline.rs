// Raw load and header resolution

use serde::Serialize;

use crate::dispatch;
use crate::encoding::{self, EncodingLabel};
use crate::error::RepairError;
use crate::grid::{Dataset, DecodedGrid};
use crate::source::SourceFile;

/// Bytes shown when a file has no tabular content
pub const DEFAULT_PREVIEW_BYTES: usize = 500;

/// Outcome of the headerless load.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLoad {
    /// Structure found. `encoding` must be reused for the header-aware reload.
    Grid { grid: DecodedGrid, encoding: EncodingLabel },
    /// Zero rows or zero columns. Terminal: no header choice, no export.
    Empty(EmptyFileDiagnostic),
}

/// Raw-byte preview offered instead of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmptyFileDiagnostic {
    /// Leading bytes as UTF-8, invalid sequences and a leading BOM dropped
    pub preview: String,
    /// Size of the whole upload
    pub total_bytes: usize,
}

impl EmptyFileDiagnostic {
    pub fn new(source: &SourceFile, preview_bytes: usize) -> Self {
        let head = &source.bytes()[..source.len().min(preview_bytes)];
        let preview = String::from_utf8_lossy(head).replace('\u{FFFD}', "");
        let preview = preview.strip_prefix('\u{FEFF}').unwrap_or(&preview).to_string();
        Self { preview, total_bytes: source.len() }
    }
}

/// Load `source` headerless to discover its shape.
///
/// Text formats get their encoding detected here, once, over the whole payload.
pub fn load_raw(source: &SourceFile, preview_bytes: usize) -> Result<RawLoad, RepairError> {
    let format = source.format()?;
    let encoding = if format.is_text() {
        encoding::detect(source.bytes())
    } else {
        EncodingLabel::DEFAULT
    };

    let grid = dispatch::decode_headerless(source, encoding)?;
    if grid.is_empty() {
        log::info!("'{}' has no rows or columns", source.name());
        return Ok(RawLoad::Empty(EmptyFileDiagnostic::new(source, preview_bytes)));
    }

    log::info!(
        "raw load of '{}': {} rows x {} columns",
        source.name(),
        grid.row_count(),
        grid.column_count()
    );
    Ok(RawLoad::Grid { grid, encoding })
}

/// A 1-based header row known to lie within a grid's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRow(usize);

impl HeaderRow {
    pub fn new(one_based: usize, row_count: usize) -> Result<Self, RepairError> {
        if one_based == 0 || one_based > row_count {
            return Err(RepairError::HeaderRowOutOfRange { requested: one_based, row_count });
        }
        Ok(HeaderRow(one_based))
    }

    pub fn within(one_based: usize, grid: &DecodedGrid) -> Result<Self, RepairError> {
        Self::new(one_based, grid.row_count())
    }

    pub fn one_based(&self) -> usize {
        self.0
    }

    pub fn zero_based(&self) -> usize {
        self.0 - 1
    }
}

/// Re-decode `source` with `header_row` (1-based) as the header.
///
/// `grid` is the raw grid the operator chose from; the row is re-validated
/// against it. `encoding` is the one `load_raw` detected. The bytes are
/// decoded again from scratch rather than reusing `grid`.
pub fn resolve(
    source: &SourceFile,
    grid: &DecodedGrid,
    header_row: usize,
    encoding: EncodingLabel,
) -> Result<Dataset, RepairError> {
    let header = HeaderRow::within(header_row, grid)?;
    let dataset = dispatch::decode_with_header(source, header.zero_based(), encoding)?;
    log::info!(
        "header row {} of '{}': {} columns, {} data rows",
        header.one_based(),
        source.name(),
        dataset.column_count(),
        dataset.row_count()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    fn grid_of(load: RawLoad) -> (DecodedGrid, EncodingLabel) {
        match load {
            RawLoad::Grid { grid, encoding } => (grid, encoding),
            RawLoad::Empty(d) => panic!("unexpected empty file: {:?}", d),
        }
    }

    #[test]
    fn test_zero_byte_file_is_empty_diagnostic() {
        let src = SourceFile::new("blank.csv", Vec::new());
        let load = load_raw(&src, DEFAULT_PREVIEW_BYTES).unwrap();
        assert_eq!(load, RawLoad::Empty(EmptyFileDiagnostic { preview: String::new(), total_bytes: 0 }));
    }

    #[test]
    fn test_blank_lines_only_is_empty_diagnostic() {
        let src = SourceFile::new("blank.csv", b"\n\n\r\n".to_vec());
        assert!(matches!(load_raw(&src, DEFAULT_PREVIEW_BYTES).unwrap(), RawLoad::Empty(_)));
    }

    #[test]
    fn test_diagnostic_preview_truncates_and_drops_invalid_bytes() {
        let mut bytes = vec![0xFF, 0xFE, b'o', b'k'];
        bytes.extend(std::iter::repeat(b'x').take(600));
        let src = SourceFile::new("junk.csv", bytes);
        let diag = EmptyFileDiagnostic::new(&src, 10);
        assert_eq!(diag.preview, "okxxxxxx");
        assert_eq!(diag.total_bytes, 604);
    }

    #[test]
    fn test_diagnostic_preview_drops_leading_bom() {
        let src = SourceFile::new("bom.csv", b"\xEF\xBB\xBF".to_vec());
        let load = load_raw(&src, DEFAULT_PREVIEW_BYTES).unwrap();
        assert_eq!(load, RawLoad::Empty(EmptyFileDiagnostic { preview: String::new(), total_bytes: 3 }));

        let src = SourceFile::new("bom.csv", b"\xEF\xBB\xBF\n\n".to_vec());
        assert_eq!(EmptyFileDiagnostic::new(&src, 10).preview, "\n\n");
    }

    #[test]
    fn test_header_row_bounds() {
        assert!(HeaderRow::new(1, 3).is_ok());
        assert!(HeaderRow::new(3, 3).is_ok());
        assert_eq!(
            HeaderRow::new(4, 3).unwrap_err(),
            RepairError::HeaderRowOutOfRange { requested: 4, row_count: 3 }
        );
        assert!(HeaderRow::new(0, 3).is_err());
        assert_eq!(HeaderRow::new(2, 3).unwrap().zero_based(), 1);
    }

    #[test]
    fn test_resolve_first_and_last_row() {
        let src = SourceFile::new("t.csv", b"A,B\n1,2\n3,4\n".to_vec());
        let (grid, encoding) = grid_of(load_raw(&src, DEFAULT_PREVIEW_BYTES).unwrap());

        let first = resolve(&src, &grid, 1, encoding).unwrap();
        assert_eq!(first.columns(), &["A", "B"]);
        assert_eq!(first.row_count(), 2);

        let last = resolve(&src, &grid, 3, encoding).unwrap();
        assert_eq!(last.columns(), &["3", "4"]);
        assert_eq!(last.row_count(), 0);

        assert_eq!(
            resolve(&src, &grid, 4, encoding).unwrap_err(),
            RepairError::HeaderRowOutOfRange { requested: 4, row_count: 3 }
        );
    }

    #[test]
    fn test_resolve_reuses_detected_encoding() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1252
            .encode("Liste des adhérents\nNom;Ville\nRenée;Besançon\nAndré;Orléans\nHélène;Nîmes\n");
        let src = SourceFile::new("membres.csv", bytes.into_owned());
        let (grid, encoding) = grid_of(load_raw(&src, DEFAULT_PREVIEW_BYTES).unwrap());
        assert_ne!(encoding, EncodingLabel::DEFAULT);

        let ds = resolve(&src, &grid, 2, encoding).unwrap();
        assert_eq!(ds.columns(), &["Nom", "Ville"]);
        assert_eq!(ds.rows()[0][1], CellValue::Text("Besançon".into()));
    }
}
