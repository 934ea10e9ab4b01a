// Uploaded file model and extension dispatch table

use std::io::Cursor;
use std::path::Path;

use crate::error::RepairError;

/// Extensions accepted at the input boundary.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls", "xlsm", "xlsb", "odf", "ods", "odt"];

/// Decode strategy selected from a file extension.
///
/// The variants are mutually exclusive: each extension maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text (`csv`). Needs a detected encoding.
    Csv,
    /// Legacy BIFF workbook (`xls`).
    Xls,
    /// Binary workbook (`xlsb`).
    Xlsb,
    /// Zip/XML containers (`xlsx`, `xlsm`, `odf`, `ods`, `odt`), sniffed by content.
    XmlSpreadsheet,
}

impl SourceFormat {
    pub fn from_extension(extension: &str) -> Result<Self, RepairError> {
        match extension {
            "csv" => Ok(SourceFormat::Csv),
            "xls" => Ok(SourceFormat::Xls),
            "xlsb" => Ok(SourceFormat::Xlsb),
            "xlsx" | "xlsm" | "odf" | "ods" | "odt" => Ok(SourceFormat::XmlSpreadsheet),
            other => Err(RepairError::UnsupportedFormat { extension: other.to_string() }),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, SourceFormat::Csv)
    }

    /// Short name used in messages
    pub fn label(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Xls => "XLS",
            SourceFormat::Xlsb => "XLSB",
            SourceFormat::XmlSpreadsheet => "spreadsheet",
        }
    }
}

/// One uploaded file: the declared name plus its bytes.
///
/// Never mutated after construction. Every decode gets its own cursor via
/// [`SourceFile::cursor`], so a second decode always starts from byte 0.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn cursor(&self) -> Cursor<&[u8]> {
        Cursor::new(self.bytes.as_slice())
    }

    /// Lower-cased suffix without the dot ("" when there is none)
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    /// File name without its suffix
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string()
    }

    pub fn format(&self) -> Result<SourceFormat, RepairError> {
        SourceFormat::from_extension(&self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_every_supported_extension_dispatches() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(SourceFormat::from_extension(ext).is_ok(), "{} should be supported", ext);
        }
        assert_eq!(SourceFormat::from_extension("xls").unwrap(), SourceFormat::Xls);
        assert_eq!(SourceFormat::from_extension("xlsb").unwrap(), SourceFormat::Xlsb);
        assert_eq!(SourceFormat::from_extension("ods").unwrap(), SourceFormat::XmlSpreadsheet);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = SourceFormat::from_extension("pdf").unwrap_err();
        assert_eq!(err, RepairError::UnsupportedFormat { extension: "pdf".to_string() });
    }

    #[test]
    fn test_extension_and_stem() {
        let src = SourceFile::new("Quarterly Report.v2.XLSX", Vec::new());
        assert_eq!(src.extension(), "xlsx");
        assert_eq!(src.stem(), "Quarterly Report.v2");
        assert_eq!(src.format().unwrap(), SourceFormat::XmlSpreadsheet);

        let src = SourceFile::new("README", Vec::new());
        assert_eq!(src.extension(), "");
        assert!(src.format().is_err());
    }

    #[test]
    fn test_cursors_are_independent() {
        let src = SourceFile::new("a.csv", b"abc".to_vec());
        let mut first = src.cursor();
        let mut buf = String::new();
        first.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "abc");

        // A fresh cursor starts at the beginning again
        let mut again = String::new();
        src.cursor().read_to_string(&mut again).unwrap();
        assert_eq!(again, "abc");
    }
}
