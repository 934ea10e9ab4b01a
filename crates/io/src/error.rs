// Typed failures surfaced by the repair pipeline

use crate::source::SourceFormat;

#[derive(Debug, Clone, PartialEq)]
pub enum RepairError {
    /// Extension is not one of the supported input formats.
    UnsupportedFormat { extension: String },
    /// The decoder rejected the byte content (corrupt file, extension/content mismatch).
    Decode { format: SourceFormat, cause: String },
    /// Operator-supplied header row (1-based) is outside the raw grid.
    HeaderRowOutOfRange { requested: usize, row_count: usize },
    /// The xlsx writer refused the dataset.
    Export(String),
    /// A session call arrived in a state that cannot accept it.
    InvalidTransition { state: &'static str, action: &'static str },
}

impl RepairError {
    pub(crate) fn decode(format: SourceFormat, cause: impl Into<String>) -> Self {
        RepairError::Decode { format, cause: cause.into() }
    }
}

impl std::fmt::Display for RepairError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepairError::UnsupportedFormat { extension } => {
                if extension.is_empty() {
                    write!(f, "Unsupported file format: file has no extension")
                } else {
                    write!(f, "Unsupported file format: .{}", extension)
                }
            }
            RepairError::Decode { format, cause } => {
                write!(f, "Error reading {} file: {}", format.label(), cause)
            }
            RepairError::HeaderRowOutOfRange { requested, row_count } => write!(
                f,
                "Header row {} is out of range (file has {} row{})",
                requested,
                row_count,
                if *row_count == 1 { "" } else { "s" }
            ),
            RepairError::Export(msg) => write!(f, "Export failed: {}", msg),
            RepairError::InvalidTransition { state, action } => {
                write!(f, "Cannot {} while session is {}", action, state)
            }
        }
    }
}

impl std::error::Error for RepairError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RepairError::UnsupportedFormat { extension: "pdf".to_string() };
        assert_eq!(err.to_string(), "Unsupported file format: .pdf");

        let err = RepairError::UnsupportedFormat { extension: String::new() };
        assert!(err.to_string().contains("no extension"));

        let err = RepairError::HeaderRowOutOfRange { requested: 4, row_count: 1 };
        assert_eq!(err.to_string(), "Header row 4 is out of range (file has 1 row)");

        let err = RepairError::decode(SourceFormat::Xls, "not a CFB file");
        assert_eq!(err.to_string(), "Error reading XLS file: not a CFB file");
    }
}
