// Format detection, header re-parse and xlsx export
//
// bytes + filename -> dispatch -> (encoding, text only) -> raw grid
//   -> operator picks a header row -> re-decode -> dataset -> xlsx

pub mod cell;
pub mod csv;
pub mod dispatch;
pub mod encoding;
pub mod error;
pub mod export;
pub mod grid;
pub mod pipeline;
pub mod session;
pub mod source;
pub mod xlsx;

pub use cell::CellValue;
pub use encoding::{detect, EncodingLabel};
pub use error::RepairError;
pub use export::{export, ExportArtifact, EXPORT_MIME_TYPE};
pub use grid::{Dataset, DecodedGrid};
pub use pipeline::{load_raw, resolve, EmptyFileDiagnostic, HeaderRow, RawLoad, DEFAULT_PREVIEW_BYTES};
pub use session::{RawLoadView, Session};
pub use source::{SourceFile, SourceFormat, SUPPORTED_EXTENSIONS};
