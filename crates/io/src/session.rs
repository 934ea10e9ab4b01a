// Per-operator pipeline state
//
// NoFile -> (load) -> EmptyFile                      (terminal)
//                  -> AwaitingHeaderChoice -> (choose_header) -> DatasetReady
//                                             -> (export) -> Exported
// DatasetReady / Exported -> (choose_header) -> DatasetReady
// DatasetReady / Exported -> (reset) -> NoFile

use crate::encoding::EncodingLabel;
use crate::error::RepairError;
use crate::export::{self, ExportArtifact};
use crate::grid::{Dataset, DecodedGrid};
use crate::pipeline::{self, EmptyFileDiagnostic, HeaderRow, RawLoad, DEFAULT_PREVIEW_BYTES};
use crate::source::SourceFile;

#[derive(Debug, Clone, Default)]
enum Stage {
    #[default]
    NoFile,
    EmptyFile(EmptyFileDiagnostic),
    AwaitingHeaderChoice,
    DatasetReady { header: HeaderRow, dataset: Dataset },
    Exported { header: HeaderRow, dataset: Dataset, artifact: ExportArtifact },
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::NoFile => "waiting for a file",
            Stage::EmptyFile(_) => "showing an empty-file diagnostic",
            Stage::AwaitingHeaderChoice => "waiting for a header row",
            Stage::DatasetReady { .. } => "holding a dataset",
            Stage::Exported { .. } => "exported",
        }
    }
}

/// Current file plus what has been derived from it.
#[derive(Debug, Clone, Default)]
struct Loaded {
    source: Option<SourceFile>,
    grid: Option<DecodedGrid>,
    encoding: EncodingLabel,
}

/// One operator's pass through the pipeline. Owns its file, grid and
/// encoding; independent sessions share nothing.
#[derive(Debug, Clone)]
pub struct Session {
    stage: Stage,
    loaded: Loaded,
    preview_bytes: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_preview_bytes(DEFAULT_PREVIEW_BYTES)
    }

    /// `preview_bytes` bounds the empty-file diagnostic.
    pub fn with_preview_bytes(preview_bytes: usize) -> Self {
        Self { stage: Stage::NoFile, loaded: Loaded::default(), preview_bytes }
    }

    /// Human-readable name of the current state
    pub fn state(&self) -> &'static str {
        self.stage.name()
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.loaded.source.as_ref()
    }

    pub fn grid(&self) -> Option<&DecodedGrid> {
        self.loaded.grid.as_ref()
    }

    /// Encoding detected for the current file (UTF-8 for spreadsheets)
    pub fn encoding(&self) -> Option<EncodingLabel> {
        self.loaded.source.as_ref().map(|_| self.loaded.encoding)
    }

    pub fn empty_diagnostic(&self) -> Option<&EmptyFileDiagnostic> {
        match &self.stage {
            Stage::EmptyFile(diag) => Some(diag),
            _ => None,
        }
    }

    pub fn header_row(&self) -> Option<HeaderRow> {
        match &self.stage {
            Stage::DatasetReady { header, .. } | Stage::Exported { header, .. } => Some(*header),
            _ => None,
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match &self.stage {
            Stage::DatasetReady { dataset, .. } | Stage::Exported { dataset, .. } => Some(dataset),
            _ => None,
        }
    }

    pub fn artifact(&self) -> Option<&ExportArtifact> {
        match &self.stage {
            Stage::Exported { artifact, .. } => Some(artifact),
            _ => None,
        }
    }

    /// Take ownership of an upload and load it headerless.
    ///
    /// On failure the session stays in `NoFile` so another file can be offered.
    pub fn load(&mut self, source: SourceFile) -> Result<RawLoadView<'_>, RepairError> {
        self.require(matches!(self.stage, Stage::NoFile), "load a file")?;

        match pipeline::load_raw(&source, self.preview_bytes)? {
            RawLoad::Empty(diag) => {
                self.loaded = Loaded { source: Some(source), grid: None, encoding: EncodingLabel::DEFAULT };
                self.stage = Stage::EmptyFile(diag);
            }
            RawLoad::Grid { grid, encoding } => {
                self.loaded = Loaded { source: Some(source), grid: Some(grid), encoding };
                self.stage = Stage::AwaitingHeaderChoice;
            }
        }
        log::debug!("session: {}", self.state());

        match (&self.stage, &self.loaded.grid) {
            (Stage::EmptyFile(diag), _) => Ok(RawLoadView::Empty(diag)),
            (_, Some(grid)) => Ok(RawLoadView::Grid(grid)),
            _ => Err(self.invalid("load a file")),
        }
    }

    /// Resolve the dataset with `header_row` (1-based) as the header.
    pub fn choose_header(&mut self, header_row: usize) -> Result<&Dataset, RepairError> {
        self.require(
            matches!(
                self.stage,
                Stage::AwaitingHeaderChoice | Stage::DatasetReady { .. } | Stage::Exported { .. }
            ),
            "choose a header row",
        )?;

        let (Some(source), Some(grid)) = (&self.loaded.source, &self.loaded.grid) else {
            return Err(self.invalid("choose a header row"));
        };
        let header = HeaderRow::within(header_row, grid)?;
        let dataset = pipeline::resolve(source, grid, header.one_based(), self.loaded.encoding)?;

        self.stage = Stage::DatasetReady { header, dataset };
        log::debug!("session: {}", self.state());
        self.dataset().ok_or_else(|| self.invalid("choose a header row"))
    }

    /// Export the current dataset. Repeating it re-exports.
    pub fn export(&mut self) -> Result<&ExportArtifact, RepairError> {
        let stem = self.loaded.source.as_ref().map(SourceFile::stem).unwrap_or_default();
        let (header, dataset) = match std::mem::take(&mut self.stage) {
            Stage::DatasetReady { header, dataset } | Stage::Exported { header, dataset, .. } => {
                (header, dataset)
            }
            other => {
                let err = RepairError::InvalidTransition { state: other.name(), action: "export" };
                self.stage = other;
                return Err(err);
            }
        };

        match export::export(&dataset, &stem) {
            Ok(artifact) => {
                self.stage = Stage::Exported { header, dataset, artifact };
                log::debug!("session: {}", self.state());
                self.artifact().ok_or_else(|| self.invalid("export"))
            }
            Err(e) => {
                self.stage = Stage::DatasetReady { header, dataset };
                Err(e)
            }
        }
    }

    /// Discard the current file and start over.
    pub fn reset(&mut self) -> Result<(), RepairError> {
        self.require(
            matches!(self.stage, Stage::DatasetReady { .. } | Stage::Exported { .. }),
            "start over",
        )?;
        self.stage = Stage::NoFile;
        self.loaded = Loaded::default();
        log::debug!("session: {}", self.state());
        Ok(())
    }

    fn require(&self, allowed: bool, action: &'static str) -> Result<(), RepairError> {
        if allowed {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> RepairError {
        RepairError::InvalidTransition { state: self.stage.name(), action }
    }
}

/// Borrowed view of what `Session::load` found.
#[derive(Debug)]
pub enum RawLoadView<'a> {
    Grid(&'a DecodedGrid),
    Empty(&'a EmptyFileDiagnostic),
}
