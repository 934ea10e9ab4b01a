// Format dispatch: one entry point per decode mode, one strategy per format

use crate::cell::CellValue;
use crate::encoding::EncodingLabel;
use crate::error::RepairError;
use crate::grid::{Dataset, DecodedGrid};
use crate::source::{SourceFile, SourceFormat};
use crate::{csv, xlsx};

/// Decode every record of `source` with the strategy its extension selects.
///
/// `encoding` is only consulted for delimited text.
pub fn read_records(source: &SourceFile, encoding: EncodingLabel) -> Result<Vec<Vec<CellValue>>, RepairError> {
    let format = source.format()?;
    log::debug!("decoding '{}' as {} ({} bytes)", source.name(), format.label(), source.len());

    match format {
        SourceFormat::Csv => Ok(csv::read_records(source.bytes(), encoding)),
        SourceFormat::Xls => xlsx::read_xls(source.cursor()),
        SourceFormat::Xlsb => xlsx::read_xlsb(source.cursor()),
        SourceFormat::XmlSpreadsheet => xlsx::read_xml_spreadsheet(source.cursor()),
    }
}

/// Headerless decode: every row is data, columns are positional.
pub fn decode_headerless(source: &SourceFile, encoding: EncodingLabel) -> Result<DecodedGrid, RepairError> {
    let records = read_records(source, encoding)?;
    Ok(DecodedGrid::from_records(records))
}

/// Decode using the 0-based record `header` as column names.
pub fn decode_with_header(
    source: &SourceFile,
    header: usize,
    encoding: EncodingLabel,
) -> Result<Dataset, RepairError> {
    let records = read_records(source, encoding)?;
    Dataset::from_records(records, header)
}
