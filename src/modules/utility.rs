use csv::{ReaderBuilder, Trim, Writer};
use encoding_rs::{Encoding, SHIFT_JIS};
use log::debug;
use std::{fs, fs::File, io, path::Path};

use super::error::{ParseError, SyncError};

// read a file exported by a japanese windows tool
// a byte order mark wins, otherwise the bytes are cp932 (shift_jis)
pub fn read_legacy_text(path: &Path) -> Result<String, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let (encoding, bom_length) = Encoding::for_bom(&bytes).unwrap_or((SHIFT_JIS, 0));
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_length..])
        .map(|text| text.trim_start_matches('\u{feff}').to_owned())
        .ok_or_else(|| ParseError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        })
}

// parse csv text, return header and content (in two different vecs)
// cells are trimmed and blank lines are skipped
// the reader is flexible so that a whitespace-only line reaches the blank
// check, row width is checked here instead
pub fn parse_csv(text: &str) -> Result<(Vec<String>, Vec<Vec<String>>), ParseError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header_vec: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.to_owned())
        .collect();

    let mut rows_vec: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let row = record?;
        let line = row.position().map(|position| position.line()).unwrap_or_default();
        if row.iter().all(|column| column.is_empty()) {
            debug!("Skipping empty row at line {}", line);
            continue;
        }
        if row.len() != header_vec.len() {
            return Err(ParseError::RowWidth {
                line,
                found: row.len(),
                expected: header_vec.len(),
            });
        }
        rows_vec.push(row.iter().map(|column| column.to_owned()).collect());
    }

    Ok((header_vec, rows_vec))
}

// collects rows that could not be synced, so they can be fixed and re-run
// columns are always quoted
pub struct FailedItemsWriter<W: io::Write = File> {
    writer: Writer<W>,
}

impl FailedItemsWriter<File> {
    pub fn create(path: &Path, header: &[&str]) -> Result<FailedItemsWriter<File>, SyncError> {
        let file = File::create(path).map_err(|e| SyncError::Report(e.into()))?;
        FailedItemsWriter::from_writer(file, header)
    }
}

impl<W: io::Write> FailedItemsWriter<W> {
    pub fn from_writer(wtr: W, header: &[&str]) -> Result<FailedItemsWriter<W>, SyncError> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(wtr);
        writer.write_record(header).map_err(SyncError::Report)?;
        writer.flush().map_err(|e| SyncError::Report(e.into()))?;
        Ok(FailedItemsWriter { writer })
    }

    pub fn save_row(&mut self, row: &[&str]) -> Result<(), SyncError> {
        self.writer.write_record(row).map_err(SyncError::Report)?;
        // flush per row so a killed run still leaves a usable file
        self.writer.flush().map_err(|e| SyncError::Report(e.into()))
    }
}
