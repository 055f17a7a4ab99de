use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid {encoding} text", .path.display())]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("row at line {line} has {found} fields, but the header has {expected}")]
    RowWidth {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{0}")]
    Config(String),

    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Failed to read image {}: {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to get access token: {0}")]
    Auth(String),

    #[error("Failed to upload image: {0}")]
    Upload(String),

    #[error("Failed to add record: {0}")]
    Insert(String),

    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to write failed items: {0}")]
    Report(#[source] csv::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
