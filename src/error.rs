use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorizerError>;

/// Errors raised by the vectorization pipeline.
///
/// Only `RowDecode` is recoverable: the scanner collects it and keeps going.
/// Everything else aborts the run.
#[derive(Debug, Error)]
pub enum VectorizerError {
    /// input source missing or unreadable
    #[error("cannot read input {path}: {source}")]
    InputIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// a single row could not be decoded
    #[error("row {row}: {reason}")]
    RowDecode { row: u64, reason: String },
    /// output table cannot be written
    #[error("cannot write output {path}: {source}")]
    OutputIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// vocabulary file cannot be written or read back
    #[error("cannot persist vocabulary {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// more surviving tokens than dimension ids
    #[error("{size} tokens survive trimming, dimension ids stop at {}", u32::MAX)]
    VocabularyTooLarge { size: usize },
}

impl VectorizerError {
    pub fn input_io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::InputIo { path: path.into(), source }
    }

    pub fn output_io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::OutputIo { path: path.into(), source }
    }

    /// Split a csv error into the fatal input kind or a row level decode error.
    pub(crate) fn from_input_csv<P: Into<PathBuf>>(path: P, err: csv::Error) -> Self {
        let row = err.position().map(|pos| pos.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(source) => Self::input_io(path, source),
            other => Self::RowDecode {
                row,
                reason: describe_csv_kind(&other),
            },
        }
    }

    pub(crate) fn from_output_csv<P: Into<PathBuf>>(path: P, err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => Self::output_io(path, source),
            other => Self::output_io(
                path,
                io::Error::new(io::ErrorKind::Other, describe_csv_kind(&other)),
            ),
        }
    }

    /// true for errors that must terminate the run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RowDecode { .. })
    }
}

fn describe_csv_kind(kind: &csv::ErrorKind) -> String {
    match kind {
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid utf-8: {err}"),
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
            format!("expected {expected_len} fields, found {len}")
        }
        other => format!("{other:?}"),
    }
}

/// A row that was skipped during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 0-based data row index (header excluded)
    pub index: usize,
    /// line number in the source when known
    pub line: u64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_decode_is_the_only_recoverable_kind() {
        let row = VectorizerError::RowDecode { row: 3, reason: "bad".into() };
        assert!(!row.is_fatal());
        let io = VectorizerError::input_io("in.csv", io::Error::from(io::ErrorKind::NotFound));
        assert!(io.is_fatal());
        assert!(VectorizerError::InvalidConfig("workers".into()).is_fatal());
        assert!(VectorizerError::VocabularyTooLarge { size: 1 << 33 }.is_fatal());
    }

    #[test]
    fn messages_name_the_path() {
        let err = VectorizerError::output_io("out.csv", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(err.to_string().contains("out.csv"));
    }
}
