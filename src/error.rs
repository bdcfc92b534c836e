//! Error types for conll-coref.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for conll-coref operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for conll-coref operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A token annotation line did not have the expected shape.
    #[error("line {line}: malformed record: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Coreference bracket notation did not balance.
    #[error("line {line}: unbalanced bracket: {detail}")]
    UnbalancedBracket { line: usize, detail: String },

    /// A configured corpus root directory does not exist.
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Predicted coreference results were committed to a record twice.
    #[error("coreference results already written")]
    ResultsAlreadyWritten,

    /// A prediction sequence did not line up with the enumerated pairs.
    #[error("{expected} pairs enumerated but {got} predictions supplied")]
    PredictionLengthMismatch { expected: usize, got: usize },

    /// Any error, annotated with the file it occurred in.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a malformed-record error at a 1-based line number.
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Create an unbalanced-bracket error for a close marker with no open.
    pub fn unbalanced_close(line: usize, entity: u64) -> Self {
        Error::UnbalancedBracket {
            line,
            detail: format!("close marker for entity {entity} has no matching open"),
        }
    }

    /// Create an unbalanced-bracket error for spans still open at sentence end.
    pub fn unclosed_spans(line: usize, count: usize) -> Self {
        Error::UnbalancedBracket {
            line,
            detail: format!("{count} span(s) still open at sentence end"),
        }
    }

    /// Annotate an error with the path of the file being processed.
    pub fn in_file(path: impl AsRef<Path>, source: Error) -> Self {
        Error::File {
            path: path.as_ref().to_path_buf(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_line() {
        let err = Error::malformed(42, "expected at least 12 fields, got 3");
        assert_eq!(
            err.to_string(),
            "line 42: malformed record: expected at least 12 fields, got 3"
        );
    }

    #[test]
    fn test_file_context_wraps_source() {
        let err = Error::in_file("train/a.auto_conll", Error::unbalanced_close(7, 3));
        let msg = err.to_string();
        assert!(msg.starts_with("train/a.auto_conll:"));
    }
}
