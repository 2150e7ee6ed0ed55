use std::fmt;

use gridsync_io::CodecError;

/// Error type for workbook store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No workbook has been loaded into this session yet.
    NoDocument,
    /// A named sheet does not exist.
    MissingSheet(String),
    /// Encoding or decoding workbook bytes failed.
    Codec(CodecError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NoDocument => write!(f, "no workbook loaded"),
            StoreError::MissingSheet(name) => write!(f, "sheet '{name}' not found"),
            StoreError::Codec(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<CodecError> for StoreError {
    fn from(e: CodecError) -> Self {
        StoreError::Codec(e)
    }
}
