// Workbook byte import/export boundary.
//
// The synchronization core only ever needs bytes-in/bytes-out plus "lift
// one sheet out of a decoded document"; richer file formats plug in behind
// the same trait.

pub mod native;

use std::fmt;

use gridsync_engine::WorkbookDocument;

/// Native format version.
/// Increment when the schema changes in a way old versions can't read.
pub const NATIVE_FORMAT_VERSION: u32 = 1;

/// Errors from encoding or decoding workbook bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Input bytes are not a document this codec understands.
    Malformed(String),
    /// Version field is newer than this build can read.
    UnsupportedVersion(u32),
    /// The document embeds an asset class the codec cannot serialize.
    UnsupportedAsset { sheet: String, name: String },
    /// A requested sheet does not exist in the decoded document.
    MissingSheet(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(detail) => write!(f, "malformed workbook bytes: {detail}"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported native format version {v}"),
            Self::UnsupportedAsset { sheet, name } => {
                write!(f, "unsupported embedded asset '{name}' on sheet '{sheet}'")
            }
            Self::MissingSheet(name) => write!(f, "sheet '{name}' not found in source document"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Byte-level workbook codec.
pub trait WorkbookCodec {
    fn decode(&self, bytes: &[u8]) -> Result<WorkbookDocument, CodecError>;
    fn encode(&self, document: &WorkbookDocument) -> Result<Vec<u8>, CodecError>;
}
