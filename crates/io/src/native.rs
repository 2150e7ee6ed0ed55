//! Native workbook byte format: a versioned JSON envelope around the
//! document model. Used by tests and as the default runtime codec; real
//! spreadsheet file formats implement `WorkbookCodec` elsewhere.

use gridsync_engine::WorkbookDocument;
use serde::{Deserialize, Serialize};

use crate::{CodecError, WorkbookCodec, NATIVE_FORMAT_VERSION};

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    document: WorkbookDocument,
}

/// Serde-based codec for the native format.
///
/// Encoding refuses documents with embedded assets (images): the envelope
/// has no representation for them, and the store's save path relies on
/// that failure to trigger its strip-and-retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl WorkbookCodec for NativeCodec {
    fn decode(&self, bytes: &[u8]) -> Result<WorkbookDocument, CodecError> {
        let envelope: Envelope = serde_json::from_slice(bytes)
            .map_err(|e| CodecError::Malformed(e.to_string()))?;
        if envelope.version > NATIVE_FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(envelope.version));
        }
        Ok(envelope.document)
    }

    fn encode(&self, document: &WorkbookDocument) -> Result<Vec<u8>, CodecError> {
        if let Some(asset) = document.assets.first() {
            return Err(CodecError::UnsupportedAsset {
                sheet: asset.sheet.clone(),
                name: asset.name.clone(),
            });
        }
        let envelope = Envelope { version: NATIVE_FORMAT_VERSION, document: document.clone() };
        serde_json::to_vec(&envelope).map_err(|e| CodecError::Malformed(e.to_string()))
    }
}
