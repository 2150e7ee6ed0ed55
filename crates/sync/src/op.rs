//! Engine-side operations and their UI projection.
//!
//! Every operation carries two faces: the [`EngineOp`] that mutates the
//! canonical document, and the pre-built UI payload the remote grid needs
//! to mirror the change. Both are fixed at build time so that proposing,
//! deciding and applying all describe the same change.

use std::sync::Arc;

use gridsync_engine::CellValue;
use gridsync_protocol::{UiOpKind, UiOperation, UiPayload};

/// The document mutation behind one operation.
#[derive(Debug, Clone)]
pub enum EngineOp {
    CreateSheet {
        name: String,
    },
    DeleteSheet {
        name: String,
    },
    SetCell {
        sheet: String,
        row: u32,
        col: u32,
        value: CellValue,
        /// When false, an existing formula in the target cell wins.
        overwrite_formulas: bool,
    },
    /// Bulk write of a rectangular table into a (fresh) sheet.
    ImportTable {
        sheet: String,
        start_row: u32,
        start_col: u32,
        rows: Vec<Vec<CellValue>>,
    },
    /// High-fidelity copy of one sheet out of an encoded source workbook.
    /// Bytes are shared: compiled transactions reference one encoded
    /// scratch workbook from several operations.
    ReplaceSheet {
        source_bytes: Arc<Vec<u8>>,
        source_sheet: String,
        new_name: String,
    },
}

/// One unit of a transaction: engine mutation plus frozen UI projection.
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: String,
    pub engine: EngineOp,
    pub description: String,
    pub ui_kind: UiOpKind,
    pub ui_payload: UiPayload,
}

impl Operation {
    /// The operation as the UI sees it (proposals and apply records).
    pub fn ui_operation(&self) -> UiOperation {
        UiOperation {
            id: self.id.clone(),
            kind: self.ui_kind,
            description: self.description.clone(),
            payload: self.ui_payload.clone(),
        }
    }

    /// Sheet this operation touches, for compiler grouping.
    pub fn target_sheet(&self) -> &str {
        match &self.engine {
            EngineOp::CreateSheet { name } | EngineOp::DeleteSheet { name } => name,
            EngineOp::SetCell { sheet, .. } | EngineOp::ImportTable { sheet, .. } => sheet,
            EngineOp::ReplaceSheet { new_name, .. } => new_name,
        }
    }
}
