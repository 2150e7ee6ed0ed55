//! Fluent transaction builder.
//!
//! Collects operations with both their engine mutation and their frozen UI
//! projection, so a transaction can be proposed, reviewed and applied
//! without re-deriving payloads. Consuming-self chaining:
//!
//! ```
//! use gridsync_engine::CellValue;
//! use gridsync_sync::UpdateBuilder;
//!
//! let ops = UpdateBuilder::new()
//!     .create_sheet("Prévisions")
//!     .update_cell_value("Prévisions", 0, 0, CellValue::Number(2025.0))
//!     .into_operations();
//! assert_eq!(ops.len(), 2);
//! ```

use std::sync::Arc;

use gridsync_convert::{cell_value_to_wire, WireConverter};
use gridsync_engine::{CellValue, WorkbookDocument};
use gridsync_io::{CodecError, WorkbookCodec};
use gridsync_protocol::{UiOpKind, UiPayload};

use crate::error::StoreError;
use crate::op::{EngineOp, Operation};

#[derive(Debug, Default)]
pub struct UpdateBuilder {
    operations: Vec<Operation>,
}

fn next_id() -> String {
    format!("op-{}", uuid::Uuid::new_v4())
}

impl UpdateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn create_sheet(mut self, name: &str) -> Self {
        self.operations.push(Operation {
            id: next_id(),
            engine: EngineOp::CreateSheet { name: name.to_string() },
            description: format!("Create sheet '{name}'"),
            ui_kind: UiOpKind::CreateSheet,
            ui_payload: UiPayload::SheetName { sheet: name.to_string() },
        });
        self
    }

    pub fn delete_sheet(mut self, name: &str) -> Self {
        self.operations.push(Operation {
            id: next_id(),
            engine: EngineOp::DeleteSheet { name: name.to_string() },
            description: format!("Delete sheet '{name}'"),
            ui_kind: UiOpKind::DeleteSheet,
            ui_payload: UiPayload::SheetName { sheet: name.to_string() },
        });
        self
    }

    /// Single-cell update. Formulas already in the target cell are
    /// preserved; use [`update_cell_value_forced`](Self::update_cell_value_forced)
    /// to overwrite them.
    pub fn update_cell_value(self, sheet: &str, row: u32, col: u32, value: CellValue) -> Self {
        self.push_cell(sheet, row, col, value, false)
    }

    /// Single-cell update that replaces formulas too.
    pub fn update_cell_value_forced(
        self,
        sheet: &str,
        row: u32,
        col: u32,
        value: CellValue,
    ) -> Self {
        self.push_cell(sheet, row, col, value, true)
    }

    fn push_cell(
        mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: CellValue,
        overwrite_formulas: bool,
    ) -> Self {
        let wire = cell_value_to_wire(&value);
        self.operations.push(Operation {
            id: next_id(),
            engine: EngineOp::SetCell {
                sheet: sheet.to_string(),
                row,
                col,
                value,
                overwrite_formulas,
            },
            description: format!("Update cell r{row}c{col} on '{sheet}'"),
            ui_kind: UiOpKind::UpdateCell,
            ui_payload: UiPayload::CellEdit {
                sheet: sheet.to_string(),
                row,
                col,
                value: wire,
            },
        });
        self
    }

    /// Replace a sheet with a rectangular table of values. The table write
    /// itself lands in place; replacement comes from an explicit delete
    /// emitted first. Surfaces to the UI as the delete plus one sheet
    /// replacement carrying the full resulting sheet.
    pub fn import_table(
        self,
        sheet: &str,
        start_row: u32,
        start_col: u32,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        let mut this = self.delete_sheet(sheet);
        // Stage the resulting sheet once so the UI payload matches what
        // applying the operation will produce.
        let mut scratch = WorkbookDocument::new();
        let staged = scratch.sheet_mut_or_create(sheet);
        for (r, row_values) in rows.iter().enumerate() {
            for (c, value) in row_values.iter().enumerate() {
                staged.set_value(start_row + r as u32, start_col + c as u32, value.clone());
            }
        }
        let payload = WireConverter::sheet_payload(
            &scratch,
            scratch.sheet(sheet).expect("staged sheet exists"),
        );

        this.operations.push(Operation {
            id: next_id(),
            engine: EngineOp::ImportTable {
                sheet: sheet.to_string(),
                start_row,
                start_col,
                rows,
            },
            description: format!("Replace sheet '{sheet}' with an imported table"),
            ui_kind: UiOpKind::ReplaceSheet,
            ui_payload: UiPayload::Sheet(Box::new(payload)),
        });
        this
    }

    /// Copy one sheet out of an encoded source workbook, styles included.
    /// Fails up front when the bytes don't decode or the sheet is missing,
    /// so a bad source never reaches the pending queue.
    pub fn replace_sheet_from(
        mut self,
        codec: &(dyn WorkbookCodec + Send + Sync),
        source_bytes: Vec<u8>,
        source_sheet: &str,
        new_name: &str,
    ) -> Result<Self, StoreError> {
        let source = codec.decode(&source_bytes)?;
        let sheet = source
            .sheet(source_sheet)
            .ok_or_else(|| CodecError::MissingSheet(source_sheet.to_string()))?;

        let mut scratch = WorkbookDocument::new();
        scratch.adopt_sheet(sheet, &source.styles, new_name);
        let payload = WireConverter::sheet_payload(
            &scratch,
            scratch.sheet(new_name).expect("adopted sheet exists"),
        );

        self.operations.push(Operation {
            id: next_id(),
            engine: EngineOp::ReplaceSheet {
                source_bytes: Arc::new(source_bytes),
                source_sheet: source_sheet.to_string(),
                new_name: new_name.to_string(),
            },
            description: format!("Replace sheet '{new_name}' from source '{source_sheet}'"),
            ui_kind: UiOpKind::ReplaceSheet,
            ui_payload: UiPayload::Sheet(Box::new(payload)),
        });
        Ok(self)
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}
