//! Transaction consolidation.
//!
//! A transaction carrying many cell edits to one sheet costs the UI one
//! message per edit. Above a per-sheet threshold it is cheaper to replay
//! the edits against a scratch copy of the document and ship the whole
//! resulting sheet once. Operations on sheets below the threshold pass
//! through untouched.

use std::collections::HashMap;
use std::sync::Arc;

use gridsync_convert::WireConverter;
use gridsync_engine::WorkbookDocument;
use gridsync_io::WorkbookCodec;
use gridsync_protocol::{UiOpKind, UiPayload};

use crate::error::StoreError;
use crate::op::{EngineOp, Operation};

pub struct UpdateCompiler {
    threshold: usize,
}

impl UpdateCompiler {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Consolidate hot sheets. Compilation is an optimization only: any
    /// failure logs and returns the transaction unchanged.
    pub fn compile(
        &self,
        document: &WorkbookDocument,
        codec: &(dyn WorkbookCodec + Send + Sync),
        operations: Vec<Operation>,
    ) -> Vec<Operation> {
        let hot = self.hot_sheets(&operations);
        if hot.is_empty() {
            return operations;
        }
        match self.compile_inner(document, codec, &operations, &hot) {
            Ok(compiled) => {
                log::info!(
                    "compiled {} operations into {} ({} sheet replacement(s))",
                    operations.len(),
                    compiled.len(),
                    hot.len()
                );
                compiled
            }
            Err(e) => {
                log::error!("compilation failed, passing operations through: {e}");
                operations
            }
        }
    }

    /// Sheets whose cell-edit count strictly exceeds the threshold, in
    /// first-appearance order.
    fn hot_sheets(&self, operations: &[Operation]) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for op in operations {
            if let EngineOp::SetCell { sheet, .. } = &op.engine {
                let count = counts.entry(sheet.as_str()).or_insert(0);
                if *count == 0 {
                    order.push(sheet.as_str());
                }
                *count += 1;
            }
        }
        order
            .into_iter()
            .filter(|sheet| counts[sheet] > self.threshold)
            .map(str::to_string)
            .collect()
    }

    fn compile_inner(
        &self,
        document: &WorkbookDocument,
        codec: &(dyn WorkbookCodec + Send + Sync),
        operations: &[Operation],
        hot: &[String],
    ) -> Result<Vec<Operation>, StoreError> {
        // Replay hot-sheet edits against a scratch copy of the document so
        // the replacement carries pre-existing content, not just the edits.
        let mut scratch = document.clone();
        let mut passthrough = Vec::new();

        for op in operations {
            match &op.engine {
                EngineOp::SetCell { sheet, row, col, value, overwrite_formulas }
                    if hot.iter().any(|h| h == sheet) =>
                {
                    let target = scratch.sheet_mut_or_create(sheet);
                    if !target.set_value_guarded(*row, *col, value.clone(), *overwrite_formulas)
                    {
                        log::debug!("kept formula at {}!r{}c{} during compilation", sheet, row, col);
                    }
                }
                _ => {
                    if hot.iter().any(|h| h == op.target_sheet()) {
                        // Structural ops on a hot sheet can't be folded into
                        // the replacement; keep them, in their slot.
                        log::warn!(
                            "operation {} targets compiled sheet '{}', passing through",
                            op.id,
                            op.target_sheet()
                        );
                    }
                    passthrough.push(op.clone());
                }
            }
        }

        // Encode the scratch document once; every replacement references it.
        let scratch_bytes = Arc::new(codec.encode(&scratch)?);

        let mut compiled = passthrough;
        for sheet_name in hot {
            let sheet = scratch
                .sheet(sheet_name)
                .ok_or_else(|| StoreError::MissingSheet(sheet_name.clone()))?;
            let payload = WireConverter::sheet_payload(&scratch, sheet);
            compiled.push(Operation {
                id: format!("compiled-op-{sheet_name}"),
                engine: EngineOp::ReplaceSheet {
                    source_bytes: Arc::clone(&scratch_bytes),
                    source_sheet: sheet_name.clone(),
                    new_name: sheet_name.clone(),
                },
                description: format!("Replace sheet '{sheet_name}' (consolidated cell updates)"),
                ui_kind: UiOpKind::ReplaceSheet,
                ui_payload: UiPayload::Sheet(Box::new(payload)),
            });
        }
        Ok(compiled)
    }
}
