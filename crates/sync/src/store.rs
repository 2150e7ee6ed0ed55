//! Canonical workbook state for one session.
//!
//! Holds the decoded document, the original bytes it was loaded from (for
//! reset), and a cached wire projection so repeated full refreshes don't
//! re-convert an unchanged document.

use std::sync::Arc;

use gridsync_convert::WireConverter;
use gridsync_engine::WorkbookDocument;
use gridsync_io::{CodecError, WorkbookCodec};
use gridsync_protocol::WireWorkbook;

use crate::error::StoreError;
use crate::op::{EngineOp, Operation};

pub struct WorkbookStore {
    codec: Arc<dyn WorkbookCodec + Send + Sync>,
    original: Option<Vec<u8>>,
    document: Option<WorkbookDocument>,
    display_cache: Option<WireWorkbook>,
}

impl WorkbookStore {
    pub fn new(codec: Arc<dyn WorkbookCodec + Send + Sync>) -> Self {
        Self {
            codec,
            original: None,
            document: None,
            display_cache: None,
        }
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn codec(&self) -> &(dyn WorkbookCodec + Send + Sync) {
        self.codec.as_ref()
    }

    /// Load a workbook from encoded bytes, keeping the bytes as the
    /// reset baseline.
    pub fn load(&mut self, bytes: Vec<u8>) -> Result<(), StoreError> {
        let document = self.codec.decode(&bytes)?;
        self.original = Some(bytes);
        self.document = Some(document);
        self.display_cache = None;
        Ok(())
    }

    /// Discard all mutations and restore the document as originally loaded.
    pub fn reset_to_original(&mut self) -> Result<(), StoreError> {
        let bytes = self.original.as_ref().ok_or(StoreError::NoDocument)?;
        self.document = Some(self.codec.decode(bytes)?);
        self.display_cache = None;
        Ok(())
    }

    pub fn document(&self) -> Result<&WorkbookDocument, StoreError> {
        self.document.as_ref().ok_or(StoreError::NoDocument)
    }

    /// Mutable document access. Any caller is assumed to mutate, so the
    /// display cache is invalidated up front.
    pub fn document_mut(&mut self) -> Result<&mut WorkbookDocument, StoreError> {
        self.display_cache = None;
        self.document.as_mut().ok_or(StoreError::NoDocument)
    }

    /// Apply a batch best-effort: one failing operation is logged and
    /// skipped, the rest still land. Returns how many applied.
    pub fn apply(&mut self, operations: &[Operation]) -> Result<usize, StoreError> {
        if self.document.is_none() {
            return Err(StoreError::NoDocument);
        }
        let mut applied = 0;
        for op in operations {
            match self.apply_one(op) {
                Ok(()) => applied += 1,
                Err(e) => {
                    log::error!("operation {} ({}) failed: {}", op.id, op.description, e);
                }
            }
        }
        self.display_cache = None;
        Ok(applied)
    }

    fn apply_one(&mut self, op: &Operation) -> Result<(), StoreError> {
        let codec = Arc::clone(&self.codec);
        let doc = self.document.as_mut().ok_or(StoreError::NoDocument)?;
        match &op.engine {
            EngineOp::CreateSheet { name } => {
                if !doc.add_sheet(name) {
                    log::debug!("sheet '{}' already exists, create is a no-op", name);
                }
            }
            EngineOp::DeleteSheet { name } => {
                if !doc.delete_sheet(name) {
                    log::debug!("sheet '{}' already absent, delete is a no-op", name);
                }
            }
            EngineOp::SetCell { sheet, row, col, value, overwrite_formulas } => {
                let target = doc
                    .sheet_mut(sheet)
                    .ok_or_else(|| StoreError::MissingSheet(sheet.clone()))?;
                if !target.set_value_guarded(*row, *col, value.clone(), *overwrite_formulas) {
                    log::debug!(
                        "kept formula at {}!r{}c{}, write withheld",
                        sheet, row, col
                    );
                }
            }
            EngineOp::ImportTable { sheet, start_row, start_col, rows } => {
                // Writes in place; cells outside the block keep their
                // values and styles.
                let target = doc.sheet_mut_or_create(sheet);
                for (r, row_values) in rows.iter().enumerate() {
                    for (c, value) in row_values.iter().enumerate() {
                        target.set_value(
                            start_row + r as u32,
                            start_col + c as u32,
                            value.clone(),
                        );
                    }
                }
            }
            EngineOp::ReplaceSheet { source_bytes, source_sheet, new_name } => {
                let source = codec.decode(source_bytes)?;
                let sheet = source
                    .sheet(source_sheet)
                    .ok_or_else(|| CodecError::MissingSheet(source_sheet.clone()))?;
                doc.adopt_sheet(sheet, &source.styles, new_name);
            }
        }
        Ok(())
    }

    /// Encode the current document. Embedded assets the codec cannot carry
    /// are stripped on a retry rather than failing the save.
    pub fn save(&self) -> Result<Vec<u8>, StoreError> {
        let doc = self.document()?;
        match self.codec.encode(doc) {
            Ok(bytes) => Ok(bytes),
            Err(CodecError::UnsupportedAsset { sheet, name }) => {
                log::warn!(
                    "embedded asset '{}' on sheet '{}' cannot be saved, stripping assets and retrying",
                    name, sheet
                );
                let mut stripped = doc.clone();
                stripped.assets.clear();
                Ok(self.codec.encode(&stripped)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Full wire projection of the document, cached until the next
    /// mutation. The cache also pins the projection's workbook id across
    /// repeated refreshes.
    pub fn display_projection(&mut self, locale: &str) -> Result<WireWorkbook, StoreError> {
        if let Some(cached) = &self.display_cache {
            return Ok(cached.clone());
        }
        let doc = self.document.as_ref().ok_or(StoreError::NoDocument)?;
        let wire = WireConverter::new(doc).with_locale(locale).convert();
        self.display_cache = Some(wire.clone());
        Ok(wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsync_engine::{Asset, CellValue};
    use gridsync_io::native::NativeCodec;
    use gridsync_protocol::{UiOpKind, UiPayload};

    fn store_with_sample() -> WorkbookStore {
        let mut doc = WorkbookDocument::new();
        let sheet = doc.sheet_mut_or_create("Accueil");
        sheet.set_value(0, 0, CellValue::Text("Budget".into()));
        sheet.set_value(1, 0, CellValue::Formula("=A1".into()));
        let bytes = NativeCodec.encode(&doc).unwrap();

        let mut store = WorkbookStore::new(Arc::new(NativeCodec));
        store.load(bytes).unwrap();
        store
    }

    fn set_cell_op(sheet: &str, row: u32, col: u32, value: CellValue) -> Operation {
        Operation {
            id: format!("op-{row}-{col}"),
            engine: EngineOp::SetCell {
                sheet: sheet.to_string(),
                row,
                col,
                value: value.clone(),
                overwrite_formulas: true,
            },
            description: format!("Set cell r{row}c{col}"),
            ui_kind: UiOpKind::UpdateCell,
            ui_payload: UiPayload::SheetName { sheet: sheet.to_string() },
        }
    }

    #[test]
    fn reset_restores_loaded_state() {
        let mut store = store_with_sample();
        store
            .apply(&[set_cell_op("Accueil", 0, 0, CellValue::Number(99.0))])
            .unwrap();
        assert_eq!(
            store.document().unwrap().sheet("Accueil").unwrap().value(0, 0),
            CellValue::Number(99.0)
        );

        store.reset_to_original().unwrap();
        assert_eq!(
            store.document().unwrap().sheet("Accueil").unwrap().value(0, 0),
            CellValue::Text("Budget".into())
        );
    }

    #[test]
    fn apply_is_best_effort() {
        let mut store = store_with_sample();
        let bad = Operation {
            id: "bad".into(),
            engine: EngineOp::ReplaceSheet {
                source_bytes: Arc::new(b"garbage".to_vec()),
                source_sheet: "X".into(),
                new_name: "X".into(),
            },
            description: "Replace sheet 'X'".into(),
            ui_kind: UiOpKind::ReplaceSheet,
            ui_payload: UiPayload::SheetName { sheet: "X".into() },
        };
        let good = set_cell_op("Accueil", 5, 0, CellValue::Number(1.0));

        let applied = store.apply(&[bad, good]).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(
            store.document().unwrap().sheet("Accueil").unwrap().value(5, 0),
            CellValue::Number(1.0)
        );
    }

    #[test]
    fn import_table_writes_in_place() {
        let mut store = store_with_sample();
        let import = Operation {
            id: "import".into(),
            engine: EngineOp::ImportTable {
                sheet: "Accueil".into(),
                start_row: 5,
                start_col: 0,
                rows: vec![vec![CellValue::Number(1.0), CellValue::Number(2.0)]],
            },
            description: "Import a table into 'Accueil'".into(),
            ui_kind: UiOpKind::ReplaceSheet,
            ui_payload: UiPayload::SheetName { sheet: "Accueil".into() },
        };
        assert_eq!(store.apply(&[import]).unwrap(), 1);

        let sheet = store.document().unwrap().sheet("Accueil").unwrap();
        assert_eq!(sheet.value(5, 0), CellValue::Number(1.0));
        assert_eq!(sheet.value(5, 1), CellValue::Number(2.0));
        // Cells outside the imported block keep their content.
        assert_eq!(sheet.value(0, 0), CellValue::Text("Budget".into()));
        assert_eq!(sheet.value(1, 0), CellValue::Formula("=A1".into()));
    }

    #[test]
    fn set_cell_on_missing_sheet_is_skipped() {
        let mut store = store_with_sample();
        let op = set_cell_op("Fantome", 0, 0, CellValue::Number(1.0));
        assert_eq!(store.apply(&[op]).unwrap(), 0);
        // The missing sheet is not conjured into existence.
        assert!(!store.document().unwrap().has_sheet("Fantome"));
    }

    #[test]
    fn save_strips_assets_and_retries() {
        let mut store = store_with_sample();
        store.document_mut().unwrap().assets.push(Asset {
            sheet: "Accueil".into(),
            name: "logo.png".into(),
            bytes: vec![1, 2, 3],
        });

        let bytes = store.save().unwrap();
        let reloaded = NativeCodec.decode(&bytes).unwrap();
        assert!(reloaded.assets.is_empty());
        // The in-memory document keeps its assets.
        assert_eq!(store.document().unwrap().assets.len(), 1);
    }

    #[test]
    fn display_projection_is_cached_until_mutation() {
        let mut store = store_with_sample();
        let first = store.display_projection("FR_FR").unwrap();
        let second = store.display_projection("FR_FR").unwrap();
        // Workbook ids are random per conversion; equality proves the cache.
        assert_eq!(first.id, second.id);

        store
            .apply(&[set_cell_op("Accueil", 2, 0, CellValue::Number(7.0))])
            .unwrap();
        let third = store.display_projection("FR_FR").unwrap();
        assert_ne!(first.id, third.id);
        assert!(third.sheets["Accueil"].cell_data[&2].contains_key(&0));
    }

    #[test]
    fn no_document_is_an_error() {
        let mut store = WorkbookStore::new(Arc::new(NativeCodec));
        assert_eq!(store.document().unwrap_err(), StoreError::NoDocument);
        assert_eq!(store.save().unwrap_err(), StoreError::NoDocument);
        assert_eq!(
            store.reset_to_original().unwrap_err(),
            StoreError::NoDocument
        );
        assert!(store.apply(&[]).is_err());
    }
}
