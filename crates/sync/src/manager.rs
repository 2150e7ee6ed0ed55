//! Commit orchestration.
//!
//! Decides how a transaction reaches the document and the UI:
//! validated commits park as pending proposals until the user decides,
//! direct commits are announced immediately and applied on a background
//! thread. Interactive cell edits from the UI are trusted and applied
//! in place.

use std::sync::Arc;
use std::thread;

use gridsync_config::Settings;
use gridsync_convert::wire_to_cell_value;
use gridsync_protocol::{
    CellUpdatePayload, Notice, OperationList, ServerMessage, UiOperation,
};

use crate::compiler::UpdateCompiler;
use crate::connection::ConnectionManager;
use crate::error::StoreError;
use crate::op::Operation;
use crate::session::Session;

pub struct SyncManager {
    settings: Settings,
    connections: Arc<ConnectionManager>,
    compiler: UpdateCompiler,
}

fn notice(content: String, error: bool) -> ServerMessage {
    ServerMessage::ChatMessage(Notice {
        role: "assistant".to_string(),
        content,
        timestamp: chrono::Utc::now().to_rfc3339(),
        error,
    })
}

impl SyncManager {
    pub fn new(settings: Settings, connections: Arc<ConnectionManager>) -> Self {
        let compiler = UpdateCompiler::new(settings.compiler_threshold);
        Self { settings, connections, compiler }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Load a workbook into the session and push the full projection.
    pub fn load_workbook(&self, session: &Arc<Session>, bytes: Vec<u8>) -> Result<(), StoreError> {
        session.await_mutation();
        session
            .store
            .lock()
            .expect("store poisoned")
            .load(bytes)?;
        self.push_full_refresh(session)?;
        self.connections
            .send_to(&session.client_id, notice("Workbook loaded.".to_string(), false));
        Ok(())
    }

    /// Discard every mutation since load, dropping pending proposals too.
    pub fn reset_workbook(&self, session: &Arc<Session>) -> Result<(), StoreError> {
        session.await_mutation();
        {
            let mut store = session.store.lock().expect("store poisoned");
            store.reset_to_original()?;
        }
        let mut pending = session.pending.lock().expect("pending poisoned");
        if !pending.is_empty() {
            log::warn!("dropping {} pending proposal(s) on reset", pending.len());
            pending.clear();
        }
        drop(pending);

        self.push_full_refresh(session)?;
        self.connections.send_to(
            &session.client_id,
            notice("Workbook restored to its original state.".to_string(), false),
        );
        Ok(())
    }

    /// Commit a transaction.
    ///
    /// With `validate` the operations become pending proposals and the UI
    /// is asked to accept or refuse each one; nothing touches the document
    /// until [`resolve_validation`](Self::resolve_validation). Without it
    /// the UI is told to mirror the operations right away and the document
    /// is mutated on a background thread.
    pub fn commit(
        &self,
        session: &Arc<Session>,
        operations: Vec<Operation>,
        validate: bool,
    ) -> Result<(), StoreError> {
        // An empty transaction must not disturb pending proposals or
        // announce anything.
        if operations.is_empty() {
            return Ok(());
        }

        session.await_mutation();

        let operations = {
            let store = session.store.lock().expect("store poisoned");
            if !self.settings.use_compiler {
                store.document()?; // still require a loaded workbook
                operations
            } else {
                let document = store.document()?;
                self.compiler.compile(document, store.codec(), operations)
            }
        };

        let ui_operations: Vec<UiOperation> =
            operations.iter().map(Operation::ui_operation).collect();

        if validate {
            let mut pending = session.pending.lock().expect("pending poisoned");
            if !pending.is_empty() {
                log::warn!(
                    "new proposal supersedes {} undecided operation(s)",
                    pending.len()
                );
                pending.clear();
            }
            for op in operations {
                pending.insert(op.id.clone(), op);
            }
            drop(pending);

            self.connections.send_to(
                &session.client_id,
                ServerMessage::ProposeUpdates(OperationList { operations: ui_operations }),
            );
            return Ok(());
        }

        self.connections.send_to(
            &session.client_id,
            ServerMessage::ApplyDirectUpdates(OperationList { operations: ui_operations }),
        );

        let total = operations.len();
        let worker_session = Arc::clone(session);
        let connections = Arc::clone(&self.connections);
        let handle = thread::spawn(move || {
            let applied = worker_session
                .store
                .lock()
                .expect("store poisoned")
                .apply(&operations);
            match applied {
                Ok(applied) if applied == total => {
                    connections.send_to(
                        &worker_session.client_id,
                        notice(format!("Applied {total} update(s) to the workbook."), false),
                    );
                }
                Ok(applied) => {
                    connections.send_to(
                        &worker_session.client_id,
                        notice(
                            format!("Some updates could not be applied ({applied}/{total})."),
                            true,
                        ),
                    );
                }
                Err(e) => {
                    connections.send_to(
                        &worker_session.client_id,
                        notice(format!("Updates failed: {e}"), true),
                    );
                }
            }
        });
        session.set_mutation(handle);
        Ok(())
    }

    /// Act on the user's accept/refuse decision for pending proposals.
    ///
    /// Accepted operations are applied in the order the decision lists
    /// them. Everything else pending (refused or undecided) is dropped:
    /// a decision always empties the proposal queue.
    pub fn resolve_validation(
        &self,
        session: &Arc<Session>,
        accepted: &[String],
        refused: &[String],
    ) -> Result<(), StoreError> {
        session.await_mutation();

        let to_apply: Vec<Operation> = {
            let mut pending = session.pending.lock().expect("pending poisoned");
            let mut to_apply = Vec::new();
            for id in accepted {
                match pending.remove(id) {
                    Some(op) => to_apply.push(op),
                    None => log::warn!("accepted operation {id} is not pending"),
                }
            }
            for id in refused {
                if pending.remove(id).is_none() {
                    log::warn!("refused operation {id} is not pending");
                }
            }
            if !pending.is_empty() {
                log::warn!("clearing {} undecided proposal(s)", pending.len());
                pending.clear();
            }
            to_apply
        };

        let accepted_count = to_apply.len();
        let ui_operations: Vec<UiOperation> =
            to_apply.iter().map(Operation::ui_operation).collect();

        let applied = session
            .store
            .lock()
            .expect("store poisoned")
            .apply(&to_apply)?;

        if !ui_operations.is_empty() {
            self.connections.send_to(
                &session.client_id,
                ServerMessage::ApplyDirectUpdates(OperationList { operations: ui_operations }),
            );
        }
        self.connections.send_to(
            &session.client_id,
            notice(
                format!(
                    "Applied {applied} accepted change(s); {} refused.",
                    refused.len()
                ),
                applied < accepted_count,
            ),
        );
        Ok(())
    }

    /// Apply a trusted interactive edit from the UI. Writes never replace
    /// existing formulas; edits to unknown sheets are logged and ignored.
    pub fn handle_cell_update(
        &self,
        session: &Arc<Session>,
        payload: &CellUpdatePayload,
    ) -> Result<(), StoreError> {
        if self.settings.block_direct_edits {
            self.connections.send_to(
                &session.client_id,
                notice("Direct edits are disabled for this session.".to_string(), true),
            );
            return Ok(());
        }

        session.await_mutation();
        let mut store = session.store.lock().expect("store poisoned");
        let document = store.document_mut()?;
        let sheet = match document.sheet_mut(&payload.sheet) {
            Some(sheet) => sheet,
            None => {
                log::warn!("cell update for unknown sheet '{}'", payload.sheet);
                return Ok(());
            }
        };

        for (&row, columns) in &payload.value {
            for (&col, cell) in columns {
                let value = wire_to_cell_value(cell);
                if !sheet.set_value_guarded(row, col, value, false) {
                    log::debug!(
                        "kept formula at {}!r{}c{}, interactive edit withheld",
                        payload.sheet, row, col
                    );
                }
            }
        }
        Ok(())
    }

    /// Push the full workbook projection to the session's client.
    pub fn push_full_refresh(&self, session: &Arc<Session>) -> Result<(), StoreError> {
        session.await_mutation();
        let projection = session
            .store
            .lock()
            .expect("store poisoned")
            .display_projection(&self.settings.locale)?;
        self.connections.send_to(
            &session.client_id,
            ServerMessage::WorkbookUpdate(projection),
        );
        Ok(())
    }
}
