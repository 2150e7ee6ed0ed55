//! Per-client session state.
//!
//! A session ties a client id to its workbook store, its pending
//! (proposed, undecided) operations, and at most one in-flight background
//! mutation. Entry points join the outstanding mutation before touching
//! the store, so background application never races a new request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use gridsync_io::WorkbookCodec;

use crate::op::Operation;
use crate::store::WorkbookStore;

pub struct Session {
    pub client_id: String,
    pub store: Mutex<WorkbookStore>,
    pub pending: Mutex<HashMap<String, Operation>>,
    mutation: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(client_id: String, codec: Arc<dyn WorkbookCodec + Send + Sync>) -> Self {
        Self {
            client_id,
            store: Mutex::new(WorkbookStore::new(codec)),
            pending: Mutex::new(HashMap::new()),
            mutation: Mutex::new(None),
        }
    }

    /// Park a background mutation handle. Callers must have joined the
    /// previous one (via [`await_mutation`](Self::await_mutation)) first.
    pub fn set_mutation(&self, handle: JoinHandle<()>) {
        let mut slot = self.mutation.lock().expect("mutation slot poisoned");
        if let Some(previous) = slot.take() {
            log::warn!("replacing unjoined mutation for client {}", self.client_id);
            if previous.join().is_err() {
                log::error!("background mutation panicked for client {}", self.client_id);
            }
        }
        *slot = Some(handle);
    }

    /// Block until the in-flight background mutation (if any) finishes.
    pub fn await_mutation(&self) {
        let handle = self.mutation.lock().expect("mutation slot poisoned").take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("background mutation panicked for client {}", self.client_id);
            }
        }
    }
}

/// All live sessions, keyed by client id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a fresh client id.
    pub fn create(&self, codec: Arc<dyn WorkbookCodec + Send + Sync>) -> Arc<Session> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(client_id.clone(), codec));
        self.sessions
            .lock()
            .expect("session registry poisoned")
            .insert(client_id, Arc::clone(&session));
        session
    }

    pub fn lookup(&self, client_id: &str) -> Option<Arc<Session>> {
        self.sessions
            .lock()
            .expect("session registry poisoned")
            .get(client_id)
            .cloned()
    }

    /// Drop a session, joining its outstanding mutation first.
    pub fn destroy(&self, client_id: &str) {
        let removed = self
            .sessions
            .lock()
            .expect("session registry poisoned")
            .remove(client_id);
        if let Some(session) = removed {
            session.await_mutation();
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
