//! Session synchronization core.
//!
//! One client session owns one canonical in-memory workbook. Mutations
//! arrive either as direct interactive edits or as operation transactions
//! built with [`UpdateBuilder`]; [`SyncManager`] decides whether a
//! transaction is applied immediately or proposed for review, and keeps
//! the remote UI fed through [`ConnectionManager`].

pub mod builder;
pub mod compiler;
pub mod connection;
pub mod error;
pub mod manager;
pub mod op;
pub mod session;
pub mod store;

pub use builder::UpdateBuilder;
pub use compiler::UpdateCompiler;
pub use connection::ConnectionManager;
pub use error::StoreError;
pub use manager::SyncManager;
pub use op::{EngineOp, Operation};
pub use session::{Session, SessionRegistry};
pub use store::WorkbookStore;
