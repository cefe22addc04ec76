//! Party Code Server
//!
//! Issues short party codes that map to a peer id so two peers can find each
//! other before opening a direct connection.
//!
//! # Protocol
//!
//! 1. Host registers its peer id and receives a code (e.g. `AB3DEF`)
//! 2. Host shares the code out of band
//! 3. Guest looks the code up and receives the host's peer id
//! 4. Peers connect directly; the code expires after two hours

pub mod messages;
pub mod registry;
pub mod server;
pub mod storage;

pub use messages::{CreateRequest, CreateResponse, ErrorResponse, HealthResponse, LookupResponse};
pub use registry::{Registry, RegistryError};
pub use server::{router, serve, ApiError, AppState};
pub use storage::{CodeStore, MemoryStore, SqliteStore, StorageError};
