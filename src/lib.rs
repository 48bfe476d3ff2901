// Mini ArangoDB Client
// Asynchronous client for the ArangoDB REST API with server-side async jobs

// Common modules
pub mod common {
    pub mod config;
    pub mod document;
    pub mod error;
    pub mod utils;
}

pub mod api;
pub mod client;
pub mod connection;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types for convenience
pub use api::{
    ApiExecutor, Aql, AsyncExecutor, AsyncJob, Collection, Cursor, Database, DefaultExecutor,
    ExecutionContext, FireAndForgetExecutor, Foxx, JobStatus, TransactionExecutor,
};
pub use client::ArangoClient;
pub use common::config::{AuthMethod, ClientConfig};
pub use common::document::{DocumentId, DocumentKey, DocumentMetadata};
pub use common::error::{ArangoError, ErrorCode, ErrorKind, Result, ServerError};
pub use connection::{Auth, Connection, HttpClient};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; only the first call installs anything.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
