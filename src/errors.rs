//! Error hierarchy for the key schema and endpoint synchronization pipeline.
//!
//! Errors are split by where they originate: the key-value store collaborator
//! ([`StoreError`]) or the synchronization layer built on top of it
//! ([`SyncError`]).

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failures reported by the key-value store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Failures of the snapshot, watch or label merge pipeline
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Settings loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring the caller to tear down the session
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Key or directory does not exist. `index` is the store index at the time of the read.
    #[error("Key not found: {path} (index {index})")]
    NotFound { path: String, index: u64 },

    #[error("Key already exists: {path}")]
    NodeExists { path: String },

    /// Value operation attempted on a directory
    #[error("Not a file: {path}")]
    NotAFile { path: String },

    /// Compare-and-swap precondition failed
    #[error("Compare failed on {path}: expected index {expected}, found {actual}")]
    CompareFailed {
        path: String,
        expected: u64,
        actual: u64,
    },

    /// Requested resume index is older than the retained event history
    #[error("Event index {requested} is outdated and cleared (oldest retained: {oldest})")]
    IndexCleared { requested: u64, oldest: u64 },

    #[error("Store transport failure: {0}")]
    Transport(String),

    #[error("Store watcher closed")]
    WatcherClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A path matched the endpoint schema but its value failed to deserialize
    #[error("Malformed record at {path}: {source}")]
    MalformedRecord {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A single change event resolved to more than one workload
    #[error("Event at index {index} for {path} resolved to {} workloads: {workloads:?}", .workloads.len())]
    SchemaViolation {
        path: String,
        index: u64,
        workloads: Vec<String>,
    },

    /// Label merge lost every compare-and-swap race
    #[error("Write conflict on {path} after {attempts} attempts")]
    WriteConflict { path: String, attempts: usize },

    /// Stored document cannot carry a labels field
    #[error("Invalid document at {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// Expected "no data yet" outcome of a read
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Store(StoreError::NotFound { .. }))
    }

    /// Whether the error ends the current watch session.
    ///
    /// The caller has to restart from its last applied index (or re-snapshot
    /// after [`StoreError::IndexCleared`]).
    pub fn is_terminal(&self) -> bool {
        match self {
            Error::Store(StoreError::Transport(_))
            | Error::Store(StoreError::IndexCleared { .. })
            | Error::Store(StoreError::WatcherClosed) => true,
            Error::Sync(SyncError::SchemaViolation { .. }) => true,
            Error::Fatal(_) => true,
            _ => false,
        }
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
