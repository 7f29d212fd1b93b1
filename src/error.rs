//! Error kinds returned by the cache facade.
//!
//! All failure modes are explicit return values; the cache never panics on a
//! caller-reachable precondition violation (only the sweeper's internal
//! consistency checks log-and-continue, see `expirer.rs`).

use thiserror::Error;

/// Error kinds for the public cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Referenced pod, node or PDB is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// `AssumePod` for a UID already present in the pod state table.
    #[error("pod already exists: {0}")]
    AlreadyExists(String),

    /// `AddPod` for a pod already in state `bound`.
    #[error("pod already bound: {0}")]
    AlreadyBound(String),

    /// `FinishBinding` or `ForgetPod` on a pod not in state `assumed`.
    #[error("pod not assumed: {0}")]
    NotAssumed(String),

    /// `UpdatePod`/`RemovePod` on a pod not in state `bound`.
    #[error("pod not bound: {0}")]
    NotBound(String),

    /// `ForgetPod` where the caller's `nodeName` disagrees with the recorded state.
    #[error("nodename mismatch for pod {uid}: recorded {recorded}, got {got}")]
    NodenameMismatch {
        uid: String,
        recorded: String,
        got: String,
    },
}

pub type Result<T> = std::result::Result<T, CacheError>;
