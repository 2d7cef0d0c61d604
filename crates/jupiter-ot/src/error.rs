use thiserror::Error;

/// Errors surfaced by the synchronization core.
///
/// All three kinds propagate synchronously to the caller and are never
/// auto-corrected: the only sanctioned recovery is an external
/// resync-then-`reset` flow. A consumer seeing any of these must mark the
/// affected document/client inconsistent and trigger resync or disconnect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Internal queue/timestamp bookkeeping became inconsistent, or an
    /// operation could not be applied to the replica it was transformed for.
    #[error("transformation failed: {0}")]
    Transformation(String),

    /// A received timestamp is impossible given local history, e.g. the peer
    /// acknowledges an operation this site never generated.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// An activity referenced a client with no proxy in the hub.
    #[error("unknown client: {0}")]
    UnknownClient(String),
}
