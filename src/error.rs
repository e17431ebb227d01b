use std::path::PathBuf;

/// Errors from the file-backed stores and their import paths
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid email address: {0:?}")]
    InvalidAddress(String),

    #[error("{} is corrupt: {reason}", .path.display())]
    CorruptStore { path: PathBuf, reason: String },

    #[error("invalid port {0} (expected 1-65535)")]
    InvalidPort(u32),

    #[error("malformed SMTP profile: {0}")]
    MalformedProfile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors that prevent a send run from starting
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("no recipients to send to")]
    EmptyRecipientList,

    #[error("SMTP settings incomplete: missing {0}")]
    IncompleteProfile(&'static str),

    #[error("username {0:?} is not a usable sender address")]
    InvalidSender(String),

    #[error("attachment not readable: {}", .0.display())]
    MissingAttachment(PathBuf),

    #[error("a send run is already in progress")]
    AlreadyRunning,

    #[error("could not start send worker: {0}")]
    Worker(#[from] std::io::Error),
}

/// Per-recipient or per-connection delivery failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("recipient rejected: {0}")]
    RecipientRejected(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("could not build message: {0}")]
    InvalidMessage(String),
}

impl DeliveryError {
    /// Whether this failure ends the run for every remaining recipient
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthFailure(_) | Self::ConnectionLost(_))
    }
}
