//! Shared error type across meshlink crates.

use thiserror::Error;

/// Stable error codes, used in logs and by callers that branch on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid or incomplete configuration.
    Config,
    /// Transport could not be opened.
    Dial,
    /// Handshake sequence broke (timeout, wrong frame, bad json).
    Handshake,
    /// Peer refused the auth request.
    AuthRejected,
    /// Peer sent a frame that violates the protocol.
    Protocol,
    /// Steady-state read failed.
    Read,
    /// Frame write failed.
    Write,
    /// Identity file could not be read or written.
    Persistence,
    /// No connection is currently held.
    NotConnected,
    /// Channel is stopped.
    NotRunning,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in structured logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Config => "CONFIG",
            ErrorCode::Dial => "DIAL",
            ErrorCode::Handshake => "HANDSHAKE",
            ErrorCode::AuthRejected => "AUTH_REJECTED",
            ErrorCode::Protocol => "PROTOCOL",
            ErrorCode::Read => "READ",
            ErrorCode::Write => "WRITE",
            ErrorCode::Persistence => "PERSISTENCE",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::NotRunning => "NOT_RUNNING",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Unified error type used by core and worker.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("config: {0}")]
    Config(String),
    #[error("dial failed: {0}")]
    Dial(String),
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("auth rejected: {message} ({code})")]
    AuthRejected { code: String, message: String },
    #[error("protocol: {0}")]
    Protocol(String),
    #[error("read failed: {0}")]
    Read(String),
    #[error("write failed: {0}")]
    Write(String),
    #[error("identity persistence: {0}")]
    Persistence(String),
    #[error("worker ws not connected")]
    NotConnected,
    #[error("worker ws channel not running")]
    NotRunning,
    #[error("internal: {0}")]
    Internal(String),
}

impl MeshError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MeshError::Config(_) => ErrorCode::Config,
            MeshError::Dial(_) => ErrorCode::Dial,
            MeshError::Handshake(_) => ErrorCode::Handshake,
            MeshError::AuthRejected { .. } => ErrorCode::AuthRejected,
            MeshError::Protocol(_) => ErrorCode::Protocol,
            MeshError::Read(_) => ErrorCode::Read,
            MeshError::Write(_) => ErrorCode::Write,
            MeshError::Persistence(_) => ErrorCode::Persistence,
            MeshError::NotConnected => ErrorCode::NotConnected,
            MeshError::NotRunning => ErrorCode::NotRunning,
            MeshError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Whether the reconnect loop may simply try again later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::Dial
                | ErrorCode::Handshake
                | ErrorCode::AuthRejected
                | ErrorCode::Protocol
                | ErrorCode::Read
        )
    }
}
