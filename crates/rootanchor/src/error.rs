use thiserror::Error;

/// Result type alias for trust-store operations
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors that can occur while reconciling trust stores
#[derive(Error, Debug)]
pub enum TrustError {
    /// Store or certificate absent; frequently absorbed by the
    /// idempotence policy rather than surfaced
    #[error("not found: {what}")]
    NotFound {
        /// Description of what was missing
        what: String,
    },

    /// The store exists but mutating it needs elevated privileges
    #[error("permission denied: {action}")]
    PermissionDenied {
        /// The mutation that was refused
        action: String,
    },

    /// Store file, service, or management tool missing or corrupt
    #[error("trust store unavailable: {store}: {reason}")]
    StoreUnavailable {
        /// The store that could not be reached
        store: String,
        /// Why it is unreachable
        reason: String,
    },

    /// Input bytes are not a valid certificate
    #[error("invalid certificate: {0}")]
    ParseError(String),

    /// A consuming process is running and will not observe the change
    /// until it restarts
    #[error("process conflict: {process} is running and caches trust decisions")]
    ProcessConflict {
        /// Display name of the conflicting process
        process: String,
    },

    /// A store operation exceeded its deadline
    #[error("operation timed out after {0} seconds")]
    Timeout(u64),

    /// A store management command exited non-zero
    #[error("command failed: {program} (exit {code:?}): {stderr}")]
    CommandFailed {
        /// The program that was invoked
        program: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Trimmed stderr output
        stderr: String,
    },

    /// Filesystem error from receipt or staging paths
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Receipt serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrustError {
    /// Returns true if resolving the error needs user action before a
    /// retry can succeed
    #[must_use]
    pub const fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::ProcessConflict { .. }
        )
    }

    /// Returns true if the error reports missing elevation
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// An actionable next step for the user, when one exists
    #[must_use]
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::PermissionDenied { action } => {
                Some(format!("rerun with elevated privileges to {action}"))
            }
            Self::ProcessConflict { process } => {
                Some(format!("close {process} and retry"))
            }
            Self::StoreUnavailable { store, reason } => {
                Some(format!("{store} is unavailable ({reason}); install or repair it first"))
            }
            Self::Timeout(secs) => {
                Some(format!("the store did not respond within {secs}s; retry or raise the timeout"))
            }
            _ => None,
        }
    }
}
