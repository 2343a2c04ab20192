//! Operation results.
//!
//! Per-target failures are captured here, never propagated past the
//! coordinator: every operation produces a complete [`OperationOutcome`]
//! so the caller can present a per-target remediation list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TrustError;
use crate::types::target::TrustStoreTarget;

/// Result of querying one store for one certificate.
///
/// Three positive states plus a failure state. The distinction between
/// `NotPresent` and `PresentButUntrusted` is load-bearing: some stores
/// auto-import certificates without granting trust, and repairing that
/// requires knowing which of the two holds. Never collapsed to a bool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustState {
    /// Present with trust granted for TLS server authentication
    Trusted,
    /// No certificate with a matching fingerprint in the store
    NotPresent,
    /// A matching certificate exists but trust flags are not set
    PresentButUntrusted,
    /// The store could not be read
    QueryFailed(String),
}

impl TrustState {
    /// Whether the desired end state (trusted) holds.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted)
    }

    /// Aggregate per-store states into one verdict.
    ///
    /// Trusted only when every store reports Trusted. Any
    /// `PresentButUntrusted` dominates `NotPresent` (repair needed, not
    /// install). Unreadable stores prevent a Trusted verdict; when
    /// nothing better can be established the aggregate is the first
    /// failure.
    #[must_use]
    pub fn aggregate(states: &[Self]) -> Self {
        if states.is_empty() {
            return Self::QueryFailed("no applicable trust stores".to_string());
        }
        if states.iter().all(Self::is_trusted) {
            return Self::Trusted;
        }
        if states
            .iter()
            .any(|s| matches!(s, Self::PresentButUntrusted))
        {
            return Self::PresentButUntrusted;
        }
        if states.iter().any(|s| matches!(s, Self::NotPresent)) {
            return Self::NotPresent;
        }
        states
            .iter()
            .find(|s| matches!(s, Self::QueryFailed(_)))
            .cloned()
            .unwrap_or(Self::NotPresent)
    }
}

impl fmt::Display for TrustState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trusted => write!(f, "trusted"),
            Self::NotPresent => write!(f, "not present"),
            Self::PresentButUntrusted => write!(f, "present but untrusted"),
            Self::QueryFailed(reason) => write!(f, "query failed: {reason}"),
        }
    }
}

/// The operation an outcome describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Add and trust the certificate
    Install,
    /// Remove the certificate
    Uninstall,
    /// Read-only trust query
    Query,
}

impl OperationKind {
    /// Whether the operation writes to a store.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(self, Self::Install | Self::Uninstall)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Uninstall => write!(f, "uninstall"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// Overall classification of a multi-target operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    /// Every target succeeded
    Success,
    /// At least one target succeeded and at least one failed
    PartialSuccess,
    /// Every target failed
    Failure,
}

/// What happened on one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetReport {
    /// Stable target identifier
    pub target_id: String,
    /// Human description of the store
    pub target: String,
    /// Whether the desired end state was reached
    pub succeeded: bool,
    /// What was done ("installed", "already trusted", ...)
    pub detail: Option<String>,
    /// Failure message, when `succeeded` is false
    pub error: Option<String>,
    /// Actionable next step, when one exists
    pub hint: Option<String>,
}

impl TargetReport {
    /// Report a target that reached the desired end state.
    #[must_use]
    pub fn success(target: &TrustStoreTarget, detail: impl Into<String>) -> Self {
        Self {
            target_id: target.id(),
            target: target.description(),
            succeeded: true,
            detail: Some(detail.into()),
            error: None,
            hint: None,
        }
    }

    /// Report a failed target, deriving the remediation hint from the
    /// error.
    #[must_use]
    pub fn failure(target: &TrustStoreTarget, error: &TrustError) -> Self {
        Self {
            target_id: target.id(),
            target: target.description(),
            succeeded: false,
            detail: None,
            error: Some(error.to_string()),
            hint: error.remediation(),
        }
    }

    /// Attach or replace the hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Aggregate result of an operation spanning every applicable target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Which operation ran
    pub operation: OperationKind,
    /// Overall classification
    pub overall: OverallStatus,
    /// Per-target reports, in execution order
    pub targets: Vec<TargetReport>,
}

impl OperationOutcome {
    /// Build an outcome from per-target reports, deriving the overall
    /// classification. No targets means there was nothing to do, which
    /// is the desired end state.
    #[must_use]
    pub fn from_reports(operation: OperationKind, targets: Vec<TargetReport>) -> Self {
        let succeeded = targets.iter().filter(|t| t.succeeded).count();
        let overall = if succeeded == targets.len() {
            OverallStatus::Success
        } else if succeeded == 0 {
            OverallStatus::Failure
        } else {
            OverallStatus::PartialSuccess
        };
        Self {
            operation,
            overall,
            targets,
        }
    }

    /// Whether every target reached the desired end state.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.overall, OverallStatus::Success)
    }

    /// The targets that failed, in execution order.
    #[must_use]
    pub fn failed_targets(&self) -> Vec<&TargetReport> {
        self.targets.iter().filter(|t| !t.succeeded).collect()
    }
}
