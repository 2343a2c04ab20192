//! Core types for trust-store reconciliation.

pub mod browser;
pub mod cert;
pub mod outcome;
pub mod target;

pub use browser::{BrowserFamily, BrowserProfile, NssDbKind, NssProfile, TrustMechanism};
pub use cert::{CaCertificate, CertIdentity, ExpiryStatus};
pub use outcome::{OperationKind, OperationOutcome, OverallStatus, TargetReport, TrustState};
pub use target::{StoreLocation, TrustStoreTarget};
