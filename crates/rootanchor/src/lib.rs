//! # rootanchor
//!
//! Cross-platform trust-store reconciliation for a local root CA.
//!
//! Developer tools that intercept TLS need their signing CA trusted by
//! whatever the machine actually uses to make trust decisions: the OS
//! store, plus the NSS databases of browsers that ignore the OS store.
//! This crate installs, removes, and audits one CA certificate across
//! all of them through the platform's own tooling.
//!
//! ## How an operation runs
//!
//! ```text
//! detect platform + default browser
//!   -> resolve targets (system store + NSS databases)
//!   -> check for running browser processes (detect only, never kill)
//!   -> per target: query, mutate if needed, re-query to verify
//!   -> aggregate into Success / PartialSuccess / Failure
//! ```
//!
//! One broken store never aborts the others; every target gets its own
//! verdict in the [`types::OperationOutcome`]. Trust presence is
//! three-valued ([`types::TrustState`]): a certificate can sit in a
//! store without the flags that make TLS clients accept it, and that
//! state is reported, not rounded to a boolean.
//!
//! The entry point is [`coordinator::TrustCoordinator`].

mod cmd;

pub mod coordinator;
pub mod detect;
pub mod error;
pub mod guard;
pub mod hash;
pub mod platform;
pub mod receipt;
pub mod stores;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use coordinator::{
    BrowserReport, CoordinatorConfig, ExpiryReport, TargetState, TrustCoordinator, TrustReport,
};
pub use error::{Result, TrustError};
pub use guard::ProcessGuard;
pub use platform::Platform;
pub use receipt::{InstallRecord, ReceiptStore};
pub use stores::TrustBackend;
pub use types::*;
