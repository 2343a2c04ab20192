//! Trust store targets.
//!
//! A target names one concrete store on this machine and is the unit of
//! mutual exclusion for mutations. Targets are resolved fresh on every
//! operation and never cached across runs.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::types::browser::{BrowserFamily, NssDbKind};

/// The concrete store a target points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreLocation {
    /// The OS system store of the detected platform
    SystemStore {
        /// Platform whose store mechanism applies
        platform: Platform,
    },
    /// One NSS certificate database belonging to a browser profile
    NssDatabase {
        /// Browser family that owns the database
        family: BrowserFamily,
        /// Directory holding the database files
        directory: PathBuf,
        /// Database format
        kind: NssDbKind,
    },
}

/// One reachable trust store plus the capability facts needed to
/// operate on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustStoreTarget {
    /// Which store this is
    pub location: StoreLocation,
    /// Whether mutations need elevated privileges; determined at
    /// discovery time, never mid-operation
    pub requires_elevation: bool,
}

impl TrustStoreTarget {
    /// Target for the platform's system store.
    #[must_use]
    pub const fn system(platform: Platform, requires_elevation: bool) -> Self {
        Self {
            location: StoreLocation::SystemStore { platform },
            requires_elevation,
        }
    }

    /// Target for a browser-owned NSS database. Profile directories are
    /// user-owned, so no elevation is needed.
    #[must_use]
    pub const fn nss(family: BrowserFamily, directory: PathBuf, kind: NssDbKind) -> Self {
        Self {
            location: StoreLocation::NssDatabase {
                family,
                directory,
                kind,
            },
            requires_elevation: false,
        }
    }

    /// Stable identifier, unique per store; used as the lock key and in
    /// outcome reports.
    #[must_use]
    pub fn id(&self) -> String {
        match &self.location {
            StoreLocation::SystemStore { platform } => format!("system:{platform}"),
            StoreLocation::NssDatabase {
                family, directory, ..
            } => format!(
                "nss:{}:{}",
                family.display_name().to_lowercase().replace(' ', "-"),
                directory.display()
            ),
        }
    }

    /// Human description for outcome reports.
    #[must_use]
    pub fn description(&self) -> String {
        match &self.location {
            StoreLocation::SystemStore { platform } => platform.system_store_name().to_string(),
            StoreLocation::NssDatabase {
                family, directory, ..
            } => format!(
                "{} NSS database ({})",
                family.display_name(),
                directory.display()
            ),
        }
    }

    /// Whether this is the OS system store.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self.location, StoreLocation::SystemStore { .. })
    }

    /// Whether a consuming process must restart to observe a mutation.
    /// NSS databases are read once at browser startup; OS stores are
    /// consulted live.
    #[must_use]
    pub const fn restart_sensitive(&self) -> bool {
        matches!(self.location, StoreLocation::NssDatabase { .. })
    }

    /// The browser family that owns this store, for NSS targets.
    #[must_use]
    pub const fn owning_family(&self) -> Option<BrowserFamily> {
        match self.location {
            StoreLocation::SystemStore { .. } => None,
            StoreLocation::NssDatabase { family, .. } => Some(family),
        }
    }
}

impl fmt::Display for TrustStoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
