//! Host platform detection.
//!
//! Store selection is a runtime decision: the coordinator asks which
//! platform it is on and builds the matching backends, so adding a store
//! kind never touches the dispatch logic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating system family, detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    /// macOS (system keychain via `security`)
    MacOs,
    /// Windows (user Root store via `certutil`)
    Windows,
    /// Linux (anchors directory + distribution update command)
    Linux,
    /// Anything else; no system store backend exists for it
    Unsupported,
}

impl Platform {
    /// Detect the platform the process is running on.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    pub(crate) fn from_os_name(os: &str) -> Self {
        match os {
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            _ => Self::Unsupported,
        }
    }

    /// Human name of the platform's system trust store.
    #[must_use]
    pub const fn system_store_name(self) -> &'static str {
        match self {
            Self::MacOs => "macOS login keychain",
            Self::Windows => "Windows user Root store",
            Self::Linux => "Linux CA anchors",
            Self::Unsupported => "unsupported system store",
        }
    }

    /// Whether a system-store backend exists for this platform.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_os_names() {
        assert_eq!(Platform::from_os_name("macos"), Platform::MacOs);
        assert_eq!(Platform::from_os_name("windows"), Platform::Windows);
        assert_eq!(Platform::from_os_name("linux"), Platform::Linux);
    }

    #[test]
    fn unknown_os_is_unsupported() {
        assert_eq!(Platform::from_os_name("freebsd"), Platform::Unsupported);
        assert!(!Platform::from_os_name("haiku").is_supported());
    }

    #[test]
    fn detect_matches_compile_target() {
        assert_eq!(Platform::detect(), Platform::from_os_name(std::env::consts::OS));
    }
}
