//! Browser identity and trust-mechanism classification.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Browser families the detector recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrowserFamily {
    /// Mozilla Firefox (and ESR); keeps its own NSS databases
    Firefox,
    /// Google Chrome
    Chrome,
    /// Chromium
    Chromium,
    /// Microsoft Edge
    Edge,
    /// Brave
    Brave,
    /// Apple Safari
    Safari,
    /// Handler present but not a known family, or none registered
    Unknown,
}

impl BrowserFamily {
    /// Human-readable family name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Firefox => "Firefox",
            Self::Chrome => "Google Chrome",
            Self::Chromium => "Chromium",
            Self::Edge => "Microsoft Edge",
            Self::Brave => "Brave",
            Self::Safari => "Safari",
            Self::Unknown => "Unknown",
        }
    }

    /// Which trust mechanism this family consults on the given platform.
    ///
    /// Firefox manages its own NSS databases everywhere. Chromium-family
    /// browsers use the OS store on macOS and Windows but consult both
    /// the OS store and the shared `~/.pki/nssdb` on Linux. Anything
    /// unrecognized is assumed to defer to the OS store.
    #[must_use]
    pub const fn trust_mechanism(self, platform: Platform) -> TrustMechanism {
        match self {
            Self::Firefox => TrustMechanism::SelfManagedNss,
            Self::Chrome | Self::Chromium | Self::Brave => match platform {
                Platform::Linux => TrustMechanism::Both,
                _ => TrustMechanism::SystemStore,
            },
            Self::Edge | Self::Safari | Self::Unknown => TrustMechanism::SystemStore,
        }
    }

    /// Process image names for this family on the given platform, used
    /// to detect a running instance.
    #[must_use]
    pub const fn executable_names(self, platform: Platform) -> &'static [&'static str] {
        match (self, platform) {
            (Self::Firefox, Platform::Windows) => &["firefox.exe"],
            (Self::Firefox, _) => &["firefox", "firefox-esr", "firefox-bin"],
            (Self::Chrome, Platform::Windows) => &["chrome.exe"],
            (Self::Chrome, Platform::MacOs) => &["Google Chrome"],
            (Self::Chrome, _) => &["chrome", "google-chrome"],
            (Self::Chromium, Platform::Windows) => &["chromium.exe"],
            (Self::Chromium, _) => &["chromium", "chromium-browser"],
            (Self::Edge, Platform::Windows) => &["msedge.exe"],
            (Self::Edge, Platform::MacOs) => &["Microsoft Edge"],
            (Self::Edge, _) => &["msedge", "microsoft-edge"],
            (Self::Brave, Platform::Windows) => &["brave.exe"],
            (Self::Brave, Platform::MacOs) => &["Brave Browser"],
            (Self::Brave, _) => &["brave", "brave-browser"],
            (Self::Safari, _) => &["Safari"],
            (Self::Unknown, _) => &[],
        }
    }
}

/// Which store(s) a browser consults for TLS trust decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustMechanism {
    /// Defers entirely to the OS system store
    SystemStore,
    /// Keeps its own NSS database(s); the OS store is not consulted
    SelfManagedNss,
    /// Consults the OS store and an NSS database
    Both,
    /// No default browser registered; only the OS store applies
    Unknown,
}

impl TrustMechanism {
    /// Whether any NSS database participates.
    #[must_use]
    pub const fn uses_nss(self) -> bool {
        matches!(self, Self::SelfManagedNss | Self::Both)
    }
}

/// NSS certificate database format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NssDbKind {
    /// Modern SQLite-backed database (`cert9.db`)
    Sql,
    /// Legacy Berkeley DB database (`cert8.db`)
    Dbm,
}

impl NssDbKind {
    /// `certutil -d` prefix for this format.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Sql => "sql:",
            Self::Dbm => "dbm:",
        }
    }

    /// Identify the database format present in a profile directory.
    /// `cert9.db` wins when both formats exist.
    #[must_use]
    pub fn detect_in(dir: &Path) -> Option<Self> {
        if dir.join("cert9.db").is_file() {
            Some(Self::Sql)
        } else if dir.join("cert8.db").is_file() {
            Some(Self::Dbm)
        } else {
            None
        }
    }
}

/// One discovered NSS certificate database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NssProfile {
    /// Directory holding the database files
    pub directory: PathBuf,
    /// Database format found there
    pub kind: NssDbKind,
}

impl NssProfile {
    /// The database URI passed to `certutil -d`.
    #[must_use]
    pub fn db_uri(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.directory.display())
    }
}

/// The detected default browser and everything trust-relevant about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserProfile {
    /// Recognized family
    pub family: BrowserFamily,
    /// Display name; the raw handler name when the family is unknown
    pub name: String,
    /// Trust mechanism classification
    pub mechanism: TrustMechanism,
    /// NSS databases, one per browser profile; empty for pure
    /// system-store consumers
    pub nss_profiles: Vec<NssProfile>,
}

impl BrowserProfile {
    /// Profile for the "no default browser registered" state. A valid
    /// state, not an error.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            family: BrowserFamily::Unknown,
            name: BrowserFamily::Unknown.display_name().to_string(),
            mechanism: TrustMechanism::Unknown,
            nss_profiles: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firefox_manages_its_own_nss_everywhere() {
        for platform in [Platform::Linux, Platform::MacOs, Platform::Windows] {
            assert_eq!(
                BrowserFamily::Firefox.trust_mechanism(platform),
                TrustMechanism::SelfManagedNss
            );
        }
    }

    #[test]
    fn chromium_family_is_dual_store_only_on_linux() {
        assert_eq!(
            BrowserFamily::Chrome.trust_mechanism(Platform::Linux),
            TrustMechanism::Both
        );
        assert_eq!(
            BrowserFamily::Chrome.trust_mechanism(Platform::MacOs),
            TrustMechanism::SystemStore
        );
        assert_eq!(
            BrowserFamily::Brave.trust_mechanism(Platform::Windows),
            TrustMechanism::SystemStore
        );
    }

    #[test]
    fn unknown_family_defers_to_the_system_store() {
        assert_eq!(
            BrowserFamily::Unknown.trust_mechanism(Platform::Linux),
            TrustMechanism::SystemStore
        );
    }

    #[test]
    fn db_uri_carries_the_format_prefix() {
        let sql = NssProfile {
            directory: PathBuf::from("/home/u/.mozilla/firefox/abc.default"),
            kind: NssDbKind::Sql,
        };
        assert_eq!(sql.db_uri(), "sql:/home/u/.mozilla/firefox/abc.default");

        let dbm = NssProfile {
            directory: PathBuf::from("/home/u/.mozilla/firefox/old"),
            kind: NssDbKind::Dbm,
        };
        assert_eq!(dbm.db_uri(), "dbm:/home/u/.mozilla/firefox/old");
    }

    #[test]
    fn detects_db_kind_preferring_sql() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(NssDbKind::detect_in(dir.path()), None);

        std::fs::write(dir.path().join("cert8.db"), b"").unwrap();
        assert_eq!(NssDbKind::detect_in(dir.path()), Some(NssDbKind::Dbm));

        std::fs::write(dir.path().join("cert9.db"), b"").unwrap();
        assert_eq!(NssDbKind::detect_in(dir.path()), Some(NssDbKind::Sql));
    }

    #[test]
    fn unknown_profile_is_a_valid_state() {
        let profile = BrowserProfile::unknown();
        assert_eq!(profile.name, "Unknown");
        assert_eq!(profile.mechanism, TrustMechanism::Unknown);
        assert!(profile.nss_profiles.is_empty());
        assert!(!profile.mechanism.uses_nss());
    }

    #[test]
    fn known_families_have_executable_identities() {
        for family in [
            BrowserFamily::Firefox,
            BrowserFamily::Chrome,
            BrowserFamily::Chromium,
            BrowserFamily::Edge,
            BrowserFamily::Brave,
        ] {
            for platform in [Platform::Linux, Platform::MacOs, Platform::Windows] {
                assert!(
                    !family.executable_names(platform).is_empty(),
                    "{family:?} on {platform:?} has no executables"
                );
            }
        }
        assert!(BrowserFamily::Unknown
            .executable_names(Platform::Linux)
            .is_empty());
    }
}
