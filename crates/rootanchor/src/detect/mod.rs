//! Default browser detection.
//!
//! Each platform exposes its default handler for `https` through a
//! different mechanism (xdg-settings, the registry, LaunchServices).
//! Detection is best effort and total: any failure degrades to the
//! Unknown browser, which still reconciles the system store. Results
//! are recomputed on every operation; the default browser can change
//! between invocations.

pub mod linux;
pub mod macos;
pub mod windows;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::platform::Platform;
use crate::types::{BrowserFamily, BrowserProfile, NssDbKind, NssProfile};

/// Detect the default browser and enumerate the NSS databases it
/// consults. Never fails; detection trouble yields [`BrowserProfile::unknown`].
pub async fn detect_default_browser() -> BrowserProfile {
    let platform = Platform::detect();
    let family = match platform {
        Platform::Linux => linux::default_family().await,
        Platform::MacOs => macos::default_family().await,
        Platform::Windows => windows::default_family().await,
        Platform::Unsupported => None,
    };
    match family {
        Some(family) => profile_for(family, platform),
        None => {
            debug!("default browser could not be determined");
            BrowserProfile::unknown()
        }
    }
}

/// Display name of the default browser, `"Unknown"` when none is
/// registered.
pub async fn default_browser_name() -> String {
    detect_default_browser().await.name
}

/// Build the full profile for a detected browser family.
#[must_use]
pub fn profile_for(family: BrowserFamily, platform: Platform) -> BrowserProfile {
    let mechanism = family.trust_mechanism(platform);
    let nss_profiles = if mechanism.uses_nss() {
        nss_profiles_for(family, platform)
    } else {
        Vec::new()
    };
    debug!(
        browser = family.display_name(),
        ?mechanism,
        nss_profiles = nss_profiles.len(),
        "detected default browser"
    );
    BrowserProfile {
        family,
        name: family.display_name().to_string(),
        mechanism,
        nss_profiles,
    }
}

fn nss_profiles_for(family: BrowserFamily, platform: Platform) -> Vec<NssProfile> {
    match family {
        BrowserFamily::Firefox => firefox_profiles_root(platform)
            .map(|root| scan_nss_profiles(&root))
            .unwrap_or_default(),
        BrowserFamily::Chrome | BrowserFamily::Chromium | BrowserFamily::Brave => {
            // Chromium lineage shares one per-user database
            shared_nssdb().into_iter().collect()
        }
        _ => Vec::new(),
    }
}

fn firefox_profiles_root(platform: Platform) -> Option<PathBuf> {
    let base = directories::BaseDirs::new()?;
    let root = match platform {
        Platform::Linux => base.home_dir().join(".mozilla/firefox"),
        Platform::MacOs => base
            .home_dir()
            .join("Library/Application Support/Firefox/Profiles"),
        Platform::Windows => base.data_dir().join("Mozilla/Firefox/Profiles"),
        Platform::Unsupported => return None,
    };
    root.is_dir().then_some(root)
}

fn shared_nssdb() -> Option<NssProfile> {
    let base = directories::BaseDirs::new()?;
    let dir = base.home_dir().join(".pki/nssdb");
    let kind = NssDbKind::detect_in(&dir)?;
    Some(NssProfile { directory: dir, kind })
}

/// Every subdirectory holding a certificate database is a profile.
/// Sorted by path so repeated runs report targets in a stable order.
fn scan_nss_profiles(root: &Path) -> Vec<NssProfile> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut profiles: Vec<NssProfile> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            NssDbKind::detect_in(&path).map(|kind| NssProfile {
                directory: path,
                kind,
            })
        })
        .collect();
    profiles.sort_by(|a, b| a.directory.cmp(&b.directory));
    profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scans_profiles_holding_certificate_databases() {
        let dir = tempfile::tempdir().unwrap();
        let modern = dir.path().join("ab12.default-release");
        let legacy = dir.path().join("cd34.default");
        let empty = dir.path().join("ef56.dev-edition");
        for p in [&modern, &legacy, &empty] {
            tokio::fs::create_dir(p).await.unwrap();
        }
        tokio::fs::write(modern.join("cert9.db"), b"").await.unwrap();
        tokio::fs::write(legacy.join("cert8.db"), b"").await.unwrap();
        tokio::fs::write(dir.path().join("profiles.ini"), b"[General]").await.unwrap();

        let profiles = scan_nss_profiles(dir.path());
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].directory, modern);
        assert_eq!(profiles[0].kind, NssDbKind::Sql);
        assert_eq!(profiles[1].directory, legacy);
        assert_eq!(profiles[1].kind, NssDbKind::Dbm);
    }

    #[test]
    fn scan_of_missing_root_is_empty() {
        assert!(scan_nss_profiles(Path::new("/nonexistent/profiles")).is_empty());
    }

    #[test]
    fn system_store_browsers_get_no_nss_profiles() {
        let profile = profile_for(BrowserFamily::Safari, Platform::MacOs);
        assert_eq!(profile.name, "Safari");
        assert!(profile.nss_profiles.is_empty());
        assert!(!profile.mechanism.uses_nss());
    }

    #[test]
    fn unknown_profile_is_the_detection_fallback() {
        let profile = BrowserProfile::unknown();
        assert_eq!(profile.name, "Unknown");
        assert!(profile.nss_profiles.is_empty());
    }

    #[tokio::test]
    async fn browser_name_is_never_empty() {
        assert!(!default_browser_name().await.is_empty());
    }
}
