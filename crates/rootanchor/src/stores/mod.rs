//! Trust store backends.
//!
//! One [`TrustBackend`] implementation exists per store mechanism.
//! The coordinator never touches a concrete store type: backends are
//! resolved at runtime from the detected platform and browser profile
//! and handed back as trait objects, so adding a store kind means
//! adding a module here and a line to [`resolve_backends`].

pub mod linux;
pub mod macos;
pub mod nss;
pub mod windows;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::platform::Platform;
use crate::types::{BrowserProfile, CaCertificate, CertIdentity, TrustState, TrustStoreTarget};

/// Mechanical add/remove/query operations against one concrete store.
///
/// Implementations must be idempotent: installing an already-trusted
/// certificate and removing an absent one are both successes. Where
/// the underlying mechanism is not transactional, mutations verify
/// their post-condition by re-querying before reporting success.
#[async_trait]
pub trait TrustBackend: Send + Sync {
    /// The store this backend operates on.
    fn target(&self) -> &TrustStoreTarget;

    /// Three-state presence/trust inspection by fingerprint match.
    ///
    /// Distinguishes "absent" from "present but trust flags not set"
    /// from "store unreadable"; the caller needs all three to repair
    /// stores that auto-import certificates without granting trust.
    async fn query(&self, identity: &CertIdentity) -> Result<TrustState>;

    /// Add the certificate and mark it trusted for TLS server
    /// authentication. `identity` carries the nickname to register the
    /// certificate under; `pem_path` is a PEM copy on disk for tools
    /// that take a file argument.
    async fn install(
        &self,
        cert: &CaCertificate,
        identity: &CertIdentity,
        pem_path: &Path,
    ) -> Result<()>;

    /// Remove the certificate by fingerprint match.
    async fn uninstall(&self, identity: &CertIdentity) -> Result<()>;
}

/// Resolve the full backend set for this machine: the platform's system
/// store plus every NSS database the default browser consults.
/// Recomputed on every operation; nothing here is cached across runs.
#[must_use]
pub fn resolve_backends(
    platform: Platform,
    browser: &BrowserProfile,
) -> Vec<Box<dyn TrustBackend>> {
    let mut backends: Vec<Box<dyn TrustBackend>> = Vec::new();

    match platform {
        Platform::MacOs => backends.push(Box::new(macos::MacKeychainStore::new())),
        Platform::Windows => backends.push(Box::new(windows::WindowsRootStore::new())),
        Platform::Linux => backends.push(Box::new(linux::LinuxSystemStore::discover())),
        Platform::Unsupported => {}
    }

    if browser.mechanism.uses_nss() {
        for profile in &browser.nss_profiles {
            backends.push(Box::new(nss::NssStore::new(browser.family, profile.clone())));
        }
    }

    backends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BrowserFamily, NssDbKind, NssProfile, TrustMechanism};
    use std::path::PathBuf;

    fn firefox_profile(dirs: &[&str]) -> BrowserProfile {
        BrowserProfile {
            family: BrowserFamily::Firefox,
            name: "Firefox".to_string(),
            mechanism: TrustMechanism::SelfManagedNss,
            nss_profiles: dirs
                .iter()
                .map(|d| NssProfile {
                    directory: PathBuf::from(d),
                    kind: NssDbKind::Sql,
                })
                .collect(),
        }
    }

    #[test]
    fn system_store_is_always_in_the_target_set() {
        let backends = resolve_backends(Platform::Linux, &firefox_profile(&[]));
        assert_eq!(backends.len(), 1);
        assert!(backends[0].target().is_system());
    }

    #[test]
    fn every_nss_profile_becomes_a_target() {
        let profile = firefox_profile(&["/home/u/.mozilla/firefox/a", "/home/u/.mozilla/firefox/b"]);
        let backends = resolve_backends(Platform::Linux, &profile);
        assert_eq!(backends.len(), 3);
        assert_eq!(
            backends.iter().filter(|b| !b.target().is_system()).count(),
            2
        );
    }

    #[test]
    fn system_store_consumers_add_no_nss_targets() {
        let safari = BrowserProfile {
            family: BrowserFamily::Safari,
            name: "Safari".to_string(),
            mechanism: TrustMechanism::SystemStore,
            nss_profiles: Vec::new(),
        };
        let backends = resolve_backends(Platform::MacOs, &safari);
        assert_eq!(backends.len(), 1);
    }

    #[test]
    fn unsupported_platform_resolves_no_system_store() {
        let backends = resolve_backends(Platform::Unsupported, &BrowserProfile::unknown());
        assert!(backends.is_empty());
    }
}
