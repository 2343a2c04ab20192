//! macOS login keychain backend via the `security` tool.
//!
//! Trust is written with per-user trust settings (`add-trusted-cert -r
//! trustRoot -p ssl`) into the login keychain, so no elevation is
//! needed. The keychain path is resolved at each use and never held.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cmd::{run_tool, CmdOutput};
use crate::error::{Result, TrustError};
use crate::platform::Platform;
use crate::stores::TrustBackend;
use crate::types::{CaCertificate, CertIdentity, TrustState, TrustStoreTarget};

const SECURITY: &str = "security";

/// The login keychain of the current user.
#[derive(Debug)]
pub struct MacKeychainStore {
    target: TrustStoreTarget,
}

impl MacKeychainStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            target: TrustStoreTarget::system(Platform::MacOs, false),
        }
    }

    fn store_name(&self) -> String {
        self.target.description()
    }

    /// Resolve the login keychain path: ask `security` for the default
    /// keychain, fall back to the standard location.
    async fn login_keychain(&self) -> Result<String> {
        let out = run_tool(&self.store_name(), SECURITY, &["default-keychain"]).await?;
        if out.success {
            let keychain = parse_keychain_output(&out.stdout);
            if !keychain.is_empty() {
                return Ok(keychain);
            }
        }

        if let Some(base) = directories::BaseDirs::new() {
            let login = base.home_dir().join("Library/Keychains/login.keychain-db");
            if login.exists() {
                return Ok(login.display().to_string());
            }
        }

        Err(TrustError::StoreUnavailable {
            store: self.store_name(),
            reason: "could not determine login keychain path".to_string(),
        })
    }

    /// Whether the keychain holds a certificate with this SHA-1, by
    /// listing every certificate matching the common name.
    async fn find_by_sha1(&self, identity: &CertIdentity, keychain: &str) -> Result<bool> {
        let out = run_tool(
            &self.store_name(),
            SECURITY,
            &[
                "find-certificate",
                "-a",
                "-Z",
                "-c",
                &identity.common_name,
                keychain,
            ],
        )
        .await?;
        if !out.success {
            if out.mentions_any(&["could not be found", "not found"]) {
                return Ok(false);
            }
            return Err(out.into_error(SECURITY));
        }
        Ok(out.stdout.to_ascii_lowercase().contains(&identity.sha1))
    }

    /// Whether per-user trust settings exist for the certificate.
    /// `dump-trust-settings` exits non-zero when the user domain holds
    /// no settings at all; that is an answer, not a failure.
    async fn has_trust_settings(&self, identity: &CertIdentity) -> Result<bool> {
        let out = run_tool(&self.store_name(), SECURITY, &["dump-trust-settings"]).await?;
        if !out.success && !out.mentions_any(&["no trust settings"]) {
            return Err(out.into_error(SECURITY));
        }
        Ok(out.stdout.contains(&identity.common_name))
    }
}

impl Default for MacKeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrustBackend for MacKeychainStore {
    fn target(&self) -> &TrustStoreTarget {
        &self.target
    }

    async fn query(&self, identity: &CertIdentity) -> Result<TrustState> {
        let keychain = self.login_keychain().await?;
        if !self.find_by_sha1(identity, &keychain).await? {
            return Ok(TrustState::NotPresent);
        }
        if self.has_trust_settings(identity).await? {
            Ok(TrustState::Trusted)
        } else {
            debug!(
                fingerprint = %identity.sha256,
                "certificate in keychain without trust settings"
            );
            Ok(TrustState::PresentButUntrusted)
        }
    }

    async fn install(
        &self,
        cert: &CaCertificate,
        identity: &CertIdentity,
        pem_path: &Path,
    ) -> Result<()> {
        let keychain = self.login_keychain().await?;
        let pem = pem_path.display().to_string();

        let out = run_tool(
            &self.store_name(),
            SECURITY,
            &[
                "add-trusted-cert",
                "-r",
                "trustRoot",
                "-p",
                "ssl",
                "-k",
                &keychain,
                &pem,
            ],
        )
        .await?;
        if !out.success && !out.mentions_any(&["already exists", "duplicate"]) {
            return Err(map_security_failure(out, "add the certificate to the login keychain"));
        }

        // add-trusted-cert is not transactional; confirm before claiming success
        let state = self.query(identity).await?;
        if state.is_trusted() {
            info!(keychain = %keychain, subject = %cert.subject, "certificate trusted in keychain");
            Ok(())
        } else {
            Err(TrustError::CommandFailed {
                program: SECURITY.to_string(),
                code: None,
                stderr: format!("post-install verification reported: {state}"),
            })
        }
    }

    async fn uninstall(&self, identity: &CertIdentity) -> Result<()> {
        let keychain = self.login_keychain().await?;
        let sha1 = identity.sha1.to_ascii_uppercase();

        // delete-certificate removes one match per call; repeated manual
        // installs can leave duplicates behind
        for _ in 0..3 {
            if !self.find_by_sha1(identity, &keychain).await? {
                return Ok(());
            }
            let out = run_tool(
                &self.store_name(),
                SECURITY,
                &["delete-certificate", "-Z", &sha1, &keychain],
            )
            .await?;
            if !out.success {
                if out.mentions_any(&["could not be found", "not found", "unable to delete"]) {
                    warn!(sha1 = %identity.sha1, "delete-certificate found nothing to delete");
                    return Ok(());
                }
                return Err(map_security_failure(
                    out,
                    "delete the certificate from the login keychain",
                ));
            }
        }

        if self.find_by_sha1(identity, &keychain).await? {
            return Err(TrustError::CommandFailed {
                program: SECURITY.to_string(),
                code: None,
                stderr: "certificate still present after repeated deletion".to_string(),
            });
        }
        Ok(())
    }
}

/// `security default-keychain` prints the path indented and quoted.
fn parse_keychain_output(stdout: &str) -> String {
    stdout.trim().trim_matches('"').to_string()
}

fn map_security_failure(out: CmdOutput, action: &str) -> TrustError {
    if out.mentions_any(&["authorization", "not permitted", "permission"]) {
        TrustError::PermissionDenied {
            action: action.to_string(),
        }
    } else {
        out.into_error(SECURITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keychain_output_is_unquoted_and_trimmed() {
        let raw = "    \"/Users/dev/Library/Keychains/login.keychain-db\"\n";
        assert_eq!(
            parse_keychain_output(raw),
            "/Users/dev/Library/Keychains/login.keychain-db"
        );
        assert_eq!(parse_keychain_output("\n"), "");
    }

    #[test]
    fn authorization_failures_map_to_permission_denied() {
        let out = CmdOutput {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: "SecTrustSettingsSetTrustSettings: The authorization was denied.".to_string(),
        };
        let err = map_security_failure(out, "add the certificate to the login keychain");
        assert!(err.is_permission_denied());
        assert!(err.remediation().unwrap().contains("elevated"));
    }

    #[test]
    fn other_failures_keep_the_command_error() {
        let out = CmdOutput {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: "Unknown error".to_string(),
        };
        let err = map_security_failure(out, "add the certificate to the login keychain");
        assert!(matches!(err, TrustError::CommandFailed { .. }));
    }

    #[test]
    fn target_is_the_macos_system_store() {
        let store = MacKeychainStore::new();
        assert!(store.target().is_system());
        assert!(!store.target().requires_elevation);
        assert_eq!(store.target().id(), "system:macos");
    }
}
