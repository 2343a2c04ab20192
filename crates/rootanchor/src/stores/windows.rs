//! Windows user Root store backend via `certutil`.
//!
//! Operates on the per-user store (`-user`), which needs no elevation.
//! Membership in the Root store is what confers trust on Windows, so a
//! found certificate reports Trusted; the present-but-untrusted state
//! does not arise from this mechanism.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::cmd::{run_tool, CmdOutput};
use crate::error::{Result, TrustError};
use crate::platform::Platform;
use crate::stores::TrustBackend;
use crate::types::{CaCertificate, CertIdentity, TrustState, TrustStoreTarget};

const CERTUTIL: &str = "certutil";

/// Strings `certutil` prints (on stdout, localized builds vary) when a
/// certificate is absent.
const ABSENT_MARKERS: &[&str] = &["cannot find", "not found", "object was not found"];

/// The current user's Root certificate store.
#[derive(Debug)]
pub struct WindowsRootStore {
    target: TrustStoreTarget,
}

impl WindowsRootStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            target: TrustStoreTarget::system(Platform::Windows, false),
        }
    }

    fn store_name(&self) -> String {
        self.target.description()
    }

    async fn find_by_sha1(&self, identity: &CertIdentity) -> Result<bool> {
        let out = run_tool(
            &self.store_name(),
            CERTUTIL,
            &["-user", "-store", "Root", &identity.sha1],
        )
        .await?;
        if out.success {
            return Ok(true);
        }
        if out.mentions_any(ABSENT_MARKERS) {
            return Ok(false);
        }
        Err(map_certutil_failure(out, "read the user Root store"))
    }
}

impl Default for WindowsRootStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrustBackend for WindowsRootStore {
    fn target(&self) -> &TrustStoreTarget {
        &self.target
    }

    async fn query(&self, identity: &CertIdentity) -> Result<TrustState> {
        if self.find_by_sha1(identity).await? {
            Ok(TrustState::Trusted)
        } else {
            Ok(TrustState::NotPresent)
        }
    }

    async fn install(
        &self,
        cert: &CaCertificate,
        identity: &CertIdentity,
        pem_path: &Path,
    ) -> Result<()> {
        let pem = pem_path.display().to_string();
        let out = run_tool(
            &self.store_name(),
            CERTUTIL,
            &["-user", "-addstore", "Root", &pem],
        )
        .await?;
        if !out.success && !out.mentions_any(&["already in store"]) {
            return Err(map_certutil_failure(out, "add the certificate to the user Root store"));
        }

        if self.find_by_sha1(identity).await? {
            info!(subject = %cert.subject, "certificate trusted in user Root store");
            Ok(())
        } else {
            Err(TrustError::CommandFailed {
                program: CERTUTIL.to_string(),
                code: None,
                stderr: "certificate not readable back after -addstore".to_string(),
            })
        }
    }

    async fn uninstall(&self, identity: &CertIdentity) -> Result<()> {
        let out = run_tool(
            &self.store_name(),
            CERTUTIL,
            &["-user", "-delstore", "Root", &identity.sha1],
        )
        .await?;
        if !out.success && !out.mentions_any(ABSENT_MARKERS) {
            return Err(map_certutil_failure(
                out,
                "delete the certificate from the user Root store",
            ));
        }

        if self.find_by_sha1(identity).await? {
            return Err(TrustError::CommandFailed {
                program: CERTUTIL.to_string(),
                code: None,
                stderr: "certificate still present after -delstore".to_string(),
            });
        }
        Ok(())
    }
}

fn map_certutil_failure(out: CmdOutput, action: &str) -> TrustError {
    if out.mentions_any(&["access is denied", "access denied"]) {
        TrustError::PermissionDenied {
            action: action.to_string(),
        }
    } else {
        out.into_error(CERTUTIL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_maps_to_permission_denied() {
        let out = CmdOutput {
            success: false,
            code: Some(5),
            stdout: "CertUtil: -addstore command FAILED: 0x80070005\nAccess is denied.".to_string(),
            stderr: String::new(),
        };
        let err = map_certutil_failure(out, "add the certificate to the user Root store");
        assert!(err.is_permission_denied());
    }

    #[test]
    fn absent_markers_cover_certutil_phrasings() {
        let out = CmdOutput {
            success: false,
            code: Some(1),
            stdout: "CertUtil: -store command FAILED: 0x80092004\nCannot find object or property."
                .to_string(),
            stderr: String::new(),
        };
        assert!(out.mentions_any(ABSENT_MARKERS));
    }

    #[test]
    fn target_is_the_windows_system_store() {
        let store = WindowsRootStore::new();
        assert!(store.target().is_system());
        assert!(!store.target().requires_elevation);
        assert_eq!(store.target().id(), "system:windows");
    }
}
