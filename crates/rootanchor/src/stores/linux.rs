//! Linux system trust store backend.
//!
//! Linux distributions keep CA anchors as individual PEM files in a
//! directory and compile them into a consolidated bundle with a
//! distribution tool. Two layouts cover the mainstream families:
//! Debian-style (`update-ca-certificates`) and RHEL-style
//! (`update-ca-trust`). The layout is probed by directory existence at
//! construction; trust is verified against the compiled bundle, not
//! the anchor directory, because an anchor that never went through the
//! update tool is not consulted by TLS clients.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cmd::run_tool;
use crate::error::{Result, TrustError};
use crate::hash::sha256_bytes;
use crate::platform::Platform;
use crate::stores::TrustBackend;
use crate::types::{CaCertificate, CertIdentity, TrustState, TrustStoreTarget};

const DEBIAN_ANCHOR_DIR: &str = "/usr/local/share/ca-certificates";
const DEBIAN_BUNDLE: &str = "/etc/ssl/certs/ca-certificates.crt";
const RHEL_ANCHOR_DIR: &str = "/etc/pki/ca-trust/source/anchors";
const RHEL_BUNDLE: &str = "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem";

/// Paths and update tool for one distribution family.
#[derive(Debug, Clone)]
struct StoreLayout {
    anchor_dir: PathBuf,
    bundle_path: PathBuf,
    update_command: Vec<String>,
}

impl StoreLayout {
    fn debian() -> Self {
        Self {
            anchor_dir: PathBuf::from(DEBIAN_ANCHOR_DIR),
            bundle_path: PathBuf::from(DEBIAN_BUNDLE),
            update_command: vec!["update-ca-certificates".to_string()],
        }
    }

    fn rhel() -> Self {
        Self {
            anchor_dir: PathBuf::from(RHEL_ANCHOR_DIR),
            bundle_path: PathBuf::from(RHEL_BUNDLE),
            update_command: vec!["update-ca-trust".to_string(), "extract".to_string()],
        }
    }

    /// Pick the layout whose anchor directory exists on this machine.
    fn probe() -> Option<Self> {
        [Self::debian(), Self::rhel()]
            .into_iter()
            .find(|layout| layout.anchor_dir.is_dir())
    }
}

/// The distribution CA anchor directory plus its compiled bundle.
#[derive(Debug)]
pub struct LinuxSystemStore {
    target: TrustStoreTarget,
    layout: Option<StoreLayout>,
}

impl LinuxSystemStore {
    /// Probe the running system for a supported trust store layout.
    /// Elevation is decided here, once, by whether the anchor
    /// directory is writable by the current user.
    #[must_use]
    pub fn discover() -> Self {
        let layout = StoreLayout::probe();
        let requires_elevation = layout
            .as_ref()
            .is_some_and(|l| !dir_is_writable(&l.anchor_dir));
        if let Some(l) = &layout {
            debug!(
                anchor_dir = %l.anchor_dir.display(),
                requires_elevation,
                "resolved linux trust store layout"
            );
        }
        Self {
            target: TrustStoreTarget::system(Platform::Linux, requires_elevation),
            layout,
        }
    }

    fn store_name(&self) -> String {
        self.target.description()
    }

    fn layout(&self) -> Result<&StoreLayout> {
        self.layout.as_ref().ok_or_else(|| TrustError::StoreUnavailable {
            store: self.store_name(),
            reason: "no ca-certificates anchor directory found".to_string(),
        })
    }

    fn anchor_path(&self, identity: &CertIdentity) -> Result<PathBuf> {
        let layout = self.layout()?;
        Ok(layout.anchor_dir.join(anchor_file_name(&identity.nickname)))
    }

    /// Whether the compiled bundle contains a certificate with this
    /// SHA-256. A missing bundle reads as empty; the update tool has
    /// simply never run.
    async fn bundle_contains(&self, identity: &CertIdentity) -> Result<bool> {
        let layout = self.layout()?;
        let bytes = match tokio::fs::read(&layout.bundle_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(TrustError::Io(e)),
        };
        match pem::parse_many(&bytes) {
            Ok(blocks) => Ok(blocks
                .iter()
                .filter(|b| b.tag() == "CERTIFICATE")
                .any(|b| sha256_bytes(b.contents()) == identity.sha256)),
            Err(e) => {
                warn!(
                    bundle = %layout.bundle_path.display(),
                    error = %e,
                    "ca bundle did not parse as PEM"
                );
                Ok(false)
            }
        }
    }

    /// Whether our anchor file exists and actually holds this
    /// certificate. A file with someone else's content, or unparseable
    /// content, does not count.
    async fn anchor_matches(&self, identity: &CertIdentity) -> Result<bool> {
        let path = self.anchor_path(identity)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(TrustError::Io(e)),
        };
        match CaCertificate::from_bytes(&bytes) {
            Ok(cert) => Ok(cert.sha256 == identity.sha256),
            Err(e) => {
                warn!(
                    anchor = %path.display(),
                    error = %e,
                    "anchor file did not parse as a certificate"
                );
                Ok(false)
            }
        }
    }

    async fn run_update(&self) -> Result<()> {
        let layout = self.layout()?;
        let Some((program, args)) = layout.update_command.split_first() else {
            return Ok(());
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = run_tool(&self.store_name(), program, &args).await?;
        if out.success {
            Ok(())
        } else if out.mentions_any(&["permission denied", "read-only"]) {
            Err(TrustError::PermissionDenied {
                action: "rebuild the system CA bundle".to_string(),
            })
        } else {
            Err(out.into_error(program))
        }
    }
}

#[async_trait]
impl TrustBackend for LinuxSystemStore {
    fn target(&self) -> &TrustStoreTarget {
        &self.target
    }

    async fn query(&self, identity: &CertIdentity) -> Result<TrustState> {
        if self.bundle_contains(identity).await? {
            return Ok(TrustState::Trusted);
        }
        if self.anchor_matches(identity).await? {
            // Anchor staged but the bundle was never rebuilt
            return Ok(TrustState::PresentButUntrusted);
        }
        Ok(TrustState::NotPresent)
    }

    async fn install(
        &self,
        cert: &CaCertificate,
        identity: &CertIdentity,
        _pem_path: &Path,
    ) -> Result<()> {
        let anchor = self.anchor_path(identity)?;
        if self.target.requires_elevation {
            return Err(TrustError::PermissionDenied {
                action: format!("write {}", anchor.display()),
            });
        }

        // Write-then-rename keeps the update tool from ever seeing a
        // half-written anchor
        let tmp = anchor.with_extension("crt.tmp");
        tokio::fs::write(&tmp, cert.pem_string())
            .await
            .map_err(|e| map_write_error(e, &anchor))?;
        tokio::fs::rename(&tmp, &anchor)
            .await
            .map_err(|e| map_write_error(e, &anchor))?;

        self.run_update().await?;

        let state = self.query(identity).await?;
        if state.is_trusted() {
            info!(anchor = %anchor.display(), subject = %cert.subject, "certificate trusted in system bundle");
            Ok(())
        } else {
            Err(TrustError::CommandFailed {
                program: self
                    .layout()?
                    .update_command
                    .first()
                    .cloned()
                    .unwrap_or_default(),
                code: None,
                stderr: format!("certificate missing from system bundle after update ({state})"),
            })
        }
    }

    async fn uninstall(&self, identity: &CertIdentity) -> Result<()> {
        if self.layout.is_none() {
            // Nothing to remove from on a machine with no store
            return Ok(());
        }
        if self.query(identity).await? == TrustState::NotPresent {
            return Ok(());
        }

        let anchor = self.anchor_path(identity)?;
        if self.target.requires_elevation {
            return Err(TrustError::PermissionDenied {
                action: format!("remove {}", anchor.display()),
            });
        }

        match tokio::fs::remove_file(&anchor).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(map_write_error(e, &anchor)),
        }

        self.run_update().await?;

        match self.query(identity).await? {
            TrustState::NotPresent => Ok(()),
            state => Err(TrustError::CommandFailed {
                program: self
                    .layout()?
                    .update_command
                    .first()
                    .cloned()
                    .unwrap_or_default(),
                code: None,
                stderr: format!(
                    "certificate still {state} after update; another anchor may provide it"
                ),
            }),
        }
    }
}

/// Anchor file name derived from the certificate nickname: lowercase,
/// runs of non-alphanumerics collapsed to single dashes.
fn anchor_file_name(nickname: &str) -> String {
    let mut stem = String::with_capacity(nickname.len());
    let mut last_dash = true;
    for c in nickname.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            stem.push('-');
            last_dash = true;
        }
    }
    let stem = stem.trim_end_matches('-');
    if stem.is_empty() {
        "local-root-ca.crt".to_string()
    } else {
        format!("{stem}.crt")
    }
}

fn dir_is_writable(dir: &Path) -> bool {
    let probe = dir.join(format!(".rootanchor-probe-{}", std::process::id()));
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

fn map_write_error(e: std::io::Error, path: &Path) -> TrustError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        TrustError::PermissionDenied {
            action: format!("write {}", path.display()),
        }
    } else {
        TrustError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fixture_cert, OTHER_PEM};

    fn store_with(dir: &Path, update: &[&str]) -> LinuxSystemStore {
        LinuxSystemStore {
            target: TrustStoreTarget::system(Platform::Linux, false),
            layout: Some(StoreLayout {
                anchor_dir: dir.join("anchors"),
                bundle_path: dir.join("bundle.pem"),
                update_command: update.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    /// Update command that rebuilds the bundle by concatenating every
    /// anchor, the way the distribution tools do.
    fn rebuild_cmd(dir: &Path) -> Vec<String> {
        let anchors = dir.join("anchors").display().to_string();
        let bundle = dir.join("bundle.pem").display().to_string();
        vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("cat {anchors}/*.crt > {bundle} 2>/dev/null || : > {bundle}"),
        ]
    }

    fn store_with_rebuild(dir: &Path) -> LinuxSystemStore {
        let update = rebuild_cmd(dir);
        let update: Vec<&str> = update.iter().map(String::as_str).collect();
        store_with(dir, &update)
    }

    #[test]
    fn anchor_names_are_sanitized() {
        assert_eq!(anchor_file_name("Rootanchor Development CA"), "rootanchor-development-ca.crt");
        assert_eq!(anchor_file_name("proxy_root (dev)"), "proxy-root-dev.crt");
        assert_eq!(anchor_file_name("---"), "local-root-ca.crt");
        assert_eq!(anchor_file_name("Simple"), "simple.crt");
    }

    #[test]
    fn writable_tempdir_needs_no_elevation() {
        let dir = tempfile::tempdir().unwrap();
        assert!(dir_is_writable(dir.path()));
    }

    #[test]
    fn missing_layout_reads_as_unavailable() {
        let store = LinuxSystemStore {
            target: TrustStoreTarget::system(Platform::Linux, false),
            layout: None,
        };
        let err = store.layout().unwrap_err();
        assert!(matches!(err, TrustError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn query_on_empty_store_is_not_present() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("anchors")).await.unwrap();
        let store = store_with(dir.path(), &["true"]);
        let state = store.query(&fixture_cert().identity()).await.unwrap();
        assert_eq!(state, TrustState::NotPresent);
    }

    #[tokio::test]
    async fn query_finds_certificate_in_bundle() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("anchors")).await.unwrap();
        let cert = fixture_cert();
        // Bundle with an unrelated certificate first, ours second
        let bundle = format!("{OTHER_PEM}{}", cert.pem_string());
        tokio::fs::write(dir.path().join("bundle.pem"), bundle).await.unwrap();

        let store = store_with(dir.path(), &["true"]);
        let state = store.query(&cert.identity()).await.unwrap();
        assert_eq!(state, TrustState::Trusted);
    }

    #[tokio::test]
    async fn staged_anchor_without_update_is_present_but_untrusted() {
        let dir = tempfile::tempdir().unwrap();
        let anchors = dir.path().join("anchors");
        tokio::fs::create_dir(&anchors).await.unwrap();
        let cert = fixture_cert();
        let identity = cert.identity();
        tokio::fs::write(anchors.join(anchor_file_name(&identity.nickname)), cert.pem_string())
            .await
            .unwrap();

        let store = store_with(dir.path(), &["true"]);
        let state = store.query(&identity).await.unwrap();
        assert_eq!(state, TrustState::PresentButUntrusted);
    }

    #[tokio::test]
    async fn anchor_holding_a_different_certificate_does_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let anchors = dir.path().join("anchors");
        tokio::fs::create_dir(&anchors).await.unwrap();
        let identity = fixture_cert().identity();
        tokio::fs::write(anchors.join(anchor_file_name(&identity.nickname)), OTHER_PEM)
            .await
            .unwrap();

        let store = store_with(dir.path(), &["true"]);
        let state = store.query(&identity).await.unwrap();
        assert_eq!(state, TrustState::NotPresent);
    }

    #[tokio::test]
    async fn garbage_anchor_reads_as_not_present() {
        let dir = tempfile::tempdir().unwrap();
        let anchors = dir.path().join("anchors");
        tokio::fs::create_dir(&anchors).await.unwrap();
        let identity = fixture_cert().identity();
        tokio::fs::write(anchors.join(anchor_file_name(&identity.nickname)), "not a pem")
            .await
            .unwrap();

        let store = store_with(dir.path(), &["true"]);
        let state = store.query(&identity).await.unwrap();
        assert_eq!(state, TrustState::NotPresent);
    }

    #[tokio::test]
    async fn install_writes_anchor_runs_update_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("anchors")).await.unwrap();
        let store = store_with_rebuild(dir.path());
        let cert = fixture_cert();
        let identity = cert.identity();

        store
            .install(&cert, &identity, Path::new("/unused.pem"))
            .await
            .unwrap();

        let anchor = dir
            .path()
            .join("anchors")
            .join(anchor_file_name(&identity.nickname));
        assert!(anchor.exists());
        assert_eq!(store.query(&identity).await.unwrap(), TrustState::Trusted);
    }

    #[tokio::test]
    async fn install_fails_when_update_does_not_pick_up_the_anchor() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("anchors")).await.unwrap();
        // Update tool that silently does nothing
        let store = store_with(dir.path(), &["true"]);
        let cert = fixture_cert();
        let identity = cert.identity();

        let err = store
            .install(&cert, &identity, Path::new("/unused.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrustError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn install_without_privileges_fails_before_touching_the_store() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("anchors")).await.unwrap();
        let mut store = store_with(dir.path(), &["false"]);
        store.target = TrustStoreTarget::system(Platform::Linux, true);
        let cert = fixture_cert();
        let identity = cert.identity();

        let err = store
            .install(&cert, &identity, Path::new("/unused.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrustError::PermissionDenied { .. }));
        let anchor = dir
            .path()
            .join("anchors")
            .join(anchor_file_name(&identity.nickname));
        assert!(!anchor.exists());
    }

    #[tokio::test]
    async fn uninstall_of_absent_certificate_skips_the_update_tool() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("anchors")).await.unwrap();
        // An update command that would fail the test if it ever ran
        let store = store_with(dir.path(), &["false"]);

        store.uninstall(&fixture_cert().identity()).await.unwrap();
    }

    #[tokio::test]
    async fn uninstall_removes_anchor_and_rebuilds_bundle() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("anchors")).await.unwrap();
        let store = store_with_rebuild(dir.path());
        let cert = fixture_cert();
        let identity = cert.identity();
        store
            .install(&cert, &identity, Path::new("/unused.pem"))
            .await
            .unwrap();

        store.uninstall(&identity).await.unwrap();

        assert_eq!(store.query(&identity).await.unwrap(), TrustState::NotPresent);
        let anchor = dir
            .path()
            .join("anchors")
            .join(anchor_file_name(&identity.nickname));
        assert!(!anchor.exists());
    }

    #[tokio::test]
    async fn uninstall_leaves_unrelated_anchors_alone() {
        let dir = tempfile::tempdir().unwrap();
        let anchors = dir.path().join("anchors");
        tokio::fs::create_dir(&anchors).await.unwrap();
        tokio::fs::write(anchors.join("example-widgets-root.crt"), OTHER_PEM)
            .await
            .unwrap();
        let store = store_with_rebuild(dir.path());
        let cert = fixture_cert();
        let identity = cert.identity();
        store
            .install(&cert, &identity, Path::new("/unused.pem"))
            .await
            .unwrap();

        store.uninstall(&identity).await.unwrap();

        let other = CaCertificate::from_bytes(OTHER_PEM.as_bytes()).unwrap();
        assert_eq!(
            store.query(&other.identity()).await.unwrap(),
            TrustState::Trusted
        );
        assert_eq!(store.query(&identity).await.unwrap(), TrustState::NotPresent);
    }

    #[tokio::test]
    async fn uninstall_on_machine_without_store_succeeds() {
        let store = LinuxSystemStore {
            target: TrustStoreTarget::system(Platform::Linux, false),
            layout: None,
        };
        store.uninstall(&fixture_cert().identity()).await.unwrap();
    }
}
