//! NSS certificate database backend via the `certutil` tool.
//!
//! Firefox and Linux Chromium builds ignore the system store and keep
//! their own NSS databases, one per profile. All access goes through
//! the NSS `certutil` binary; there is no stable on-disk format to
//! write directly. Windows ships an unrelated `certutil.exe`, so every
//! candidate binary is validated against its own usage text before it
//! is trusted to touch a database.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cmd::run_tool;
use crate::error::{Result, TrustError};
use crate::hash::sha256_bytes;
use crate::platform::Platform;
use crate::stores::TrustBackend;
use crate::types::{BrowserFamily, CaCertificate, CertIdentity, NssProfile, TrustState, TrustStoreTarget};

/// Trust attribute string for a TLS server CA.
const CA_TRUST_ATTRS: &str = "C,,";

/// Homebrew installs NSS outside the default PATH.
const MAC_CERTUTIL_CANDIDATES: &[&str] = &[
    "/opt/homebrew/opt/nss/bin/certutil",
    "/usr/local/opt/nss/bin/certutil",
];

/// One NSS certificate database directory.
#[derive(Debug)]
pub struct NssStore {
    target: TrustStoreTarget,
    profile: NssProfile,
}

impl NssStore {
    #[must_use]
    pub fn new(family: BrowserFamily, profile: NssProfile) -> Self {
        Self {
            target: TrustStoreTarget::nss(family, profile.directory.clone(), profile.kind),
            profile,
        }
    }

    fn store_name(&self) -> String {
        self.target.description()
    }

    fn db_uri(&self) -> String {
        self.profile.db_uri()
    }

    /// Find an NSS `certutil`, skipping binaries whose usage text does
    /// not speak NSS (the Windows system `certutil.exe` in particular).
    async fn locate_certutil(&self) -> Result<String> {
        let mut candidates = vec!["certutil".to_string()];
        if Platform::detect() == Platform::MacOs {
            candidates.extend(MAC_CERTUTIL_CANDIDATES.iter().map(ToString::to_string));
        }

        for candidate in candidates {
            match run_tool(&self.store_name(), &candidate, &["-H"]).await {
                Ok(out) if looks_like_nss_certutil(&out.stdout, &out.stderr) => {
                    debug!(certutil = %candidate, "resolved NSS certutil");
                    return Ok(candidate);
                }
                Ok(_) => {
                    debug!(certutil = %candidate, "binary is not NSS certutil, skipping");
                }
                Err(TrustError::StoreUnavailable { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        Err(TrustError::StoreUnavailable {
            store: self.store_name(),
            reason: "certutil not found; install nss tools (libnss3-tools on Debian/Ubuntu, \
                     nss on Fedora or Homebrew)"
                .to_string(),
        })
    }

    /// Trust attribute strings for every database entry under this
    /// nickname. Empty when the nickname is not listed.
    async fn list_trust_attrs(&self, certutil: &str, nickname: &str) -> Result<Vec<String>> {
        let uri = self.db_uri();
        let out = run_tool(&self.store_name(), certutil, &["-L", "-d", &uri]).await?;
        if !out.success {
            return Err(out.into_error(certutil));
        }
        Ok(parse_listing(&out.stdout, nickname))
    }

    /// Whether the certificate stored under the nickname really is
    /// ours. NSS nicknames are first come first served; a colliding
    /// entry from some other tool must not be repaired or deleted.
    async fn nickname_holds_our_cert(
        &self,
        certutil: &str,
        identity: &CertIdentity,
    ) -> Result<bool> {
        let uri = self.db_uri();
        let out = run_tool(
            &self.store_name(),
            certutil,
            &["-L", "-d", &uri, "-n", &identity.nickname, "-a"],
        )
        .await?;
        if !out.success {
            if out.mentions_any(&["could not find", "not found"]) {
                return Ok(false);
            }
            return Err(out.into_error(certutil));
        }
        Ok(dump_contains(out.stdout.as_bytes(), &identity.sha256))
    }
}

#[async_trait]
impl TrustBackend for NssStore {
    fn target(&self) -> &TrustStoreTarget {
        &self.target
    }

    async fn query(&self, identity: &CertIdentity) -> Result<TrustState> {
        let certutil = self.locate_certutil().await?;

        let attrs = self.list_trust_attrs(&certutil, &identity.nickname).await?;
        if attrs.is_empty() {
            return Ok(TrustState::NotPresent);
        }
        if !self.nickname_holds_our_cert(&certutil, identity).await? {
            warn!(
                nickname = %identity.nickname,
                database = %self.db_uri(),
                "nickname is taken by a different certificate"
            );
            return Ok(TrustState::NotPresent);
        }
        if attrs.iter().any(|a| ssl_slot_trusted(a)) {
            Ok(TrustState::Trusted)
        } else {
            Ok(TrustState::PresentButUntrusted)
        }
    }

    async fn install(
        &self,
        cert: &CaCertificate,
        identity: &CertIdentity,
        pem_path: &Path,
    ) -> Result<()> {
        let certutil = self.locate_certutil().await?;
        let uri = self.db_uri();

        match self.query(identity).await? {
            TrustState::Trusted => return Ok(()),
            TrustState::PresentButUntrusted => {
                // Present without the CA flag: repair trust in place
                let out = run_tool(
                    &self.store_name(),
                    &certutil,
                    &["-M", "-d", &uri, "-n", &identity.nickname, "-t", CA_TRUST_ATTRS],
                )
                .await?;
                if !out.success {
                    return Err(out.into_error(&certutil));
                }
            }
            TrustState::NotPresent | TrustState::QueryFailed(_) => {
                let pem = pem_path.display().to_string();
                let out = run_tool(
                    &self.store_name(),
                    &certutil,
                    &[
                        "-A",
                        "-d",
                        &uri,
                        "-t",
                        CA_TRUST_ATTRS,
                        "-n",
                        &identity.nickname,
                        "-i",
                        &pem,
                    ],
                )
                .await?;
                if !out.success {
                    return Err(out.into_error(&certutil));
                }
            }
        }

        let state = self.query(identity).await?;
        if state.is_trusted() {
            info!(database = %uri, subject = %cert.subject, "certificate trusted in NSS database");
            Ok(())
        } else {
            Err(TrustError::CommandFailed {
                program: certutil,
                code: None,
                stderr: format!("post-install verification reported: {state}"),
            })
        }
    }

    async fn uninstall(&self, identity: &CertIdentity) -> Result<()> {
        let certutil = self.locate_certutil().await?;
        let uri = self.db_uri();

        // Fingerprint check doubles as idempotence: absent or a
        // colliding nickname both mean nothing of ours to delete
        if self.query(identity).await? == TrustState::NotPresent {
            return Ok(());
        }

        let out = run_tool(
            &self.store_name(),
            &certutil,
            &["-D", "-d", &uri, "-n", &identity.nickname],
        )
        .await?;
        if !out.success && !out.mentions_any(&["could not find", "not found"]) {
            return Err(out.into_error(&certutil));
        }

        match self.query(identity).await? {
            TrustState::NotPresent => Ok(()),
            state => Err(TrustError::CommandFailed {
                program: certutil,
                code: None,
                stderr: format!("certificate still {state} after deletion"),
            }),
        }
    }
}

/// NSS certutil usage text names the database directory flag; the
/// Windows system certutil does not.
fn looks_like_nss_certutil(stdout: &str, stderr: &str) -> bool {
    stdout.contains("certdir") || stderr.contains("certdir")
}

/// Extract trust attribute columns from `certutil -L` output for one
/// nickname. Nicknames may contain spaces, so the line is matched by
/// prefix and the trailer must be a trust-attribute triple; anything
/// else means the line belongs to a longer nickname.
fn parse_listing(listing: &str, nickname: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix(nickname)?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let attrs = rest.trim();
            is_trust_attrs(attrs).then(|| attrs.to_string())
        })
        .collect()
}

/// A trust-attribute triple like `CT,C,C` or `,,`: three comma-separated
/// flag groups and nothing else.
fn is_trust_attrs(attrs: &str) -> bool {
    attrs.matches(',').count() == 2
        && attrs.chars().all(|c| c == ',' || c.is_ascii_alphabetic())
}

/// Whether the SSL slot (first comma group) carries the CA trust flag.
fn ssl_slot_trusted(attrs: &str) -> bool {
    attrs
        .split(',')
        .next()
        .is_some_and(|slot| slot.contains('C'))
}

/// Whether a PEM dump contains a certificate with this SHA-256.
fn dump_contains(dump: &[u8], sha256: &str) -> bool {
    pem::parse_many(dump).is_ok_and(|blocks| {
        blocks
            .iter()
            .filter(|b| b.tag() == "CERTIFICATE")
            .any(|b| sha256_bytes(b.contents()) == sha256)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FIXTURE_PEM, FIXTURE_SHA256, OTHER_PEM};
    use crate::types::NssDbKind;
    use std::path::PathBuf;

    const LISTING: &str = "\
Certificate Nickname                                         Trust Attributes
                                                             SSL,S/MIME,JAR/XPI

Rootanchor Development CA                                    C,,
DigiCert Global Root CA                                      CT,C,C
imported logins cert                                         u,u,u
Staged Only                                                  ,,
";

    #[test]
    fn listing_parses_nicknames_with_spaces() {
        assert_eq!(
            parse_listing(LISTING, "Rootanchor Development CA"),
            vec!["C,,".to_string()]
        );
        assert_eq!(
            parse_listing(LISTING, "DigiCert Global Root CA"),
            vec!["CT,C,C".to_string()]
        );
        assert!(parse_listing(LISTING, "Absent CA").is_empty());
    }

    #[test]
    fn listing_prefix_of_a_longer_nickname_does_not_match() {
        // "Staged" alone must not match the "Staged Only" entry
        assert!(parse_listing(LISTING, "Staged").is_empty());
        assert_eq!(
            parse_listing(LISTING, "Staged Only"),
            vec![",,".to_string()]
        );
    }

    #[test]
    fn ssl_slot_flag_detection() {
        assert!(ssl_slot_trusted("C,,"));
        assert!(ssl_slot_trusted("CT,C,C"));
        assert!(!ssl_slot_trusted(",,"));
        assert!(!ssl_slot_trusted("u,u,u"));
        assert!(!ssl_slot_trusted("c,,"));
    }

    #[test]
    fn dump_fingerprint_matching() {
        assert!(dump_contains(FIXTURE_PEM.as_bytes(), FIXTURE_SHA256));
        assert!(!dump_contains(OTHER_PEM.as_bytes(), FIXTURE_SHA256));
        let bundle = format!("{OTHER_PEM}{FIXTURE_PEM}");
        assert!(dump_contains(bundle.as_bytes(), FIXTURE_SHA256));
        assert!(!dump_contains(b"not pem", FIXTURE_SHA256));
    }

    #[test]
    fn nss_usage_text_recognition() {
        assert!(looks_like_nss_certutil(
            "",
            "-d certdir        Cert database directory"
        ));
        // Windows system certutil talks about stores, not certdir
        assert!(!looks_like_nss_certutil("CertUtil: -dump", ""));
    }

    #[test]
    fn target_identity_reflects_profile() {
        let store = NssStore::new(
            BrowserFamily::Firefox,
            NssProfile {
                directory: PathBuf::from("/home/u/.mozilla/firefox/ab12.default"),
                kind: NssDbKind::Sql,
            },
        );
        assert_eq!(store.target().id(), "nss:firefox:/home/u/.mozilla/firefox/ab12.default");
        assert!(!store.target().is_system());
        assert!(store.target().restart_sensitive());
        assert_eq!(store.db_uri(), "sql:/home/u/.mozilla/firefox/ab12.default");
    }
}
