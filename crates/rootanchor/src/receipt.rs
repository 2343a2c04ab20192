//! Install receipts.
//!
//! A successful install records what was installed and where, so a
//! later uninstall can find the certificate by fingerprint without
//! the original file. The receipt lives in the per-user data
//! directory next to a staged copy of the PEM; losing both simply
//! means uninstall has nothing to do.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TrustError};
use crate::types::{CaCertificate, CertIdentity};

const RECEIPT_FILE: &str = "install.json";
const STAGED_CERT_FILE: &str = "staged-ca.pem";

/// What one install put where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRecord {
    /// Identity of the installed certificate
    pub identity: CertIdentity,
    /// File the certificate was loaded from, if any
    pub source: Option<PathBuf>,
    /// When the install completed
    pub installed_at: DateTime<Utc>,
    /// Target ids that reported success
    pub targets: Vec<String>,
}

impl InstallRecord {
    #[must_use]
    pub fn new(cert: &CaCertificate, identity: CertIdentity, targets: Vec<String>) -> Self {
        Self {
            identity,
            source: cert.source.clone(),
            installed_at: Utc::now(),
            targets,
        }
    }
}

/// Reads and writes the receipt in a fixed directory.
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    dir: PathBuf,
}

impl ReceiptStore {
    /// The per-user receipt location.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::StoreUnavailable` when no home directory
    /// can be resolved.
    pub fn new() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("dev", "rootanchor", "rootanchor").ok_or_else(
            || TrustError::StoreUnavailable {
                store: "install receipt".to_string(),
                reason: "no home directory for the current user".to_string(),
            },
        )?;
        Ok(Self::at(dirs.data_local_dir()))
    }

    /// A receipt store rooted at an explicit directory.
    #[must_use]
    pub fn at(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn receipt_path(&self) -> PathBuf {
        self.dir.join(RECEIPT_FILE)
    }

    /// Load the receipt. Absent and unreadable receipts both read as
    /// `None`; a corrupt receipt must not wedge uninstall forever.
    pub async fn load(&self) -> Result<Option<InstallRecord>> {
        let path = self.receipt_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TrustError::Io(e)),
        };
        match serde_json::from_slice::<InstallRecord>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable install receipt");
                Ok(None)
            }
        }
    }

    /// Persist the receipt, replacing any previous one.
    pub async fn save(&self, record: &InstallRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.receipt_path();
        let tmp = self.dir.join(format!("{RECEIPT_FILE}.tmp"));
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), targets = record.targets.len(), "saved install receipt");
        Ok(())
    }

    /// Write a PEM copy of the certificate next to the receipt and
    /// return its path, for store tools that want a file argument.
    pub async fn stage_cert(&self, cert: &CaCertificate) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(STAGED_CERT_FILE);
        tokio::fs::write(&path, cert.pem_string()).await?;
        Ok(path)
    }

    /// Remove the receipt and the staged certificate. Absence of
    /// either is not an error.
    pub async fn clear(&self) -> Result<()> {
        for name in [RECEIPT_FILE, STAGED_CERT_FILE] {
            match tokio::fs::remove_file(self.dir.join(name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(TrustError::Io(e)),
            }
        }
        debug!(dir = %self.dir.display(), "cleared install receipt");
        Ok(())
    }
}
