//! Multi-store trust reconciliation.
//!
//! The coordinator turns one requested operation into per-store work:
//! resolve the target set for this machine, run the operation against
//! each store in isolation, and aggregate the results. One broken
//! store never stops the others; the outcome reports exactly which
//! targets succeeded. Target resolution is repeated on every call
//! because browsers, profiles, and privileges change between runs.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::detect;
use crate::error::{Result, TrustError};
use crate::guard::{self, ProcessGuard};
use crate::platform::Platform;
use crate::receipt::{InstallRecord, ReceiptStore};
use crate::stores::{resolve_backends, TrustBackend};
use crate::types::{
    BrowserFamily, BrowserProfile, CaCertificate, CertIdentity, ExpiryStatus, OperationKind,
    OperationOutcome, TargetReport, TrustMechanism, TrustState, TrustStoreTarget,
};

/// Knobs for one coordinator instance.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Budget for each store operation, query included.
    pub per_target_timeout: Duration,
    /// Proceed against stores whose owning browser is running,
    /// reporting a restart hint instead of refusing.
    pub force: bool,
    /// Override for the NSS nickname and anchor file name.
    pub nickname: Option<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            per_target_timeout: Duration::from_secs(30),
            force: false,
            nickname: None,
        }
    }
}

/// Per-target view returned by status queries.
#[derive(Debug, Clone, Serialize)]
pub struct TargetState {
    pub target_id: String,
    pub description: String,
    pub state: TrustState,
}

/// Full trust picture for one certificate across every target.
#[derive(Debug, Clone, Serialize)]
pub struct TrustReport {
    pub identity: CertIdentity,
    pub overall: TrustState,
    pub targets: Vec<TargetState>,
    pub browser: String,
    pub expiry: Option<ExpiryReport>,
}

/// Validity window summary for a certificate file.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiryReport {
    pub common_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub status: ExpiryStatus,
    pub days_remaining: i64,
}

impl ExpiryReport {
    fn of(cert: &CaCertificate) -> Self {
        let now = Utc::now();
        Self {
            common_name: cert.common_name.clone(),
            not_before: cert.not_before,
            not_after: cert.not_after,
            status: cert.expiry_status_at(now),
            days_remaining: (cert.not_after - now).num_days(),
        }
    }
}

/// Default browser findings plus what they mean for trust operations.
#[derive(Debug, Clone, Serialize)]
pub struct BrowserReport {
    pub profile: BrowserProfile,
    pub running_process: Option<String>,
    pub guidance: Vec<String>,
}

/// Drives install, uninstall, and query across all resolved stores.
#[derive(Debug)]
pub struct TrustCoordinator {
    platform: Platform,
    config: CoordinatorConfig,
    receipts: ReceiptStore,
}

impl TrustCoordinator {
    /// Coordinator with default configuration.
    ///
    /// # Errors
    ///
    /// Fails when the per-user receipt directory cannot be resolved.
    pub fn new() -> Result<Self> {
        Self::with_config(CoordinatorConfig::default())
    }

    /// Coordinator with explicit configuration.
    ///
    /// # Errors
    ///
    /// Fails when the per-user receipt directory cannot be resolved.
    pub fn with_config(config: CoordinatorConfig) -> Result<Self> {
        Ok(Self {
            platform: Platform::detect(),
            config,
            receipts: ReceiptStore::new()?,
        })
    }

    #[cfg(test)]
    fn for_tests(platform: Platform, config: CoordinatorConfig, receipt_dir: &Path) -> Self {
        Self {
            platform,
            config,
            receipts: ReceiptStore::at(receipt_dir),
        }
    }

    /// Install a CA certificate into every applicable trust store.
    ///
    /// Stores that already trust it are reported as successes without
    /// being touched. A receipt is written unless every store failed.
    ///
    /// # Errors
    ///
    /// Fails before touching any store when the platform is
    /// unsupported or the certificate cannot be loaded; per-store
    /// trouble lands in the outcome instead.
    pub async fn install(&self, cert_path: &Path) -> Result<OperationOutcome> {
        self.ensure_supported()?;
        let cert = CaCertificate::load(cert_path).await?;
        let identity = self.effective_identity(&cert);
        info!(subject = %cert.subject, sha256 = %cert.sha256, "installing CA certificate");

        let browser = detect::detect_default_browser().await;
        let backends = resolve_backends(self.platform, &browser);
        let pem_path = self.receipts.stage_cert(&cert).await?;
        let conflicts = self.probe_conflicts(&browser, OperationKind::Install, &backends);

        let outcome = self
            .apply_install(&backends, &conflicts, &cert, &identity, &pem_path)
            .await;

        if !outcome.succeeded() {
            warn!(operation = %outcome.operation, "no store accepted the certificate");
        }
        if outcome.targets.iter().any(|t| t.succeeded) {
            let installed: Vec<String> = outcome
                .targets
                .iter()
                .filter(|t| t.succeeded)
                .map(|t| t.target_id.clone())
                .collect();
            let record = InstallRecord::new(&cert, identity, installed);
            if let Err(e) = self.receipts.save(&record).await {
                warn!(error = %e, "install succeeded but the receipt could not be saved");
            }
        }
        Ok(outcome)
    }

    /// Uninstall whatever the last install receipt recorded.
    ///
    /// With no receipt there is nothing to undo and the outcome is an
    /// empty success. The receipt is cleared once every store reports
    /// the certificate gone.
    ///
    /// # Errors
    ///
    /// Fails only on unsupported platforms or an unreadable receipt
    /// directory.
    pub async fn uninstall(&self) -> Result<OperationOutcome> {
        let Some(record) = self.receipts.load().await? else {
            debug!("no install receipt; nothing to uninstall");
            return Ok(OperationOutcome::from_reports(
                OperationKind::Uninstall,
                Vec::new(),
            ));
        };
        self.ensure_supported()?;
        let identity = self.override_nickname(record.identity.clone());

        let outcome = self.uninstall_identity(&identity).await;
        if outcome.succeeded() {
            if let Err(e) = self.receipts.clear().await {
                warn!(error = %e, "uninstall succeeded but the receipt could not be cleared");
            }
        }
        Ok(outcome)
    }

    /// Uninstall the certificate held in a file, receipt or not.
    ///
    /// # Errors
    ///
    /// Fails when the platform is unsupported or the file cannot be
    /// loaded.
    pub async fn uninstall_file(&self, cert_path: &Path) -> Result<OperationOutcome> {
        self.ensure_supported()?;
        let cert = CaCertificate::load(cert_path).await?;
        let identity = self.effective_identity(&cert);

        let outcome = self.uninstall_identity(&identity).await;
        if outcome.succeeded() {
            match self.receipts.load().await {
                Ok(Some(record)) if record.identity.sha256 == identity.sha256 => {
                    if let Err(e) = self.receipts.clear().await {
                        warn!(error = %e, "receipt could not be cleared");
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "receipt could not be read"),
            }
        }
        Ok(outcome)
    }

    async fn uninstall_identity(&self, identity: &CertIdentity) -> OperationOutcome {
        info!(nickname = %identity.nickname, sha256 = %identity.sha256, "removing CA certificate");
        let browser = detect::detect_default_browser().await;
        let backends = resolve_backends(self.platform, &browser);
        let conflicts = self.probe_conflicts(&browser, OperationKind::Uninstall, &backends);
        self.apply_uninstall(&backends, &conflicts, identity).await
    }

    /// Query the trust state of a certificate across every target.
    ///
    /// The identity comes from `cert_path` when given, otherwise from
    /// the install receipt.
    ///
    /// # Errors
    ///
    /// Fails when no identity source is available or the platform is
    /// unsupported.
    pub async fn status(&self, cert_path: Option<&Path>) -> Result<TrustReport> {
        self.ensure_supported()?;
        let (identity, expiry) = match cert_path {
            Some(path) => {
                let cert = CaCertificate::load(path).await?;
                let expiry = ExpiryReport::of(&cert);
                (self.effective_identity(&cert), Some(expiry))
            }
            None => {
                let record =
                    self.receipts
                        .load()
                        .await?
                        .ok_or_else(|| TrustError::NotFound {
                            what: "install receipt; pass a certificate file to query".to_string(),
                        })?;
                (self.override_nickname(record.identity), None)
            }
        };

        let browser = detect::detect_default_browser().await;
        let backends = resolve_backends(self.platform, &browser);
        let (overall, targets) = self.apply_status(&backends, &identity).await;
        Ok(TrustReport {
            identity,
            overall,
            targets,
            browser: browser.name,
            expiry,
        })
    }

    /// Validity window of a certificate file. Touches no store.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be loaded.
    pub async fn expiration(&self, cert_path: &Path) -> Result<ExpiryReport> {
        let cert = CaCertificate::load(cert_path).await?;
        Ok(ExpiryReport::of(&cert))
    }

    /// Detect the default browser and whether it is running.
    pub async fn browser_report(&self) -> BrowserReport {
        let profile = detect::detect_default_browser().await;
        let guard = ProcessGuard::snapshot();
        let running_process = guard.conflicting_process(profile.family, self.platform);
        let guidance = guidance_for(&profile);
        BrowserReport {
            profile,
            running_process,
            guidance,
        }
    }

    // === Per-target machinery ===

    async fn apply_install(
        &self,
        backends: &[Box<dyn TrustBackend>],
        conflicts: &HashMap<BrowserFamily, String>,
        cert: &CaCertificate,
        identity: &CertIdentity,
        pem_path: &Path,
    ) -> OperationOutcome {
        let mut reports = Vec::with_capacity(backends.len());
        for backend in backends {
            let target = backend.target();

            let lock = store_lock(&target.id());
            let _held = lock.lock().await;

            // Idempotence first: a store that already trusts the
            // certificate needs no mutation, so a running browser is
            // no obstacle either
            if let Ok(TrustState::Trusted) = self.with_timeout(backend.query(identity)).await {
                debug!(target = %target.id(), "already trusted, leaving untouched");
                reports.push(TargetReport::success(target, "already trusted"));
                continue;
            }

            let forced_conflict = match conflict_for(target, conflicts) {
                Some(process) if !self.config.force => {
                    reports.push(TargetReport::failure(
                        target,
                        &TrustError::ProcessConflict { process },
                    ));
                    continue;
                }
                other => other,
            };

            match self
                .with_timeout(backend.install(cert, identity, pem_path))
                .await
            {
                Ok(()) => {
                    let mut report = TargetReport::success(target, "installed and verified");
                    if forced_conflict.is_some() {
                        if let Some(family) = target.owning_family() {
                            report = report.with_hint(format!(
                                "restart {} to pick up the change",
                                family.display_name()
                            ));
                        }
                    }
                    reports.push(report);
                }
                Err(e) => {
                    warn!(target = %target.id(), error = %e, "install failed for this store");
                    reports.push(TargetReport::failure(target, &e));
                }
            }
        }
        OperationOutcome::from_reports(OperationKind::Install, reports)
    }

    async fn apply_uninstall(
        &self,
        backends: &[Box<dyn TrustBackend>],
        conflicts: &HashMap<BrowserFamily, String>,
        identity: &CertIdentity,
    ) -> OperationOutcome {
        let mut reports = Vec::with_capacity(backends.len());
        for backend in backends {
            let target = backend.target();

            let lock = store_lock(&target.id());
            let _held = lock.lock().await;

            if let Ok(TrustState::NotPresent) = self.with_timeout(backend.query(identity)).await {
                reports.push(TargetReport::success(target, "not present"));
                continue;
            }

            let forced_conflict = match conflict_for(target, conflicts) {
                Some(process) if !self.config.force => {
                    reports.push(TargetReport::failure(
                        target,
                        &TrustError::ProcessConflict { process },
                    ));
                    continue;
                }
                other => other,
            };

            match self.with_timeout(backend.uninstall(identity)).await {
                Ok(()) => {
                    let mut report = TargetReport::success(target, "removed and verified");
                    if forced_conflict.is_some() {
                        if let Some(family) = target.owning_family() {
                            report = report.with_hint(format!(
                                "restart {} to pick up the change",
                                family.display_name()
                            ));
                        }
                    }
                    reports.push(report);
                }
                Err(e) => {
                    warn!(target = %target.id(), error = %e, "uninstall failed for this store");
                    reports.push(TargetReport::failure(target, &e));
                }
            }
        }
        OperationOutcome::from_reports(OperationKind::Uninstall, reports)
    }

    async fn apply_status(
        &self,
        backends: &[Box<dyn TrustBackend>],
        identity: &CertIdentity,
    ) -> (TrustState, Vec<TargetState>) {
        let mut targets = Vec::with_capacity(backends.len());
        for backend in backends {
            let target = backend.target();
            let state = match self.with_timeout(backend.query(identity)).await {
                Ok(state) => state,
                Err(e) => TrustState::QueryFailed(e.to_string()),
            };
            targets.push(TargetState {
                target_id: target.id(),
                description: target.description(),
                state,
            });
        }
        let states: Vec<TrustState> = targets.iter().map(|t| t.state.clone()).collect();
        (TrustState::aggregate(&states), targets)
    }

    /// Snapshot the process table and collect per-family conflicts,
    /// but only when the operation actually needs a browser restart.
    fn probe_conflicts(
        &self,
        browser: &BrowserProfile,
        operation: OperationKind,
        backends: &[Box<dyn TrustBackend>],
    ) -> HashMap<BrowserFamily, String> {
        if !guard::requires_restart(browser, operation) {
            return HashMap::new();
        }
        let guard = ProcessGuard::snapshot();
        self.collect_conflicts(backends, &guard)
    }

    fn collect_conflicts(
        &self,
        backends: &[Box<dyn TrustBackend>],
        guard: &ProcessGuard,
    ) -> HashMap<BrowserFamily, String> {
        let mut conflicts = HashMap::new();
        for backend in backends {
            let target = backend.target();
            if !target.restart_sensitive() {
                continue;
            }
            let Some(family) = target.owning_family() else {
                continue;
            };
            if conflicts.contains_key(&family) {
                continue;
            }
            if let Some(process) = guard.conflicting_process(family, self.platform) {
                conflicts.insert(family, process);
            }
        }
        conflicts
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.per_target_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(TrustError::Timeout(self.config.per_target_timeout.as_secs())),
        }
    }

    fn ensure_supported(&self) -> Result<()> {
        if self.platform.is_supported() {
            Ok(())
        } else {
            Err(TrustError::StoreUnavailable {
                store: "system trust store".to_string(),
                reason: format!("unsupported platform: {}", std::env::consts::OS),
            })
        }
    }

    fn effective_identity(&self, cert: &CaCertificate) -> CertIdentity {
        self.override_nickname(cert.identity())
    }

    fn override_nickname(&self, identity: CertIdentity) -> CertIdentity {
        match &self.config.nickname {
            Some(nickname) => identity.with_nickname(nickname.clone()),
            None => identity,
        }
    }
}

fn conflict_for(
    target: &TrustStoreTarget,
    conflicts: &HashMap<BrowserFamily, String>,
) -> Option<String> {
    if !target.restart_sensitive() {
        return None;
    }
    target
        .owning_family()
        .and_then(|family| conflicts.get(&family).cloned())
}

/// One mutex per store, shared across coordinators in this process,
/// so concurrent operations on the same store serialize instead of
/// corrupting it.
fn store_lock(id: &str) -> Arc<tokio::sync::Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>> = OnceLock::new();
    let registry = LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
    registry.entry(id.to_string()).or_default().clone()
}

/// What the detected browser means for trust operations, in words.
fn guidance_for(profile: &BrowserProfile) -> Vec<String> {
    match profile.mechanism {
        TrustMechanism::SelfManagedNss => vec![format!(
            "{} keeps its own certificate database per profile; each one is updated individually",
            profile.name
        )],
        TrustMechanism::Both => vec![format!(
            "{} consults both the system store and its NSS database",
            profile.name
        )],
        TrustMechanism::SystemStore if profile.family == BrowserFamily::Safari => {
            vec!["Safari reads the system keychain; restart it after trust changes".to_string()]
        }
        TrustMechanism::SystemStore => vec![format!(
            "{} trusts the system store; no browser-specific work is needed",
            profile.name
        )],
        TrustMechanism::Unknown => vec![
            "default browser could not be identified; only the system store is reconciled"
                .to_string(),
        ],
    }
}
