//! Browser process detection.
//!
//! NSS databases are cached in browser memory; mutating one under a
//! running browser silently loses the change at shutdown. The guard
//! reports which browser processes are running so callers can refuse
//! or warn. It never signals or kills anything.

use sysinfo::{ProcessRefreshKind, RefreshKind, System};
use tracing::debug;

use crate::platform::Platform;
use crate::types::{BrowserFamily, BrowserProfile, OperationKind};

/// Linux reports process names from the kernel comm field, truncated
/// to this many bytes.
const COMM_TRUNCATION: usize = 15;

/// A point-in-time view of running processes.
pub struct ProcessGuard {
    system: System,
}

impl ProcessGuard {
    /// Take a process table snapshot. The snapshot is cheap to query
    /// but goes stale; take a fresh one per operation.
    #[must_use]
    pub fn snapshot() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::new()),
        );
        Self { system }
    }

    /// The first running process belonging to this browser family, if
    /// any. Returns the observed process name for use in messages.
    #[must_use]
    pub fn conflicting_process(
        &self,
        family: BrowserFamily,
        platform: Platform,
    ) -> Option<String> {
        let executables = family.executable_names(platform);
        if executables.is_empty() {
            return None;
        }
        for process in self.system.processes().values() {
            let name = process.name();
            if executables.iter().any(|exe| name_matches(name, exe)) {
                debug!(process = name, browser = family.display_name(), "browser is running");
                return Some(name.to_string());
            }
        }
        None
    }

    /// Whether any process of this browser family is running.
    #[must_use]
    pub fn is_running(&self, family: BrowserFamily, platform: Platform) -> bool {
        self.conflicting_process(family, platform).is_some()
    }
}

impl std::fmt::Debug for ProcessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessGuard")
            .field("processes", &self.system.processes().len())
            .finish()
    }
}

/// Whether this operation needs the browser restarted before the
/// change is observed. Only mutations of a self-managed NSS database
/// qualify; system-store changes take effect without a restart.
#[must_use]
pub fn requires_restart(profile: &BrowserProfile, operation: OperationKind) -> bool {
    operation.is_mutating() && profile.mechanism.uses_nss()
}

/// Case-insensitive name comparison that tolerates the kernel comm
/// truncation ("chromium-browse" for chromium-browser).
fn name_matches(process: &str, executable: &str) -> bool {
    let process = process.to_ascii_lowercase();
    let executable = executable.to_ascii_lowercase();
    process == executable
        || (process.len() >= COMM_TRUNCATION && executable.starts_with(&process))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrustMechanism;

    #[test]
    fn exact_names_match_case_insensitively() {
        assert!(name_matches("firefox", "firefox"));
        assert!(name_matches("Firefox", "firefox"));
        assert!(name_matches("Google Chrome", "Google Chrome"));
        assert!(!name_matches("firefox", "chromium"));
    }

    #[test]
    fn truncated_comm_names_still_match() {
        assert!(name_matches("chromium-browse", "chromium-browser"));
        assert!(!name_matches("fire", "firefox"));
    }

    #[test]
    fn helper_processes_do_not_match_the_main_binary() {
        assert!(!name_matches("Google Chrome Helper (Renderer)", "Google Chrome"));
    }

    #[test]
    fn unknown_family_never_conflicts() {
        let guard = ProcessGuard::snapshot();
        assert!(guard
            .conflicting_process(BrowserFamily::Unknown, Platform::Linux)
            .is_none());
        assert!(!guard.is_running(BrowserFamily::Unknown, Platform::Linux));
    }

    #[test]
    fn snapshot_observes_the_process_table() {
        let guard = ProcessGuard::snapshot();
        assert!(!guard.system.processes().is_empty());
    }

    #[test]
    fn only_nss_mutations_need_a_restart() {
        let firefox = BrowserProfile {
            family: BrowserFamily::Firefox,
            name: "Firefox".to_string(),
            mechanism: TrustMechanism::SelfManagedNss,
            nss_profiles: Vec::new(),
        };
        assert!(requires_restart(&firefox, OperationKind::Install));
        assert!(requires_restart(&firefox, OperationKind::Uninstall));
        assert!(!requires_restart(&firefox, OperationKind::Query));
        assert!(!requires_restart(
            &BrowserProfile::unknown(),
            OperationKind::Install
        ));
    }
}
