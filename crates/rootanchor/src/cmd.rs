//! Subprocess execution for store management tools.
//!
//! Every command-based backend funnels through [`run_tool`] so missing
//! executables, exit codes, and captured output are handled one way.

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, TrustError};

/// Captured result of a finished tool invocation.
#[derive(Debug)]
pub(crate) struct CmdOutput {
    /// Whether the process exited zero
    pub success: bool,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl CmdOutput {
    /// Case-insensitive search of stdout and stderr. Store tools are
    /// inconsistent about which stream carries their diagnostics
    /// (`certutil` reports on stdout, `security` on stderr).
    pub(crate) fn mentions_any(&self, needles: &[&str]) -> bool {
        let stdout = self.stdout.to_ascii_lowercase();
        let stderr = self.stderr.to_ascii_lowercase();
        needles
            .iter()
            .map(|n| n.to_ascii_lowercase())
            .any(|n| stdout.contains(&n) || stderr.contains(&n))
    }

    /// Turn a non-zero exit into the command-failure error.
    pub(crate) fn into_error(self, program: &str) -> TrustError {
        TrustError::CommandFailed {
            program: program.to_string(),
            code: self.code,
            stderr: if self.stderr.trim().is_empty() {
                self.stdout.trim().to_string()
            } else {
                self.stderr.trim().to_string()
            },
        }
    }
}

/// Run a store management tool and capture its output.
///
/// A missing executable maps to `StoreUnavailable` naming `store`, so
/// callers surface "install the tool" rather than a raw spawn error.
/// Non-zero exits are not errors here; callers decide, since several
/// tools signal ordinary conditions (absent certificate) that way.
///
/// # Errors
///
/// Returns `StoreUnavailable` when the executable cannot be found and
/// `Io` for any other spawn failure.
pub(crate) async fn run_tool(store: &str, program: &str, args: &[&str]) -> Result<CmdOutput> {
    debug!(store, program, ?args, "running store command");

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TrustError::StoreUnavailable {
                    store: store.to_string(),
                    reason: format!("`{program}` not found on this system"),
                }
            } else {
                TrustError::Io(e)
            }
        })?;

    let result = CmdOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(
        program,
        success = result.success,
        code = ?result.code,
        "store command finished"
    );
    Ok(result)
}
