//! Command implementations.

pub mod browser;
pub mod expiry;
pub mod install;
pub mod status;
pub mod uninstall;

use std::time::Duration;

use rootanchor::{CoordinatorConfig, TrustCoordinator};

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output format
    pub output_format: OutputFormat,

    /// Budget for each store operation
    pub timeout: Duration,

    /// Nickname from the config file, used when the command gives none
    pub default_nickname: Option<String>,
}

impl Context {
    /// Build a coordinator for this invocation.
    pub fn coordinator(
        &self,
        force: bool,
        nickname: Option<String>,
    ) -> anyhow::Result<TrustCoordinator> {
        let config = CoordinatorConfig {
            per_target_timeout: self.timeout,
            force,
            nickname: nickname.or_else(|| self.default_nickname.clone()),
        };
        Ok(TrustCoordinator::with_config(config)?)
    }
}
