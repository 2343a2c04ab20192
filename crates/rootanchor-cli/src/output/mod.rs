//! Output formatting for different formats.

use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use rootanchor::{
    BrowserReport, ExpiryReport, ExpiryStatus, OperationKind, OperationOutcome, OverallStatus,
    TrustMechanism, TrustReport, TrustState,
};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: pretty, json",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Render an install/uninstall outcome.
pub fn render_outcome(outcome: &OperationOutcome, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    if outcome.targets.is_empty() {
        println!("{}", "Nothing recorded as installed; nothing to do.".dimmed());
        return Ok(());
    }

    println!(
        "{} {}",
        op_title(outcome.operation).bold(),
        overall_label(outcome.overall)
    );
    println!();
    for target in &outcome.targets {
        if target.succeeded {
            let detail = target.detail.as_deref().unwrap_or("done");
            println!("  {}  {}: {}", "ok".green().bold(), target.target, detail);
        } else {
            let error = target.error.as_deref().unwrap_or("unknown error");
            println!("  {}  {}: {}", "fail".red().bold(), target.target, error);
        }
        if let Some(hint) = &target.hint {
            println!("        {} {}", "hint:".yellow(), hint);
        }
    }
    Ok(())
}

/// Render the per-store trust report.
pub fn render_status(report: &TrustReport, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Trust status for".bold(),
        report.identity.common_name.bold()
    );
    println!("  {} {}", "sha256:".dimmed(), report.identity.sha256.dimmed());
    println!();
    for target in &report.targets {
        println!("  {}: {}", target.description, state_label(&target.state));
    }
    println!();
    println!("Overall: {}", state_label(&report.overall));
    println!("Default browser: {}", report.browser);
    if let Some(expiry) = &report.expiry {
        println!();
        print_expiry_lines(expiry);
    }
    Ok(())
}

/// Render the validity window report.
pub fn render_expiry(report: &ExpiryReport, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{}", report.common_name.bold());
    print_expiry_lines(report);
    Ok(())
}

/// Render the default browser report.
pub fn render_browser(report: &BrowserReport, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{} {}", "Default browser:".bold(), report.profile.name);
    println!("Trust mechanism: {}", mechanism_label(report.profile.mechanism));
    if !report.profile.nss_profiles.is_empty() {
        println!("NSS databases:");
        for profile in &report.profile.nss_profiles {
            println!("  {}", profile.directory.display());
        }
    }
    match &report.running_process {
        Some(process) => println!("Running: {} ({})", "yes".yellow(), process),
        None => println!("Running: {}", "no".green()),
    }
    println!();
    for line in &report.guidance {
        println!("{} {}", "note:".cyan(), line);
    }
    Ok(())
}

fn print_expiry_lines(report: &ExpiryReport) {
    println!("  valid from:  {}", report.not_before);
    println!("  valid until: {}", report.not_after);
    match report.status {
        ExpiryStatus::Valid => println!(
            "  status: {} ({} days remaining)",
            "valid".green(),
            report.days_remaining
        ),
        ExpiryStatus::ExpiringSoon => println!(
            "  status: {} ({} days remaining)",
            "expiring soon".yellow().bold(),
            report.days_remaining
        ),
        ExpiryStatus::Expired => println!("  status: {}", "expired".red().bold()),
    }
}

fn op_title(op: OperationKind) -> &'static str {
    match op {
        OperationKind::Install => "Install:",
        OperationKind::Uninstall => "Uninstall:",
        OperationKind::Query => "Query:",
    }
}

fn overall_label(overall: OverallStatus) -> ColoredString {
    match overall {
        OverallStatus::Success => "success".green().bold(),
        OverallStatus::PartialSuccess => "partial success".yellow().bold(),
        OverallStatus::Failure => "failure".red().bold(),
    }
}

fn state_label(state: &TrustState) -> ColoredString {
    match state {
        TrustState::Trusted => "trusted".green(),
        TrustState::NotPresent => "not present".yellow(),
        TrustState::PresentButUntrusted => "present but untrusted".yellow().bold(),
        TrustState::QueryFailed(reason) => format!("query failed: {reason}").red(),
    }
}

fn mechanism_label(mechanism: TrustMechanism) -> &'static str {
    match mechanism {
        TrustMechanism::SystemStore => "system trust store",
        TrustMechanism::SelfManagedNss => "self-managed NSS databases",
        TrustMechanism::Both => "system trust store plus NSS databases",
        TrustMechanism::Unknown => "unknown; only the system store will be updated",
    }
}
