//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Manage trust for a local root CA across system and browser stores
///
/// Installs, removes, and audits one CA certificate everywhere this
/// machine makes TLS trust decisions: the OS trust store plus the NSS
/// databases of the default browser.
#[derive(Parser, Debug)]
#[command(name = "rootanchor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Path to an alternate config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seconds to allow each store operation
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Increase verbosity (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Silence everything but errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a CA certificate into every applicable trust store
    Install(InstallArgs),

    /// Remove the CA certificate from every store that holds it
    Uninstall(UninstallArgs),

    /// Show the trust state of the certificate in every store
    Status(StatusArgs),

    /// Report the certificate's validity window
    Expiry(ExpiryArgs),

    /// Show the default browser and how it decides trust
    Browser,
}

// ============================================================================
// Install command
// ============================================================================

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Certificate file (PEM or DER)
    pub cert: PathBuf,

    /// Nickname to register the certificate under
    #[arg(short, long)]
    pub nickname: Option<String>,

    /// Proceed against browser stores even while the browser runs
    #[arg(long)]
    pub force: bool,
}

// ============================================================================
// Uninstall command
// ============================================================================

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Certificate file; defaults to whatever the last install recorded
    pub cert: Option<PathBuf>,

    /// Nickname the certificate was registered under
    #[arg(short, long)]
    pub nickname: Option<String>,

    /// Proceed against browser stores even while the browser runs
    #[arg(long)]
    pub force: bool,
}

// ============================================================================
// Status command
// ============================================================================

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Certificate file; defaults to whatever the last install recorded
    pub cert: Option<PathBuf>,

    /// Nickname the certificate was registered under
    #[arg(short, long)]
    pub nickname: Option<String>,
}

// ============================================================================
// Expiry command
// ============================================================================

#[derive(Args, Debug)]
pub struct ExpiryArgs {
    /// Certificate file (PEM or DER)
    pub cert: PathBuf,
}
