//! rootanchor - local root CA trust management
//!
//! Installs, removes, and audits a CA certificate across the system
//! trust store and the default browser's NSS databases.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    rootanchor_cli::run().await
}
