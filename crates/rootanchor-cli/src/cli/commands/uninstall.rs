//! `rootanchor uninstall` - remove the CA certificate from every store.

use anyhow::Result;

use super::Context;
use crate::cli::args::UninstallArgs;
use crate::output;

pub async fn execute(ctx: Context, args: UninstallArgs) -> Result<()> {
    let coordinator = ctx.coordinator(args.force, args.nickname)?;
    let outcome = match &args.cert {
        Some(path) => coordinator.uninstall_file(path).await?,
        None => coordinator.uninstall().await?,
    };
    output::render_outcome(&outcome, ctx.output_format)?;

    if matches!(outcome.overall, rootanchor::OverallStatus::Failure) {
        anyhow::bail!("the certificate could not be removed from any store")
    }
    Ok(())
}
