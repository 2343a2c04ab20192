//! `rootanchor install` - trust a CA certificate everywhere.

use anyhow::Result;

use super::Context;
use crate::cli::args::InstallArgs;
use crate::output;

pub async fn execute(ctx: Context, args: InstallArgs) -> Result<()> {
    let coordinator = ctx.coordinator(args.force, args.nickname)?;
    let outcome = coordinator.install(&args.cert).await?;
    output::render_outcome(&outcome, ctx.output_format)?;

    if matches!(outcome.overall, rootanchor::OverallStatus::Failure) {
        anyhow::bail!("no trust store accepted the certificate")
    }
    Ok(())
}
