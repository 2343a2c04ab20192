//! `rootanchor expiry` - certificate validity window.

use anyhow::Result;

use super::Context;
use crate::cli::args::ExpiryArgs;
use crate::output;

pub async fn execute(ctx: Context, args: ExpiryArgs) -> Result<()> {
    let coordinator = ctx.coordinator(false, None)?;
    let report = coordinator.expiration(&args.cert).await?;
    output::render_expiry(&report, ctx.output_format)
}
