//! `rootanchor status` - per-store trust state.

use anyhow::Result;

use super::Context;
use crate::cli::args::StatusArgs;
use crate::output;

pub async fn execute(ctx: Context, args: StatusArgs) -> Result<()> {
    let coordinator = ctx.coordinator(false, args.nickname)?;
    let report = coordinator.status(args.cert.as_deref()).await?;
    output::render_status(&report, ctx.output_format)
}
