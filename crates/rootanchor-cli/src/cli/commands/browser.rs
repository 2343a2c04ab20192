//! `rootanchor browser` - default browser detection report.

use anyhow::Result;

use super::Context;
use crate::output;

pub async fn execute(ctx: Context) -> Result<()> {
    let coordinator = ctx.coordinator(false, None)?;
    let report = coordinator.browser_report().await;
    output::render_browser(&report, ctx.output_format)
}
