//! Down command implementation

use anyhow::Result;

use crate::cli::{DownArgs, GlobalArgs};
use crate::commands::common::{finish_run, print_plan};
use crate::context::RuntimeContext;

/// Revert the `--count` most recently applied migrations.
pub(crate) async fn execute(args: &DownArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let runner = ctx.runner()?;
    let count = args.count as usize;

    if args.dry_run {
        let plan = runner.plan_revert(count).await?;
        print_plan("revert", &plan);
        return Ok(());
    }

    log::info!("Reverting {count} migration(s) in {}", ctx.database);
    let report = runner.revert(count).await?;
    finish_run("Reverted", report)
}
