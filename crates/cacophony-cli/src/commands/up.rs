//! Up command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, UpArgs};
use crate::commands::common::{finish_run, print_plan};
use crate::context::RuntimeContext;

/// Apply pending migrations, optionally stopping at `--to`.
pub(crate) async fn execute(args: &UpArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let runner = ctx.runner()?;
    let target = args.to.as_deref();

    if args.dry_run {
        let plan = runner.plan_pending(target).await?;
        print_plan("apply", &plan);
        return Ok(());
    }

    log::info!("Migrating {} up", ctx.database);
    let report = runner.apply_pending(target).await?;
    finish_run("Applied", report)
}
