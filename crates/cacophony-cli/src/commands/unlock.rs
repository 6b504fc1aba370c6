//! Unlock command implementation

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Clear the lock row a crashed run left behind.
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let lock = ctx.lock();
    match lock.force_release().await? {
        Some(info) => {
            log::warn!(
                "Removed migration lock held by '{}' since {}",
                info.holder,
                info.acquired_at
            );
            println!("Released lock held by {}", info.holder);
        }
        None => println!("No migration lock is held"),
    }
    Ok(())
}
