//! Status command implementation

use anyhow::{Context, Result};
use cacophony_migrate::StatusReport;

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::print_table;
use crate::context::RuntimeContext;

/// Report applied, pending and orphaned migrations. Never modifies the store.
pub(crate) async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::read_only(global)?;
    let report = ctx.runner()?.status().await?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize status report")?;
        println!("{json}");
    } else {
        print_report(&ctx.database, &report);
    }
    Ok(())
}

fn print_report(database: &str, report: &StatusReport) {
    println!("Database: {database}");
    println!(
        "Current:  {}",
        report.current().map_or("(none)", |id| id.as_str())
    );
    if let Some(lock) = &report.lock {
        println!("Locked:   by {} since {}", lock.holder, lock.acquired_at);
    }
    println!();

    let mut rows: Vec<Vec<String>> = report
        .applied
        .iter()
        .map(|m| {
            vec![
                m.id.to_string(),
                "applied".to_string(),
                m.applied_at.clone(),
                m.description.clone(),
            ]
        })
        .collect();
    rows.extend(report.pending.iter().map(|m| {
        vec![
            m.id.to_string(),
            "pending".to_string(),
            String::new(),
            m.description.clone(),
        ]
    }));
    rows.extend(report.orphaned.iter().map(|e| {
        vec![
            e.id.clone(),
            "orphaned".to_string(),
            e.applied_at.clone(),
            "(not in catalog)".to_string(),
        ]
    }));

    if rows.is_empty() {
        println!("No migrations registered");
    } else {
        print_table(&["ID", "STATE", "APPLIED AT", "DESCRIPTION"], &rows);
    }

    println!();
    println!(
        "{} applied, {} pending, {} orphaned",
        report.applied.len(),
        report.pending.len(),
        report.orphaned.len()
    );
}
