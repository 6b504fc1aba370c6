//! Shared utilities for CLI commands

use anyhow::Result;
use cacophony_core::MigrationId;
use cacophony_migrate::RunReport;
use std::fmt;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and the store is closed properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: the failure was already reported on stderr.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Calculate column widths for a table.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a left-aligned table with a dashed separator under the header.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);
    let line = |cells: Vec<String>| cells.join("  ").trim_end().to_string();

    println!(
        "{}",
        line(headers
            .iter()
            .zip(&widths)
            .map(|(h, &w)| format!("{h:<w$}"))
            .collect())
    );
    println!(
        "{}",
        line(widths.iter().map(|&w| "-".repeat(w)).collect())
    );
    for row in rows {
        println!(
            "{}",
            line(row
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| format!("{cell:<w$}"))
                .collect())
        );
    }
}

/// Print a dry-run plan.
pub(crate) fn print_plan(verb: &str, ids: &[MigrationId]) {
    if ids.is_empty() {
        println!("Nothing to {verb}");
        return;
    }
    println!("Would {verb} {} migration(s):", ids.len());
    for id in ids {
        println!("  {id}");
    }
}

/// Print a run summary; a failed unit goes to stderr and becomes exit code 1.
pub(crate) fn finish_run(verb: &str, report: RunReport) -> Result<()> {
    for id in &report.completed {
        println!("{verb} {id}");
    }
    match report.into_result() {
        Ok(completed) => {
            if completed.is_empty() {
                println!("Nothing to do");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{err}");
            Err(ExitCode(1).into())
        }
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
