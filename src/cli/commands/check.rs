//! Check command implementation.

use crate::core::auditor::audit_library;
use crate::models::report::{AuditStatus, Issue, Severity};
use crate::utils::fs::ensure_directory;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Report organization issues of every series folder.
///
/// A missing library root is reported and gives an empty summary, the same
/// way `sync` and `reconcile` treat an unmounted drive.
pub async fn check(library: &Path) -> Result<()> {
    if let Err(e) = ensure_directory(library) {
        tracing::warn!("Library root not available: {}", e);
        println!("{}", format!("[WARN] {}", e).yellow());
    }

    println!(
        "{}",
        format!("Scanning library for organization issues: {}", library.display())
            .bold()
            .cyan()
    );

    let reports = audit_library(library);
    let mut clean = 0;
    let mut with_issues = 0;

    for (name, report) in &reports {
        match report.status {
            AuditStatus::Ok => clean += 1,
            AuditStatus::Empty => {}
            AuditStatus::Issues => {
                with_issues += 1;
                println!();
                println!("{}", format!("[!] {}", name).bold().yellow());
                for issue in &report.issues {
                    print_issue(issue);
                }
            }
        }
    }

    println!();
    println!("{}", "Summary".bold().green());
    println!("  {} {}", "Series checked:".bold(), reports.len());
    println!("  {} {}", "Clean series:".bold(), clean);
    println!("  {} {}", "Series with issues:".bold(), with_issues);

    Ok(())
}

fn print_issue(issue: &Issue) {
    let line = format!("  - {}", issue.message());
    match issue.severity() {
        Severity::Warning => println!("{}", line),
        Severity::Info => println!("{}", line.dimmed()),
    }
    if let Issue::MixedContent { files, .. } = issue {
        println!("    Possible culprits: {}", files.join(", "));
    }
}
