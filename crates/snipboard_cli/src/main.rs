//! CLI smoke and diagnostics entry point.
//!
//! # Responsibility
//! - Verify `snipboard_core` linkage with deterministic output.
//! - With a config file, open the configured database and report its schema
//!   version and integrity summary.

use anyhow::{bail, Context};
use snipboard_core::db::migrations::current_user_version;
use snipboard_core::{check_integrity, init_logging, load_config};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the database has integrity violations.
fn run() -> anyhow::Result<bool> {
    println!("snipboard_core ping={}", snipboard_core::ping());
    println!("snipboard_core version={}", snipboard_core::core_version());

    let Some(config_path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        return Ok(true);
    };
    let Some(config) = load_config(Some(&config_path))? else {
        bail!("config file not found: {}", config_path.display());
    };

    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.effective_log_level(), log_dir).context("failed to init logging")?;
    }

    let conn = config
        .open_database()
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    println!("schema_version={}", current_user_version(&conn)?);

    let report = check_integrity(&conn)?;
    println!(
        "integrity={} violations={} orphan_nodes={} dangling_edges={} cross_project_edges={} orphan_comments={} orphan_highlights={} foreign_key_violations={}",
        if report.is_clean() { "ok" } else { "violations" },
        report.violation_count(),
        report.orphan_nodes.len(),
        report.dangling_edges.len(),
        report.cross_project_edges.len(),
        report.orphan_comments.len(),
        report.orphan_highlights.len(),
        report.foreign_key_violations.len()
    );
    if !report.is_clean() {
        log::warn!(
            "event=cli_integrity module=cli status=violations count={}",
            report.violation_count()
        );
    }
    Ok(report.is_clean())
}
