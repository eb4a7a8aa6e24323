//! CSV import and export.

use crate::context::Context;
use crate::output::{self, OutputFormat};
use anyhow::{Context as _, Result};
use serde_json::json;
use std::path::Path;
use sync_engine::{ImportIssue, ImportReport};
use view_projector::{filtered, ViewState};

fn issues_json(issues: &[ImportIssue]) -> serde_json::Value {
    issues
        .iter()
        .map(|issue| json!({ "line": issue.line, "reason": issue.reason }))
        .collect()
}

/// Summary line plus one line per row that did not make it.
pub fn render_report(report: &ImportReport) -> String {
    let mut out = format!(
        "Imported {} records ({} skipped, {} failed)\n",
        report.created.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for issue in &report.skipped {
        out.push_str(&format!("  skipped line {}: {}\n", issue.line, issue.reason));
    }
    for issue in &report.failed {
        out.push_str(&format!("  failed line {}: {}\n", issue.line, issue.reason));
    }
    out
}

/// Import records from a CSV file. Fails if any row was not imported.
pub async fn records_import(ctx: &Context, file: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let report = ctx.engine.import_csv(&text).await;

    match ctx.format {
        OutputFormat::Text => print!("{}", render_report(&report)),
        OutputFormat::Json => output::print_json(&json!({
            "created": report.created,
            "skipped": issues_json(&report.skipped),
            "failed": issues_json(&report.failed),
        }))?,
    }

    if !report.is_clean() {
        anyhow::bail!(
            "{} rows were not imported",
            report.skipped.len() + report.failed.len()
        );
    }
    Ok(())
}

/// CSV for every record, or only those matching `query`, in id order.
pub fn export_text(ctx: &Context, query: Option<&str>) -> String {
    match query {
        None => ctx.engine.export_csv(),
        Some(query) => {
            let mut view = ViewState::default();
            view.set_query(query);
            csv_interchange::encode(&filtered(&ctx.engine.records(), &view))
        }
    }
}

/// Export records as CSV to stdout or a file.
pub async fn records_export(ctx: &Context, output: Option<&Path>, query: Option<&str>) -> Result<()> {
    let text = export_text(ctx, query);
    match output {
        None => print!("{text}"),
        Some(path) => {
            tokio::fs::write(path, &text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let rows = text.lines().count().saturating_sub(1);
            output::print_success(
                &format!("Exported {rows} records to {}", path.display()),
                &ctx.format,
            );
        }
    }
    Ok(())
}
