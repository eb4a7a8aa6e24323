//! Listing and editing records.

use crate::context::Context;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use record_store_client::{Record, RecordFields, RecordId, RecordPatch};
use serde_json::json;
use view_projector::{project, Projection, SortDirection, SortKey, ViewState};

/// View parameters for `list` and `watch`.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub query: Option<String>,
    pub sort: SortKey,
    pub desc: bool,
    pub page: usize,
    pub page_size: Option<usize>,
}

impl ListArgs {
    pub fn view(&self, default_page_size: usize) -> ViewState {
        let mut view = ViewState {
            sort_key: self.sort,
            direction: if self.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
            page_size: self.page_size.unwrap_or(default_page_size),
            ..ViewState::default()
        };
        if let Some(query) = &self.query {
            view.set_query(query.as_str());
        }
        view.page = self.page;
        view
    }
}

/// Render one page as a fixed-width table with a pager footer.
pub fn render_projection(projection: &Projection) -> String {
    let mut out = String::new();
    if projection.rows.is_empty() {
        out.push_str("No records found\n");
    } else {
        out.push_str(&format!("{:<8} {:<28} {}\n", "ID", "Name", "Email"));
        out.push_str(&"-".repeat(72));
        out.push('\n');
        for record in &projection.rows {
            out.push_str(&format!(
                "{:<8} {:<28} {}\n",
                record.id, record.name, record.email
            ));
        }
    }
    out.push_str(&format!(
        "Page {} of {} ({} matching)\n",
        projection.page, projection.page_count, projection.total_count
    ));
    out
}

pub(crate) fn print_projection(projection: &Projection, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_projection(projection)),
        OutputFormat::Json => output::print_json(projection)?,
    }
    Ok(())
}

fn print_record(heading: &str, record: &Record, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{heading}");
            output::print_divider();
            output::print_row("ID", &record.id.to_string());
            output::print_row("Name", &record.name);
            output::print_row("Email", &record.email);
        }
        OutputFormat::Json => output::print_json(record)?,
    }
    Ok(())
}

/// List one page of records.
pub async fn records_list(ctx: &Context, args: &ListArgs) -> Result<()> {
    let view = args.view(ctx.config.page_size);
    let records = ctx.engine.records();
    print_projection(&project(&records, &view), &ctx.format)
}

/// Show one record, refreshed from the service when reachable.
pub async fn records_show(ctx: &Context, id: RecordId) -> Result<()> {
    let record = if ctx.engine.status().is_degraded() {
        ctx.engine.record(id)
    } else {
        ctx.engine.refresh_record(id).await?
    };
    match record {
        Some(record) => print_record("Record Details", &record, &ctx.format),
        None => bail!("Record {id} not found"),
    }
}

/// Create a record.
pub async fn records_create(ctx: &Context, name: String, email: String) -> Result<()> {
    let record = ctx.engine.create(RecordFields::new(name, email)).await?;
    print_record("Created record", &record, &ctx.format)
}

/// Change a record's name and/or email.
pub async fn records_update(
    ctx: &Context,
    id: RecordId,
    name: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let patch = RecordPatch { name, email };
    if patch.is_empty() {
        bail!("Nothing to update: pass --name and/or --email");
    }
    let record = ctx.engine.update(id, patch).await?;
    print_record("Updated record", &record, &ctx.format)
}

/// Delete one record.
pub async fn records_delete(ctx: &Context, id: RecordId) -> Result<()> {
    ctx.engine.delete(id).await?;
    output::print_success(&format!("Deleted record {id}"), &ctx.format);
    Ok(())
}

/// Delete several records, all or nothing.
pub async fn records_bulk_delete(ctx: &Context, ids: &[RecordId]) -> Result<()> {
    let requested = ctx.engine.bulk_delete(ids).await?;
    match ctx.format {
        OutputFormat::Text => println!("Deleted {requested} records"),
        OutputFormat::Json => output::print_json(&json!({ "deleted": requested }))?,
    }
    Ok(())
}
