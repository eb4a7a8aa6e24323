//! Follow pushed changes.

use super::records::{print_projection, ListArgs};
use crate::context::Context;
use crate::output::{self, OutputFormat};
use anyhow::{Context as _, Result};
use live_updates::{LiveUpdateChannel, LiveUpdateConfig};
use sync_engine::EngineEvent;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, Duration};
use tracing::{debug, info};
use view_projector::project;

fn reprint(ctx: &Context, args: &ListArgs) -> Result<()> {
    if ctx.format == OutputFormat::Text {
        println!("\n[{}]", chrono::Local::now().format("%H:%M:%S"));
    }
    let records = ctx.engine.records();
    print_projection(&project(&records, &args.view(ctx.config.page_size)), &ctx.format)
}

/// Print the listing, then again after every pushed update, until Ctrl-C.
pub async fn records_watch(ctx: &Context, args: &ListArgs) -> Result<()> {
    let push_url = ctx
        .config
        .push_url()
        .context("Invalid push_url")?
        .context("No push endpoint configured (set push_url or ROSTER_PUSH_URL)")?;

    let mut events = ctx.engine.subscribe();
    let handle =
        LiveUpdateChannel::new(LiveUpdateConfig::new(push_url.as_str()), ctx.engine.clone())
            .spawn();
    info!(url = %push_url, "Watching for pushed updates");

    reprint(ctx, args)?;

    let mut liveness = interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(EngineEvent::ExternalUpdateApplied { count }) => {
                    debug!(count, "Pushed update applied");
                    reprint(ctx, args)?;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event stream lagged");
                    reprint(ctx, args)?;
                }
                Err(RecvError::Closed) => break,
            },
            _ = liveness.tick() => {
                if handle.is_finished() {
                    output::print_notice("Push channel gave up reconnecting, stopping.", &ctx.format);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}
