//! Delete cache stores that do not belong to the configured version.

use anyhow::Result;
use dialoguer::Confirm;
use serde::Serialize;
use sw_cache::CacheStorage;
use sw_worker::sweep;

use super::ActivateArgs;
use crate::context::Context;

#[derive(Debug, Serialize)]
struct SweepReport {
    version: String,
    kept: Vec<String>,
    deleted: Vec<String>,
    dry_run: bool,
}

/// Run the activate command.
pub async fn run(args: ActivateArgs, ctx: &Context) -> Result<()> {
    let names = &ctx.config.worker.cache;
    let storage = ctx.storage();

    ctx.output
        .header(&format!("Activating generation {}", names.version));

    let (kept, stale): (Vec<String>, Vec<String>) = storage
        .keys()
        .await?
        .into_iter()
        .partition(|name| names.is_current(name));

    if stale.is_empty() {
        ctx.output.success("No stale cache stores");
        if ctx.output.is_json() {
            ctx.output.json(&SweepReport {
                version: names.version.clone(),
                kept,
                deleted: Vec::new(),
                dry_run: args.dry_run,
            });
        }
        return Ok(());
    }

    for name in &stale {
        ctx.output.list_item(name);
    }

    if args.dry_run {
        ctx.output
            .info(&format!("Dry run: {} store(s) would be deleted", stale.len()));
        if ctx.output.is_json() {
            ctx.output.json(&SweepReport {
                version: names.version.clone(),
                kept,
                deleted: stale,
                dry_run: true,
            });
        }
        return Ok(());
    }

    if !args.yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} stale store(s)?", stale.len()))
            .default(false)
            .interact()?;
        if !confirmed {
            ctx.output.info("Activation cancelled");
            return Ok(());
        }
    }

    let deleted = sweep(storage.as_ref(), names).await?;

    if ctx.output.is_json() {
        ctx.output.json(&SweepReport {
            version: names.version.clone(),
            kept,
            deleted,
            dry_run: false,
        });
        return Ok(());
    }

    ctx.output
        .success(&format!("Deleted {} stale store(s)", deleted.len()));

    Ok(())
}
