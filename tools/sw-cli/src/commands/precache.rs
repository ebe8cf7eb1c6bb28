//! Install the configured generation: fetch every precache path into the
//! static store.

use std::time::Instant;

use anyhow::{Context as _, Result};
use serde::Serialize;
use sw_cache::{CacheStorage, CacheStore, EntryInfo};
use sw_core::Url;
use sw_worker::ServiceWorker;

use super::PrecacheArgs;
use crate::context::Context;
use crate::output::format_bytes;

#[derive(Debug, Serialize)]
struct PrecacheReport {
    store: String,
    precached: usize,
    elapsed_ms: u128,
    entries: Vec<EntryInfo>,
}

/// Run the precache command.
pub async fn run(args: PrecacheArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.worker.clone();
    if let Some(origin) = &args.origin {
        config.origin = Url::parse(origin).with_context(|| format!("Invalid origin: {}", origin))?;
    }
    let store = config.cache.static_name();

    ctx.output.header(&format!("Precaching {} from {}", store, config.origin));
    ctx.output
        .debug(&format!("cache dir: {}", ctx.config.storage.dir.display()));

    let storage = ctx.storage();
    let worker = ServiceWorker::new(config, storage.clone(), ctx.fetcher(false)?)
        .context("Invalid worker configuration")?;

    let started = Instant::now();
    let spinner = ctx
        .output
        .spinner(&format!("Fetching {} paths", worker.config().precache.len()));
    let result = worker.install().await;
    spinner.finish_and_clear();
    let precached = result.context("Install failed, nothing was cached")?;

    let entries = storage.open(&store).await?.entries().await?;
    let report = PrecacheReport {
        store,
        precached,
        elapsed_ms: started.elapsed().as_millis(),
        entries,
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    for entry in &report.entries {
        ctx.output.list_item(&format!(
            "{} {} ({})",
            entry.status,
            entry.key.url(),
            format_bytes(entry.size as u64)
        ));
    }
    ctx.output.success(&format!(
        "Precached {} responses into {} in {}ms",
        report.precached, report.store, report.elapsed_ms
    ));

    Ok(())
}
