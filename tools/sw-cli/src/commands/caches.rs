//! List cache stores and their entries.

use anyhow::Result;
use serde::Serialize;
use sw_cache::{CacheStorage, CacheStore, EntryInfo};

use super::CachesArgs;
use crate::context::Context;
use crate::output::{format_bytes, generation_badge};

#[derive(Debug, Serialize)]
struct StoreListing {
    name: String,
    current: bool,
    size: u64,
    entries: Vec<EntryInfo>,
}

/// Run the caches command.
pub async fn run(args: CachesArgs, ctx: &Context) -> Result<()> {
    let names = &ctx.config.worker.cache;
    let storage = ctx.storage();

    let mut listings = Vec::new();
    for name in storage.keys().await? {
        let entries = storage.open(&name).await?.entries().await?;
        listings.push(StoreListing {
            current: names.is_current(&name),
            size: entries.iter().map(|e| e.size as u64).sum(),
            name,
            entries,
        });
    }

    if ctx.output.is_json() {
        ctx.output.json(&listings);
        return Ok(());
    }

    ctx.output.header(&format!(
        "Cache stores in {}",
        ctx.config.storage.dir.display()
    ));

    if listings.is_empty() {
        ctx.output.info("No cache stores. Run `sw precache` to install one.");
        return Ok(());
    }

    ctx.output
        .table_row(&["STORE", "ENTRIES", "SIZE", "GENERATION"], &[16, 8, 10, 10]);
    for listing in &listings {
        ctx.output.table_row(
            &[
                &listing.name,
                &listing.entries.len().to_string(),
                &format_bytes(listing.size),
                &generation_badge(listing.current),
            ],
            &[16, 8, 10, 10],
        );

        if args.entries {
            for entry in &listing.entries {
                ctx.output.list_item(&format!(
                    "{} {} {} ({})",
                    entry.stored_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.status,
                    entry.key,
                    format_bytes(entry.size as u64)
                ));
            }
        }
    }

    let stale = listings.iter().filter(|l| !l.current).count();
    if stale > 0 {
        ctx.output
            .warn(&format!("{} stale store(s), run `sw activate` to delete them", stale));
    }

    Ok(())
}
