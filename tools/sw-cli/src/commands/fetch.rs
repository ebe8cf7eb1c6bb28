//! Fetch a URL through the worker.

use anyhow::{Context as _, Result};
use serde::Serialize;
use sw_core::{Method, Url};
use sw_observability::MetricsSnapshot;

use super::classify::build_request;
use super::FetchArgs;
use crate::context::Context;
use crate::output::{format_bytes, source_badge};

#[derive(Debug, Serialize)]
struct FetchReport {
    url: String,
    status: u16,
    content_type: Option<String>,
    size: usize,
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs, ctx: &Context) -> Result<()> {
    let url = Url::parse(&args.url).with_context(|| format!("Invalid URL: {}", args.url))?;
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid method: {}", args.method))?;

    let worker = ctx.worker(args.offline)?;
    if !worker.resume().await? {
        ctx.output.warn(&format!(
            "{} is not installed, the request goes straight to the network. Run `sw precache` first.",
            worker.config().cache.static_name()
        ));
    }

    let request = build_request(method, url, args.navigate);
    let before = worker.metrics().snapshot();
    let result = worker.fetch(request).await;
    let source = response_source(&before, &worker.metrics().snapshot());

    // Let background revalidation land before the process exits.
    let pending = worker.tasks().len();
    if pending > 0 {
        ctx.output
            .debug(&format!("waiting for {} background task(s)", pending));
    }
    worker.tasks().drain().await;

    let response = result.context("Fetch failed")?;
    let report = FetchReport {
        url: args.url.clone(),
        status: response.status.as_u16(),
        content_type: response.content_type().map(str::to_string),
        size: response.body.len(),
        source,
        body: args.body.then(|| response.text()),
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.kv("status", &report.status.to_string());
    ctx.output.kv("source", &source_badge(report.source));
    if let Some(content_type) = &report.content_type {
        ctx.output.kv("content-type", content_type);
    }
    ctx.output.kv("size", &format_bytes(report.size as u64));
    if let Some(body) = &report.body {
        println!();
        println!("{}", body);
    }

    Ok(())
}

/// Where the response came from, judged by which counter moved.
fn response_source(before: &MetricsSnapshot, after: &MetricsSnapshot) -> &'static str {
    if after.hits > before.hits {
        "cache"
    } else if after.misses > before.misses {
        "network"
    } else if after.fallbacks > before.fallbacks {
        "offline-page"
    } else if after.failures > before.failures {
        "failed"
    } else {
        "passthrough"
    }
}
