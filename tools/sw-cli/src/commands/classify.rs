//! Show the policy the classifier assigns to URLs.

use anyhow::{Context as _, Result};
use serde::Serialize;
use sw_core::{FetchRequest, Method, Url};
use sw_strategy::{Classification, RequestClassifier};

use super::ClassifyArgs;
use crate::context::Context;

#[derive(Debug, Serialize)]
struct ClassifiedUrl {
    url: String,
    method: String,
    policy: String,
}

/// Run the classify command.
pub async fn run(args: ClassifyArgs, ctx: &Context) -> Result<()> {
    let classifier = RequestClassifier::from_config(&ctx.config.worker);
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid method: {}", args.method))?;

    let mut rows = Vec::with_capacity(args.urls.len());
    for raw in &args.urls {
        let url = Url::parse(raw).with_context(|| format!("Invalid URL: {}", raw))?;
        let request = build_request(method.clone(), url, args.navigate);
        let policy = match classifier.classify(&request) {
            Classification::Passthrough => "passthrough".to_string(),
            Classification::Intercept(policy) => policy.to_string(),
        };
        rows.push(ClassifiedUrl {
            url: raw.clone(),
            method: method.to_string(),
            policy,
        });
    }

    if ctx.output.is_json() {
        ctx.output.json(&rows);
        return Ok(());
    }

    let width = rows.iter().map(|r| r.url.len()).max().unwrap_or(3).max(3);
    ctx.output.table_row(&["URL", "METHOD", "POLICY"], &[width, 6, 22]);
    for row in &rows {
        ctx.output
            .table_row(&[&row.url, &row.method, &row.policy], &[width, 6, 22]);
    }

    Ok(())
}

/// Build a request the way a page would issue it.
pub(crate) fn build_request(method: Method, url: Url, navigate: bool) -> FetchRequest {
    let mut request = if navigate {
        FetchRequest::navigate(url)
    } else {
        FetchRequest::get(url)
    };
    request.method = method;
    request
}
