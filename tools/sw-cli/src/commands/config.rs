//! Configuration management commands.

use anyhow::{bail, Result};
use sw_core::UrlPattern;

use super::{ConfigArgs, ConfigCommand};
use crate::config::CliConfig;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Get { key } => get_config(&key, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    let worker = &ctx.config.worker;

    ctx.output.info("");
    ctx.output.info("[worker]");
    ctx.output.kv("site_name", &worker.site_name);
    ctx.output.kv("origin", worker.origin.as_str());
    ctx.output.kv("version", &worker.cache.version);
    ctx.output.kv("primary", &worker.cache.primary());
    ctx.output.kv("static", &worker.cache.static_name());
    ctx.output.kv("dynamic", &worker.cache.dynamic_name());
    ctx.output.kv("sync_tags", &worker.sync_tags.join(", "));

    ctx.output.info("");
    ctx.output.info("precache:");
    for path in &worker.precache {
        ctx.output.list_item(path);
    }

    ctx.output.info("");
    ctx.output.info("network_first:");
    for pattern in &worker.network_first {
        ctx.output.list_item(&describe_pattern(pattern));
    }

    ctx.output.info("");
    ctx.output.info("cache_first:");
    for pattern in &worker.cache_first {
        ctx.output.list_item(&describe_pattern(pattern));
    }

    ctx.output.info("");
    ctx.output.info("[storage]");
    ctx.output.kv("dir", &ctx.config.storage.dir.display().to_string());
    ctx.output.kv(
        "fetch_timeout_secs",
        &ctx.config.storage.fetch_timeout_secs.to_string(),
    );

    Ok(())
}

async fn get_config(key: &str, ctx: &Context) -> Result<()> {
    let value = get_config_value(&ctx.config, key)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let worker = &ctx.config.worker;

    if let Err(e) = worker.validate() {
        errors.push(e.to_string());
    }

    let warnings = config_warnings(&ctx.config);

    // Print results
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Settings that are legal but probably not what was meant.
fn config_warnings(config: &CliConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let worker = &config.worker;

    if !worker.precache.iter().any(|p| p == "/") {
        warnings.push("precache does not include '/', navigations have no offline shell".to_string());
    }
    if worker.network_first.is_empty() && worker.cache_first.is_empty() {
        warnings.push("no classification patterns, every GET uses the default policy".to_string());
    }
    if worker.origin.scheme() == "http"
        && !matches!(worker.origin.host_str(), Some("localhost") | Some("127.0.0.1"))
    {
        warnings.push(format!(
            "origin {} is not secure, browsers only register workers on https",
            worker.origin
        ));
    }
    if config.storage.fetch_timeout_secs == 0 {
        warnings.push("storage.fetch_timeout_secs is 0, every network fetch will time out".to_string());
    }

    warnings
}

fn get_config_value(config: &CliConfig, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split('.').collect();
    let worker = &config.worker;

    match parts.as_slice() {
        ["worker", "site_name"] => Ok(worker.site_name.clone()),
        ["worker", "origin"] => Ok(worker.origin.to_string()),
        ["worker", "cache", "app"] => Ok(worker.cache.app.clone()),
        ["worker", "cache", "version"] => Ok(worker.cache.version.clone()),
        ["worker", "cache", "static"] => Ok(worker.cache.static_name()),
        ["worker", "cache", "dynamic"] => Ok(worker.cache.dynamic_name()),
        ["worker", "sync_tags"] => Ok(worker.sync_tags.join(",")),
        ["storage", "dir"] => Ok(config.storage.dir.display().to_string()),
        ["storage", "fetch_timeout_secs"] => Ok(config.storage.fetch_timeout_secs.to_string()),
        _ => bail!("Unknown config key: {}", key),
    }
}

fn describe_pattern(pattern: &UrlPattern) -> String {
    match pattern {
        UrlPattern::PathPrefix(prefix) => format!("path starts with {}", prefix),
        UrlPattern::Host(host) => format!("host {}", host),
        UrlPattern::Extension(exts) => format!("extension {}", exts.join(", ")),
    }
}
