//! Write a default configuration file.

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use sw_core::Url;

use super::InitArgs;
use crate::config::generate_default_config;
use crate::context::{Context, CONFIG_NAMES};

/// Run the init command.
pub async fn run(args: InitArgs, ctx: &Context) -> Result<()> {
    let origin = Url::parse(&args.origin)
        .with_context(|| format!("Invalid origin: {}", args.origin))?;
    let site_name = args.site_name.clone().unwrap_or_else(|| {
        ctx.cwd
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("My Site")
            .to_string()
    });

    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);
    if config_path.exists() && !args.force {
        if ctx.output.is_json() {
            bail!(
                "Config file already exists: {}. Use --force to overwrite.",
                config_path.display()
            );
        }
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", config_path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            ctx.output.info("Left existing config untouched");
            return Ok(());
        }
    }

    let content = generate_default_config(&site_name, origin.as_str());
    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "created": config_path }));
        return Ok(());
    }

    ctx.output.success(&format!("Created: {}", config_path.display()));
    ctx.output.info("");
    ctx.output.info("Next steps:");
    ctx.output.list_item("sw config validate");
    ctx.output.list_item("sw precache");
    ctx.output.list_item("sw fetch --navigate <url>");

    Ok(())
}
