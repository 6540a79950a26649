use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use std::collections::HashMap;
use std::path::Path;
use tome_core::Config;

pub const DEFAULT_CONFIG_FILE: &str = "./tome.toml";

/// Variables older Notion export scripts already set, mapped onto config keys.
fn legacy_overrides<F>(lookup: F) -> Vec<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overrides = Vec::new();

    if let Some(token) = lookup("NOTION_API_KEY") {
        overrides.push(("notion.token", token));
    }
    if let Some(root) = lookup("NOTION_ROOT_PAGE_ID") {
        overrides.push(("export.root_page_id", root));
    }
    if let Some(flag) = lookup("DOWNLOAD_IMAGES") {
        let enabled = flag.trim().eq_ignore_ascii_case("true");
        overrides.push(("export.download_images", enabled.to_string()));
    }

    overrides
}

/// Only flags the user actually passed override anything.
fn cli_overrides(args: &ArgMatches) -> HashMap<&'static str, String> {
    let mut overrides = HashMap::new();

    if let Some(root) = args.try_get_one::<String>("root").unwrap_or(None) {
        overrides.insert("export.root_page_id", root.clone());
    }
    if let Some(output) = args.try_get_one::<String>("output").unwrap_or(None) {
        overrides.insert("export.output", output.clone());
    }
    if args.try_get_one::<bool>("no-images").unwrap_or(None) == Some(&true) {
        overrides.insert("export.download_images", "false".to_string());
    }
    if args.try_get_one::<bool>("database").unwrap_or(None) == Some(&true) {
        overrides.insert("export.database", "true".to_string());
    }

    overrides
}

/// Load configuration with cascading precedence:
/// 1. CLI arguments (highest priority)
/// 2. NOTION_API_KEY, NOTION_ROOT_PAGE_ID and DOWNLOAD_IMAGES
/// 3. Environment variables (TOME_*)
/// 4. Configuration file
/// 5. Defaults (lowest priority)
pub fn load_config(args: &ArgMatches) -> Result<Config> {
    let env: HashMap<String, String> = std::env::vars().collect();
    load_with_env(args, &env)
}

fn load_with_env(args: &ArgMatches, env: &HashMap<String, String>) -> Result<Config> {
    let config_file = args
        .try_get_one::<String>("config")
        .unwrap_or(None)
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_FILE);

    let defaults = ConfigBuilder::try_from(&Config::default())?;
    let mut builder = ConfigBuilder::builder().add_source(defaults);

    if Path::new(config_file).exists() {
        builder = builder.add_source(File::with_name(config_file));
    } else if config_file != DEFAULT_CONFIG_FILE {
        log::warn!("Config file {} not found, ignoring", config_file);
    }

    builder = builder.add_source(
        Environment::with_prefix("TOME")
            .prefix_separator("_")
            .separator("__")
            .source(Some(env.clone())),
    );

    for (key, value) in legacy_overrides(|name| env.get(name).cloned()) {
        builder = builder.set_override(key, value)?;
    }
    for (key, value) in cli_overrides(args) {
        builder = builder.set_override(key, value)?;
    }

    Ok(builder.build()?.try_deserialize()?)
}
