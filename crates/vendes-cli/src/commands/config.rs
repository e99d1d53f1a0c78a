//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use vendes_core::models::config::VendesConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "classifier.visit_marker")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => show_config(&path),
        ConfigCommand::Init(init_args) => init_config(init_args, &path),
        ConfigCommand::Get { key } => get_config(&path, &key),
        ConfigCommand::Set { key, value } => set_config(&path, &key, &value),
        ConfigCommand::Path => show_path(&path),
    }
}

pub(crate) fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vendes")
        .join("config.json")
}

fn load_or_default(path: &Path) -> anyhow::Result<VendesConfig> {
    if path.exists() {
        Ok(VendesConfig::from_file(path)?)
    } else {
        Ok(VendesConfig::default())
    }
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        eprintln!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }

    let config = load_or_default(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, path: &Path) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| path.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    VendesConfig::default().save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(path: &Path, key: &str) -> anyhow::Result<()> {
    let json = serde_json::to_value(load_or_default(path)?)?;

    let mut current = &json;
    for part in key.split('.') {
        current = current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    }

    println!("{}", serde_json::to_string_pretty(current)?);

    Ok(())
}

/// Apply `key = value` to a config, checking the result still deserializes
/// and validates.
fn apply_setting(config: &VendesConfig, key: &str, value: &str) -> anyhow::Result<VendesConfig> {
    // Bare words are taken as strings
    let parsed_value: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let mut json = serde_json::to_value(config)?;

    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("Empty configuration key"))?;

    let mut current = &mut json;
    for part in parents {
        current = current
            .get_mut(*part)
            .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
    }

    let obj = current
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Cannot set value at non-object path"))?;
    if !obj.contains_key(*last) {
        anyhow::bail!("Configuration key not found: {}", key);
    }
    obj.insert((*last).to_string(), parsed_value);

    let updated: VendesConfig = serde_json::from_value(json)?;
    updated.validate()?;
    Ok(updated)
}

fn set_config(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let config = apply_setting(&load_or_default(path)?, key, value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;

    println!("{} Set {} = {}", style("✓").green(), key, value);

    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'vendes config init' to create a configuration file.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vendes_core::{MerchandisingGrouping, SummaryField};

    #[test]
    fn test_set_nested_values() {
        let config = VendesConfig::default();

        let config = apply_setting(&config, "classifier.merchandising", "combined").unwrap();
        assert_eq!(config.classifier.merchandising, MerchandisingGrouping::Combined);

        let config = apply_setting(&config, "summary.fields", r#"["base","tax","price"]"#).unwrap();
        assert_eq!(config.summary.fields, SummaryField::base_tax_price());

        let config = apply_setting(&config, "backend.timeout_secs", "30").unwrap();
        assert_eq!(config.backend.timeout_secs, 30);
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let err = apply_setting(&VendesConfig::default(), "classifier.colour", "blue").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_set_rejects_invalid_result() {
        assert!(apply_setting(&VendesConfig::default(), "summary.fields", "[]").is_err());
        assert!(apply_setting(&VendesConfig::default(), "summary.fields", "[\"vat\"]").is_err());
    }

    #[test]
    fn test_init_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        init_config(InitArgs { output: None, force: false }, &path).unwrap();
        let config = VendesConfig::from_file(&path).unwrap();
        assert_eq!(config.output.records_prefix, "articles");

        assert!(init_config(InitArgs { output: None, force: false }, &path).is_err());
        assert!(init_config(InitArgs { output: None, force: true }, &path).is_ok());
    }
}
