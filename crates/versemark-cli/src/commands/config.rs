//! Config command handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use versemark_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "versification_dir": config.versification_dir(),
                    "canonical_scheme": config.canonical_scheme,
                    "default_scheme": config.default_scheme,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:          {}", config.data_dir.display());
            println!(
                "  versification_dir: {}",
                config.versification_dir().display()
            );
            println!("  canonical_scheme:  {}", config.canonical_scheme);
            println!("  default_scheme:    {}", config.default_scheme);
            println!(
                "  log_file:          {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, config_path: Option<&Path>, output: &Output) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "versification_dir" => {
            config.versification_dir = optional_path(value);
        }
        "canonical_scheme" => {
            if value.is_empty() {
                bail!("canonical_scheme cannot be empty");
            }
            config.canonical_scheme = value.to_string();
        }
        "default_scheme" => {
            if value.is_empty() {
                bail!("default_scheme cannot be empty");
            }
            config.default_scheme = value.to_string();
        }
        "log_file" => {
            config.log_file = optional_path(value);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, versification_dir, canonical_scheme, default_scheme, log_file",
                key
            );
        }
    }
    Ok(())
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "default_scheme", "Titled").unwrap();
        assert_eq!(config.default_scheme, "Titled");

        apply(&mut config, "log_file", "/tmp/versemark.log").unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/versemark.log")));

        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());

        apply(&mut config, "versification_dir", "/schemes").unwrap();
        assert_eq!(config.versification_dir(), PathBuf::from("/schemes"));
    }

    #[test]
    fn test_apply_rejects_unknown_and_empty() {
        let mut config = Config::default();

        let err = apply(&mut config, "sync_url", "ws://example.com").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));

        assert!(apply(&mut config, "canonical_scheme", "").is_err());
        assert_eq!(config.canonical_scheme, "KJVA");
    }

    #[test]
    fn test_set_writes_to_config_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let initial = Config {
            data_dir: dir.path().join("data"),
            ..Config::default()
        };
        initial.save_to_path(&path).unwrap();

        let output = Output::new(OutputFormat::Quiet);
        set(
            "default_scheme".to_string(),
            "Titled".to_string(),
            Some(&path),
            &output,
        )
        .unwrap();
        show(Some(&path), &output).unwrap();

        let saved = Config::load_from_path(&path).unwrap();
        assert_eq!(saved.default_scheme, "Titled");
        assert_eq!(saved.data_dir, dir.path().join("data"));
    }
}
