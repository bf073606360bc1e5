//! Versification scheme listing

use anyhow::Result;

use versemark_core::{Config, OrdinalConverter, SchemeRegistry};

use crate::output::{Output, OutputFormat};

/// List the loaded schemes, marking the canonical one
pub fn list(config: &Config, output: &Output) -> Result<()> {
    let registry = SchemeRegistry::load_dir(&config.versification_dir(), &config.canonical_scheme)?;
    let canonical = registry.canonical_scheme();

    match output.format {
        OutputFormat::Json => {
            let schemes = registry
                .scheme_names()
                .map(|name| {
                    let books = registry.books(name)?;
                    Ok(serde_json::json!({
                        "name": name,
                        "canonical": name == canonical,
                        "books": books.len(),
                    }))
                })
                .collect::<Result<Vec<_>>>()?;
            println!("{}", serde_json::to_string_pretty(&schemes)?);
        }
        OutputFormat::Quiet => {
            for name in registry.scheme_names() {
                println!("{}", name);
            }
        }
        OutputFormat::Human => {
            for name in registry.scheme_names() {
                let marker = if name == canonical { " (canonical)" } else { "" };
                println!(
                    "{}{}: {} book(s)",
                    name,
                    marker,
                    registry.books(name)?.len()
                );
            }
        }
    }

    Ok(())
}
