//! Versemark CLI
//!
//! Command-line interface for versemark - verse bookmarks and labels.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use versemark_core::{BookmarkId, BookmarkSortOrder, BookmarkStyle, Config, LabelId, Store, Verse, VerseRange};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "versemark")]
#[command(about = "Versemark - verse bookmarks and labels")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Versification scheme for references (defaults to default_scheme)
    #[arg(short, long, global = true)]
    scheme: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage bookmarks
    #[command(alias = "bm")]
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommands,
    },
    /// Manage labels
    Label {
        #[command(subcommand)]
        command: LabelCommands,
    },
    /// Attach a label to a bookmark
    Attach {
        bookmark: BookmarkId,
        label: LabelId,
    },
    /// Detach a label from a bookmark
    Detach {
        bookmark: BookmarkId,
        label: LabelId,
    },
    /// List loaded versification schemes
    Schemes,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum BookmarkCommands {
    /// Bookmark a verse or range (e.g. Gen.1.1-3)
    #[command(alias = "create")]
    Add {
        range: VerseRange,
        /// Notes to keep with the bookmark
        #[arg(short, long)]
        note: Option<String>,
        /// Label ids to attach
        #[arg(short, long)]
        label: Vec<LabelId>,
    },
    /// List bookmarks
    #[command(alias = "ls")]
    List {
        /// Sort order: bible-order or created-at
        #[arg(short, long, default_value = "bible-order")]
        order: BookmarkSortOrder,
        /// Only bookmarks with this label
        #[arg(short, long, conflicts_with = "unlabelled")]
        label: Option<LabelId>,
        /// Only bookmarks without labels
        #[arg(short, long)]
        unlabelled: bool,
    },
    /// Show a bookmark
    Show { id: BookmarkId },
    /// Bookmarks containing a verse
    At { verse: Verse },
    /// Bookmarks starting exactly at a verse
    Starting {
        verse: Verse,
        /// Only bookmarks with this label
        #[arg(short, long)]
        label: Option<LabelId>,
    },
    /// Bookmarks overlapping a range
    Range { range: VerseRange },
    /// Bookmarks overlapping a book (OSIS id, e.g. Ps)
    Book { book: String },
    /// Move a bookmark to the top of the recent list
    Touch { id: BookmarkId },
    /// Replace the labels of a bookmark
    Labels { id: BookmarkId, labels: Vec<LabelId> },
    /// Delete a bookmark
    #[command(alias = "rm")]
    Delete { id: BookmarkId },
}

#[derive(Subcommand)]
enum LabelCommands {
    /// Create a label
    #[command(alias = "add")]
    Create {
        name: String,
        /// Style, e.g. blue-highlight
        #[arg(long)]
        style: Option<BookmarkStyle>,
    },
    /// List labels with bookmark counts
    #[command(alias = "ls")]
    List,
    /// Rename a label
    Rename { id: LabelId, name: String },
    /// Set a label's style ("none" clears it)
    Style { id: LabelId, style: String },
    /// Delete a label
    #[command(alias = "rm")]
    Delete { id: LabelId },
    /// Show the read-aloud label, creating it if needed
    Speak,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, versification_dir, canonical_scheme, default_scheme, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_deref();

    // Config commands work even when the store cannot be opened
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    if let Commands::Schemes = &cli.command {
        return commands::schemes::list(&config, &output);
    }

    let store = Store::open_with_config(&config)?;
    let scheme = cli.scheme.unwrap_or_else(|| config.default_scheme.clone());
    debug!("Using scheme {}", scheme);

    match cli.command {
        Commands::Bookmark { command } => handle_bookmark_command(command, &store, &scheme, &output),
        Commands::Label { command } => handle_label_command(command, &store, &output),
        Commands::Attach { bookmark, label } => {
            commands::label::attach(&store, bookmark, label, &output)
        }
        Commands::Detach { bookmark, label } => {
            commands::label::detach(&store, bookmark, label, &output)
        }
        Commands::Schemes | Commands::Config { .. } => Ok(()), // Handled above
    }
}

fn handle_bookmark_command(
    command: BookmarkCommands,
    store: &Store,
    scheme: &str,
    output: &Output,
) -> Result<()> {
    match command {
        BookmarkCommands::Add { range, note, label } => {
            commands::bookmark::add(store, range, scheme, note, label, output)
        }
        BookmarkCommands::List {
            order,
            label,
            unlabelled,
        } => commands::bookmark::list(store, order, label, unlabelled, scheme, output),
        BookmarkCommands::Show { id } => commands::bookmark::show(store, id, scheme, output),
        BookmarkCommands::At { verse } => commands::bookmark::at(store, verse, scheme, output),
        BookmarkCommands::Starting { verse, label } => {
            commands::bookmark::starting(store, verse, label, scheme, output)
        }
        BookmarkCommands::Range { range } => {
            commands::bookmark::range(store, range, scheme, output)
        }
        BookmarkCommands::Book { book } => commands::bookmark::book(store, book, scheme, output),
        BookmarkCommands::Touch { id } => commands::bookmark::touch(store, id, scheme, output),
        BookmarkCommands::Labels { id, labels } => {
            commands::bookmark::set_labels(store, id, labels, output)
        }
        BookmarkCommands::Delete { id } => commands::bookmark::delete(store, id, output),
    }
}

fn handle_label_command(command: LabelCommands, store: &Store, output: &Output) -> Result<()> {
    match command {
        LabelCommands::Create { name, style } => {
            commands::label::create(store, name, style, output)
        }
        LabelCommands::List => commands::label::list(store, output),
        LabelCommands::Rename { id, name } => commands::label::rename(store, id, name, output),
        LabelCommands::Style { id, style } => commands::label::restyle(store, id, style, output),
        LabelCommands::Delete { id } => commands::label::delete(store, id, output),
        LabelCommands::Speak => commands::label::speak(store, output),
    }
}

/// Initialize logging to stderr, or to the configured log file
///
/// The level comes from VERSEMARK_LOG (default: warn).
fn init_logging(config: &Config) {
    let log_level = std::env::var("VERSEMARK_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!(
        "versemark_core={},versemark={}",
        log_level, log_level
    ));

    let Some(log_path) = config.log_file.as_ref() else {
        // Ignore error if already initialized
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bookmark_add() {
        let cli = Cli::try_parse_from([
            "versemark", "bookmark", "add", "Gen.1.1-3", "-n", "In the beginning", "-l", "4",
            "-l", "7",
        ])
        .unwrap();

        match cli.command {
            Commands::Bookmark {
                command: BookmarkCommands::Add { range, note, label },
            } => {
                assert_eq!(range, "Gen.1.1-3".parse::<VerseRange>().unwrap());
                assert_eq!(note.as_deref(), Some("In the beginning"));
                assert_eq!(label, vec![LabelId(4), LabelId(7)]);
            }
            _ => panic!("expected bookmark add"),
        }
    }

    #[test]
    fn test_parse_list_order_and_scheme() {
        let cli = Cli::try_parse_from([
            "versemark", "--scheme", "Titled", "bm", "ls", "--order", "created-at",
        ])
        .unwrap();

        assert_eq!(cli.scheme.as_deref(), Some("Titled"));
        match cli.command {
            Commands::Bookmark {
                command: BookmarkCommands::List { order, .. },
            } => assert_eq!(order, BookmarkSortOrder::CreatedAt),
            _ => panic!("expected bookmark list"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_reference() {
        assert!(Cli::try_parse_from(["versemark", "bookmark", "at", "Genesis"]).is_err());
        assert!(Cli::try_parse_from(["versemark", "label", "create", "x", "--style", "glitter"])
            .is_err());
    }
}
