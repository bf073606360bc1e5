//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::{DateTime, Utc};
use serde::Serialize;

use versemark_core::{BookmarkId, Label};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// A bookmark as shown to the user, with its range rendered in one scheme
#[derive(Debug, Clone, Serialize)]
pub struct BookmarkView {
    pub id: BookmarkId,
    pub reference: String,
    pub scheme: String,
    pub notes: Option<String>,
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single bookmark
    pub fn print_bookmark(&self, bookmark: &BookmarkView) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:        {}", bookmark.id);
                println!("Reference: {} ({})", bookmark.reference, bookmark.scheme);
                if !bookmark.labels.is_empty() {
                    println!("Labels:    {}", bookmark.labels.join(", "));
                }
                println!(
                    "Created:   {}",
                    bookmark.created_at.format("%Y-%m-%d %H:%M")
                );
                if let Some(ref notes) = bookmark.notes {
                    println!();
                    println!("{}", notes);
                }
            }
            OutputFormat::Json => print_json(bookmark),
            OutputFormat::Quiet => {
                println!("{}", bookmark.id);
            }
        }
    }

    /// Print a list of bookmarks
    pub fn print_bookmarks(&self, bookmarks: &[BookmarkView]) {
        match self.format {
            OutputFormat::Human => {
                if bookmarks.is_empty() {
                    println!("No bookmarks found.");
                    return;
                }
                for bookmark in bookmarks {
                    let labels = if bookmark.labels.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", bookmark.labels.join(", "))
                    };
                    let notes = bookmark
                        .notes
                        .as_deref()
                        .map(|n| format!(" | {}", truncate_line(n, 40)))
                        .unwrap_or_default();
                    println!(
                        "{:>5} | {}{}{}",
                        bookmark.id, bookmark.reference, labels, notes
                    );
                }
                println!("\n{} bookmark(s)", bookmarks.len());
            }
            OutputFormat::Json => print_json(&bookmarks),
            OutputFormat::Quiet => {
                for bookmark in bookmarks {
                    println!("{}", bookmark.id);
                }
            }
        }
    }

    /// Print a single label
    pub fn print_label(&self, label: &Label) {
        match self.format {
            OutputFormat::Human => {
                println!("{:>5} | {}{}", label.id, display_name(label), style_suffix(label));
            }
            OutputFormat::Json => print_json(label),
            OutputFormat::Quiet => {
                println!("{}", label.id);
            }
        }
    }

    /// Print labels with the number of bookmarks carrying each
    pub fn print_labels(&self, labels: &[(Label, i64)]) {
        match self.format {
            OutputFormat::Human => {
                if labels.is_empty() {
                    println!("No labels found.");
                    return;
                }
                for (label, count) in labels {
                    println!(
                        "{:>5} | {}{} ({})",
                        label.id,
                        display_name(label),
                        style_suffix(label),
                        count
                    );
                }
                println!("\n{} label(s)", labels.len());
            }
            OutputFormat::Json => {
                let json_labels: Vec<_> = labels
                    .iter()
                    .map(|(label, count)| {
                        serde_json::json!({
                            "id": label.id,
                            "name": label.name,
                            "bookmark_style": label.bookmark_style,
                            "count": count
                        })
                    })
                    .collect();
                print_json(&json_labels);
            }
            OutputFormat::Quiet => {
                for (label, _) in labels {
                    println!("{}", label.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Label name for display; the reserved label has an empty name
fn display_name(label: &Label) -> &str {
    if label.name.is_empty() {
        "(unnamed)"
    } else {
        &label.name
    }
}

fn style_suffix(label: &Label) -> String {
    label
        .bookmark_style
        .map(|style| format!(" <{}>", style))
        .unwrap_or_default()
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use versemark_core::{BookmarkStyle, LabelId};

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("\u{2014}\u{2014}\u{2014}\u{2014}\u{2014}", 4), "\u{2014}...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("line one\nline two", 20), "line one");
    }

    #[test]
    fn test_label_display() {
        let speak = Label {
            id: LabelId(1),
            name: String::new(),
            bookmark_style: Some(BookmarkStyle::Speak),
        };
        assert_eq!(display_name(&speak), "(unnamed)");
        assert_eq!(style_suffix(&speak), " <SPEAK>");

        let plain = Label {
            id: LabelId(2),
            name: "Prayer".to_string(),
            bookmark_style: None,
        };
        assert_eq!(display_name(&plain), "Prayer");
        assert_eq!(style_suffix(&plain), "");
    }
}
