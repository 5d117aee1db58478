//! Shared CLI helpers — path expansion and stream event rendering.

use std::path::PathBuf;

use colored::Colorize;
use nexus_stream::{StreamData, StreamEvent};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Render one decoded message for the terminal.
pub fn render_event(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Chunk { content } => content.clone(),
        StreamEvent::Complete => "\n".to_string(),
        StreamEvent::Error { message } => format!("\n{} {}\n", "✗".red().bold(), message.red()),
        StreamEvent::Other(value) => format!("{}\n", value.to_string().dimmed()),
    }
}

/// Tracks how much of a stream has already been printed.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    printed: usize,
    raw: bool,
}

impl StreamPrinter {
    pub fn new(raw: bool) -> Self {
        Self { printed: 0, raw }
    }

    /// Text for the messages that arrived since the last call.
    pub fn take_new(&mut self, data: &StreamData) -> String {
        let fresh = data.messages.iter().skip(self.printed);
        let out: String = if self.raw {
            fresh.map(|m| format!("{m}\n")).collect()
        } else {
            fresh
                .map(|m| render_event(&StreamEvent::from_value(m)))
                .collect()
        };
        self.printed = data.messages.len();
        out
    }
}

/// Print the header shown before streaming starts.
pub fn print_banner(conversation_id: &str, base_url: &str) {
    eprintln!(
        "{} {} {}",
        "⇢ Nexus".cyan().bold(),
        format!("conversation {conversation_id}").bold(),
        format!("via {base_url}").dimmed()
    );
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn data(messages: Vec<serde_json::Value>) -> StreamData {
        StreamData {
            messages,
            is_done: false,
            outcome: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/foo/bar");
        assert!(result.ends_with("foo/bar"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        let result = expand_tilde("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn render_chunk_verbatim() {
        let event = StreamEvent::Chunk {
            content: "hello".into(),
        };
        assert_eq!(render_event(&event), "hello");
        assert_eq!(render_event(&StreamEvent::Complete), "\n");
    }

    #[test]
    fn printer_only_returns_new_messages() {
        let mut printer = StreamPrinter::new(false);
        let mut snapshot = data(vec![json!({"type": "chunk", "content": "Hel"})]);
        assert_eq!(printer.take_new(&snapshot), "Hel");

        snapshot.messages.push(json!({"type": "chunk", "content": "lo"}));
        assert_eq!(printer.take_new(&snapshot), "lo");
        assert_eq!(printer.take_new(&snapshot), "");
    }

    #[test]
    fn printer_raw_mode_prints_json_lines() {
        let mut printer = StreamPrinter::new(true);
        let snapshot = data(vec![json!({"x": 1}), json!({"type": "complete"})]);
        assert_eq!(
            printer.take_new(&snapshot),
            "{\"x\":1}\n{\"type\":\"complete\"}\n"
        );
    }
}
