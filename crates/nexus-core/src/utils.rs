//! Utility helpers — path resolution and URL joining.

use std::path::PathBuf;

/// Get the Nexus data directory (e.g. `~/.nexus/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".nexus")
}

/// Build the streaming endpoint for a conversation.
///
/// Trailing slashes on `base_url` are ignored.
pub fn stream_url(base_url: &str, conversation_id: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{}/conversations/{}/stream", base, conversation_id)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
