//! Nexus CLI — entry point.
//!
//! # Commands
//!
//! - `nexus stream -c ID -m MESSAGE` — stream a reply from the conversation server
//! - `nexus status` — show the effective configuration

mod helpers;
mod status;
mod stream_cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use nexus_core::config::{get_config_path, load_config};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Nexus — stream conversation replies from the terminal
#[derive(Parser)]
#[command(name = "nexus", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.nexus/config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message and print the streamed reply
    Stream {
        /// Conversation identifier
        #[arg(short, long)]
        conversation: String,

        /// Message content to send
        #[arg(short, long)]
        message: String,

        /// Server base URL (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Print every decoded message as a JSON line
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show the effective configuration
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(helpers::expand_tilde)
        .unwrap_or_else(get_config_path);

    match cli.command {
        Commands::Stream {
            conversation,
            message,
            base_url,
            raw,
            logs,
        } => {
            init_logging(logs);
            let config = load_config(Some(&config_path));
            info!(conversation = %conversation, "streaming message");
            stream_cmd::run(&config, &conversation, &message, base_url, raw).await
        }
        Commands::Status => {
            let config = load_config(Some(&config_path));
            status::run(&config, &config_path)
        }
    }
}

/// Initialize tracing/logging. Logs go to stderr so stdout carries only the reply.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("nexus=debug,nexus_stream=debug,nexus_core=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stream_command() {
        let cli = Cli::try_parse_from([
            "nexus", "stream", "-c", "42", "-m", "hello", "--base-url", "http://x", "--raw",
        ])
        .unwrap();
        match cli.command {
            Commands::Stream {
                conversation,
                message,
                base_url,
                raw,
                logs,
            } => {
                assert_eq!(conversation, "42");
                assert_eq!(message, "hello");
                assert_eq!(base_url.as_deref(), Some("http://x"));
                assert!(raw);
                assert!(!logs);
            }
            Commands::Status => panic!("expected stream command"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["nexus", "status", "--config", "/tmp/nexus.json"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/nexus.json"));
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn stream_requires_message() {
        assert!(Cli::try_parse_from(["nexus", "stream", "-c", "42"]).is_err());
    }
}
