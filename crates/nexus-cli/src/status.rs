//! `nexus status` — show the effective configuration.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use nexus_core::config::Config;

/// Run the status command.
pub fn run(config: &Config, config_path: &Path) -> Result<()> {
    println!();
    println!("{}", "⇢ Nexus Status".cyan().bold());
    println!();

    let config_exists = config_path.exists();
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );

    println!("  {:<18} {}", "Server:".bold(), config.stream.base_url);

    println!(
        "  {:<18} {} | {}",
        "Timing:".bold(),
        format!("connect timeout: {} ms", config.stream.connect_timeout_ms).dimmed(),
        format!("grace period: {} ms", config.stream.grace_period_ms).dimmed(),
    );

    let sweep = if config.stream.sweep_interval_ms == 0 {
        "on access only".to_string()
    } else {
        format!("every {} ms", config.stream.sweep_interval_ms)
    };
    println!("  {:<18} {}", "Sweep:".bold(), sweep.dimmed());
    println!(
        "  {:<18} {}",
        "Poll interval:".bold(),
        format!("{} ms", config.cli.poll_interval_ms).dimmed()
    );

    println!();

    Ok(())
}
