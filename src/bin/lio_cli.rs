//! LIO Command Line Interface
//!
//! Inspects a lattice policy and performs flow-checked copies between the
//! file channels it declares. This binary is a trusted driver: it is the one
//! place that runs labeled computations.
//!
//! # Usage
//!
//! ```bash
//! # List the named levels of a policy
//! lio_cli --config lattice.yaml levels
//!
//! # May data at `alice_only` reach `team`?
//! lio_cli check alice_only team
//!
//! # Copy the inbox channel to the report channel if the policy allows it
//! LIO_CONFIG=lattice.yaml lio_cli copy inbox report --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use lio::{copy_checked, LatticeConfig, LioError};

#[derive(Parser)]
#[command(name = "lio_cli")]
#[command(version = "0.1.0")]
#[command(about = "Inspect lattice policies and run flow-checked copies")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Lattice policy file
    #[arg(long, short, global = true, env = "LIO_CONFIG", default_value = "lattice.yaml")]
    config: PathBuf,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the named levels of the policy
    Levels,

    /// Report whether data at one level may flow to another
    Check {
        /// Level name (or `bot` / `top`) the data is labeled with
        from: String,
        /// Level name (or `bot` / `top`) of the destination
        to: String,
    },

    /// Copy one channel's file to another if the flow is permitted
    Copy {
        /// Channel to read
        source: String,
        /// Channel to write
        sink: String,
    },
}

/// What a command reports back to `main`
enum Outcome {
    Done,
    Denied,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = LatticeConfig::load(&cli.config).and_then(|config| match &cli.command {
        Commands::Levels => cmd_levels(&config, cli.json),
        Commands::Check { from, to } => cmd_check(&config, from, to, cli.json),
        Commands::Copy { source, sink } => cmd_copy(&config, source, sink, cli.json),
    });

    match result {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Denied) => ExitCode::from(1),
        Err(e) => {
            if cli.json {
                println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::from(2)
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_levels(config: &LatticeConfig, json: bool) -> anyhow::Result<Outcome> {
    let mut rows = Vec::with_capacity(config.levels.len());
    for name in config.levels.keys() {
        rows.push((name.as_str(), config.level(name)?));
    }

    if json {
        let levels: serde_json::Map<String, serde_json::Value> = rows
            .iter()
            .map(|(name, level)| (name.to_string(), serde_json::json!(level.to_string())))
            .collect();
        print_json(&serde_json::json!({
            "principals": config.principals,
            "levels": levels,
        }))?;
    } else {
        println!("{} {}", "principals:".bold(), config.principals.join(", "));
        for (name, level) in rows {
            println!("  {:<16} {}", name.cyan(), level);
        }
    }
    Ok(Outcome::Done)
}

fn cmd_check(
    config: &LatticeConfig,
    from: &str,
    to: &str,
    json: bool,
) -> anyhow::Result<Outcome> {
    let from_level = config.level(from)?;
    let to_level = config.level(to)?;
    let allowed = from_level.can_flow_to(&to_level);

    if json {
        print_json(&serde_json::json!({
            "from": from_level.to_string(),
            "to": to_level.to_string(),
            "allowed": allowed,
        }))?;
    } else if allowed {
        println!(
            "{} {} ({}) may flow to {} ({})",
            "ALLOW".green().bold(),
            from,
            from_level,
            to,
            to_level
        );
    } else {
        println!(
            "{} {} ({}) may not flow to {} ({})",
            "DENY".red().bold(),
            from,
            from_level,
            to,
            to_level
        );
    }

    Ok(if allowed { Outcome::Done } else { Outcome::Denied })
}

fn cmd_copy(
    config: &LatticeConfig,
    source: &str,
    sink: &str,
    json: bool,
) -> anyhow::Result<Outcome> {
    let src = config.source(source)?;
    let snk = config.sink(sink)?;

    let copy = match copy_checked(&src, &snk) {
        Ok(copy) => copy,
        Err(LioError::FlowViolation { from, to }) => {
            if json {
                print_json(&serde_json::json!({
                    "copied": false,
                    "from": from.to_string(),
                    "to": to.to_string(),
                }))?;
            } else {
                println!(
                    "{} channel '{}' ({}) may not flow to '{}' ({})",
                    "DENY".red().bold(),
                    source,
                    from,
                    sink,
                    to
                );
            }
            return Ok(Outcome::Denied);
        }
        Err(other) => return Err(other.into()),
    };

    copy.unsafe_run()
        .with_context(|| format!("Failed to copy channel '{source}' to '{sink}'"))?;

    if json {
        print_json(&serde_json::json!({
            "copied": true,
            "from": src.label().to_string(),
            "to": snk.label().to_string(),
        }))?;
    } else {
        println!(
            "{} copied '{}' ({}) to '{}' ({})",
            "OK".green(),
            source,
            src.label(),
            sink,
            snk.label()
        );
    }
    Ok(Outcome::Done)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}
