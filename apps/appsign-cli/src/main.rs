//! appsign - sign and verify requests from the command line.
//!
//! # Usage
//!
//! ```text
//! APPSIGN_SECRET=<64 chars> appsign sign --request req.json --context ctx.json
//! APPSIGN_SECRET=<64 chars> appsign verify --request req.json --headers headers.json
//! ```
//!
//! `req.json` holds `{"method", "path", "headers"?, "body"?}`, `ctx.json`
//! holds `{"spaceId", "envId", "userId" | "appId"}` and `headers.json` is a
//! flat object of header names to values. Results are printed to stdout as
//! JSON; logs go to stderr.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `APPSIGN_SECRET` | *(required)* | 64-character signing secret |
//! | `APPSIGN_TTL_MS` | `30000` | Default verification window |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use appsign_core::SigningConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{SignArgs, VerifyArgs};

/// Sign and verify requests with app and user identity context.
#[derive(Parser, Debug)]
#[command(name = "appsign", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign a request and print the headers to attach.
    Sign {
        /// JSON file describing the request.
        #[arg(long)]
        request: PathBuf,
        /// JSON file describing the identity context. Omit to sign without context.
        #[arg(long)]
        context: Option<PathBuf>,
        /// Signing time in epoch milliseconds. Defaults to now.
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Verify a signed request and print its identity context.
    Verify {
        /// JSON file describing the received request.
        #[arg(long)]
        request: PathBuf,
        /// JSON file with the received headers.
        #[arg(long)]
        headers: PathBuf,
        /// Accepted signature age in milliseconds. Defaults to `APPSIGN_TTL_MS`.
        #[arg(long)]
        ttl_ms: Option<i64>,
        /// Verification time in epoch milliseconds. Defaults to now.
        #[arg(long)]
        now: Option<i64>,
    },
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SigningConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level)?;

    let secret = std::env::var("APPSIGN_SECRET").context("APPSIGN_SECRET is not set")?;

    let output = match cli.command {
        Command::Sign {
            request,
            context,
            timestamp,
        } => commands::sign(&SignArgs {
            request,
            context,
            timestamp,
            secret,
        })?,
        Command::Verify {
            request,
            headers,
            ttl_ms,
            now,
        } => commands::verify(
            &VerifyArgs {
                request,
                headers,
                ttl_ms,
                now,
                secret,
            },
            &config,
        )?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
