//! Zentinel Query Modification CLI entry point.
//!
//! Runs request URIs through the query modification middleware and prints
//! the URIs the next service would receive.

use anyhow::{bail, Context, Result};
use clap::Parser;
use http::{Request, Uri};
use std::convert::Infallible;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tower::{service_fn, Service, ServiceBuilder, ServiceExt};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zentinel_agent_query_modification::{QueryModification, QueryModificationLayer};

#[derive(Parser, Debug)]
#[command(name = "zentinel-query-modification")]
#[command(
    author,
    version,
    about = "Query parameter modification middleware for Zentinel"
)]
struct Args {
    /// Configuration file path (YAML or JSON)
    #[arg(short, long, env = "QUERY_MODIFICATION_CONFIG")]
    config: Option<PathBuf>,

    /// Instance name used in logs
    #[arg(long, default_value = "query-modification")]
    name: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit.
    #[arg(long)]
    example_config: bool,

    /// Validate configuration and exit.
    #[arg(long)]
    validate: bool,

    /// Request URIs to rewrite (read from stdin, one per line, if omitted)
    uris: Vec<String>,
}

fn print_example_config() {
    let example = r#"# Query Modification Configuration Example
#
# type: add | modify | delete
#
# Matchers (at least one, except for add):
#   paramName:       exact parameter name
#   paramNameRegex:  regex matched against parameter names
#   paramValueRegex: regex matched against parameter values
#
# newValue:      literal value; $1 is replaced with the original value
# newValueRegex: replacement template using paramValueRegex capture groups

# Rewrite any value ending in "password" (or "passw0rd") to "no-password"
type: modify
paramValueRegex: "^.*(p..sword)$"
newValueRegex: "no-$1"
"#;
    println!("{}", example);
}

async fn read_stdin_uris() -> Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut uris = Vec::new();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if !line.is_empty() {
            uris.push(line.to_string());
        }
    }

    Ok(uris)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if args.example_config {
        print_example_config();
        return Ok(());
    }

    let Some(config_path) = &args.config else {
        bail!("No configuration given (use --config or QUERY_MODIFICATION_CONFIG)");
    };
    let modification = QueryModification::from_file(args.name.clone(), config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    if args.validate {
        info!(config = %config_path.display(), "Configuration is valid");
        return Ok(());
    }

    let uris = if args.uris.is_empty() {
        read_stdin_uris().await?
    } else {
        args.uris
    };

    // The next service only reports the URI it received.
    let mut svc = ServiceBuilder::new()
        .layer(QueryModificationLayer::new(modification))
        .service(service_fn(|req: Request<()>| async move {
            Ok::<Uri, Infallible>(req.uri().clone())
        }));

    for raw in &uris {
        let req = Request::builder()
            .uri(raw.as_str())
            .body(())
            .with_context(|| format!("Invalid request URI: {}", raw))?;

        let rewritten = svc.ready().await?.call(req).await?;
        debug!(original = %raw, rewritten = %rewritten, "Rewrote request URI");
        println!("{}", rewritten);
    }

    Ok(())
}
