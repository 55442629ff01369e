//! cdnip - identify which CDN serves an IP address.
//!
//! This is the command-line interface for the cdnip library.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use cdnip::config::defaults::DEFAULT_PROVIDER_TIMEOUT_MS;
use cdnip::{CdnIp, CdnIpError, LookupConfig, WarmReport};
use clap::Parser;
use futures::future::join_all;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Get the version string for cdnip
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments for the CDN lookup tool.
#[derive(Parser, Debug)]
#[clap(author, version, about = "Identify which CDN serves an IP address", long_about = None)]
struct Args {
    /// IP addresses to identify
    #[clap(required_unless_present_any = ["ranges", "warm", "list"])]
    ips: Vec<String>,

    /// Print the ranges published by the named provider
    #[clap(long, value_name = "NAME")]
    ranges: Option<String>,

    /// Fetch every provider's ranges into the cache
    #[clap(long)]
    warm: bool,

    /// List known providers
    #[clap(long)]
    list: bool,

    /// Delete cached range lists before doing anything else
    #[clap(long)]
    refresh: bool,

    /// Directory for cache files (default: home directory)
    #[clap(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Time budget for each provider in milliseconds
    #[clap(long, default_value_t = DEFAULT_PROVIDER_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Output results in JSON format
    #[clap(long)]
    json: bool,

    /// Enable verbose logging (use -vv for trace output)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// JSON output structure for a single lookup
#[derive(Debug, serde::Serialize)]
struct JsonMatch {
    ip: String,
    provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() {
    // Quick check for version before starting async runtime
    let args: Vec<String> = std::env::args().collect();
    if args.len() == 2 && (args[1] == "--version" || args[1] == "-V") {
        println!("cdnip {}", get_version());
        return;
    }

    let args = Args::parse();
    setup_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let result = runtime.block_on(async_main(args));

    // Give detached provider tasks a moment to finish their cache writes
    runtime.shutdown_timeout(Duration::from_millis(500));

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Map the verbosity count to a tracing filter
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "warn,cdnip=debug",
        _ => "warn,cdnip=trace",
    }
}

/// Sets up the tracing subscriber; `RUST_LOG` overrides `-v`.
fn setup_logging(verbose: u8) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> Result<LookupConfig> {
    let mut builder =
        LookupConfig::builder().provider_timeout(Duration::from_millis(args.timeout_ms));
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_dir(dir);
    }
    Ok(builder.build()?)
}

async fn async_main(args: Args) -> Result<i32> {
    let config = build_config(&args)?;
    debug!(?config, "starting");
    let cdn = CdnIp::with_config(config)?;
    let mut exit_code = 0;

    if args.refresh {
        cdn.clear_caches().await?;
    }

    if args.list {
        for name in cdn.providers() {
            println!("{}", name);
        }
    }

    if args.warm {
        let report = cdn.warm_all().await;
        display_warm_report(&report, args.json)?;
    }

    if let Some(name) = &args.ranges {
        match cdn.fetch(name).await {
            Ok(ranges) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&ranges)?);
                } else {
                    for range in ranges {
                        println!("{}", range);
                    }
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                exit_code = 1;
            }
        }
    }

    if !args.ips.is_empty() {
        let results = lookup_all(&cdn, &args.ips).await;
        if results.iter().any(|r| r.error.is_some()) {
            exit_code = 1;
        }
        if args.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            for result in &results {
                match &result.error {
                    Some(e) => eprintln!("Error: {}", e),
                    None => println!("{}", format_match(&result.ip, result.provider.as_deref())),
                }
            }
        }
    }

    Ok(exit_code)
}

/// Look up every address concurrently, keeping input order
async fn lookup_all(cdn: &CdnIp, ips: &[String]) -> Vec<JsonMatch> {
    let lookups = ips.iter().map(|ip| async move {
        match cdn.lookup_str(ip).await {
            Ok(provider) => JsonMatch {
                ip: ip.clone(),
                provider,
                error: None,
            },
            Err(e @ CdnIpError::InvalidIp(_)) => JsonMatch {
                ip: ip.clone(),
                provider: None,
                error: Some(e.to_string()),
            },
            Err(e) => JsonMatch {
                ip: ip.clone(),
                provider: None,
                error: Some(format!("lookup failed: {}", e)),
            },
        }
    });
    join_all(lookups).await
}

/// Format one lookup result as a tab-separated line
fn format_match(ip: &str, provider: Option<&str>) -> String {
    format!("{}\t{}", ip, provider.unwrap_or("-"))
}

/// Display the outcome of a cache warm-up
fn display_warm_report(report: &WarmReport, json: bool) -> Result<()> {
    if json {
        let value: serde_json::Map<String, serde_json::Value> = report
            .results
            .iter()
            .map(|(name, outcome)| {
                let entry = match outcome {
                    Ok(count) => serde_json::json!({ "ranges": count }),
                    Err(e) => serde_json::json!({ "error": e }),
                };
                (name.clone(), entry)
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for (name, count) in report.succeeded() {
        println!("{:<12} {} ranges", name, count);
    }
    for (name, error) in report.failed() {
        println!("{:<12} failed: {}", name, error);
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
