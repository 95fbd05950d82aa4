//! isolation-gate
//!
//! A gateway that puts browser isolation in front of a web application.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────▶ trace / request-id
//!                 ──▶ fetch_metadata ──✗──▶ 403 (cross-site, non-navigational)
//!                 ──▶ timeout / body limit
//!                 ──▶ csp_nonce (nonce into request extensions)
//!                 ──▶ coop / coep
//!                 ──▶ upstream forwarder │ built-in page │ /healthz
//!     Client Response ◀── Vary, COOP, COEP, Report-To, CSP
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use isolation_gate::config::{load_config, GatewayConfig};
use isolation_gate::lifecycle::startup;
use isolation_gate::security::fetch_metadata::{FetchMetadata, FetchMetadataFilter};

#[derive(Parser)]
#[command(name = "isolation-gate", version)]
#[command(about = "Fetch Metadata, COOP, COEP and CSP nonce filters in front of a web app", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway (default)
    Serve,
    /// Load and validate the configuration, then exit
    CheckConfig,
    /// Show the Fetch Metadata decision for a hypothetical request
    Evaluate {
        /// Sec-Fetch-Site value
        #[arg(long)]
        site: Option<String>,
        /// Sec-Fetch-Mode value
        #[arg(long)]
        mode: Option<String>,
        /// Sec-Fetch-Dest value
        #[arg(long)]
        dest: Option<String>,
        #[arg(long, default_value = "GET")]
        method: String,
        #[arg(long, default_value = "/")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            startup::run(cli.config.as_deref()).await?;
        }
        Commands::CheckConfig => {
            let config = load(cli.config.as_deref())?;
            println!("{}", toml::to_string_pretty(&config)?);
            eprintln!("configuration OK");
        }
        Commands::Evaluate {
            site,
            mode,
            dest,
            method,
            path,
        } => {
            let config = load(cli.config.as_deref())?;
            if !config.fetch_metadata.enabled {
                println!("allow (fetch_metadata filter disabled)");
                return Ok(());
            }

            let filter = FetchMetadataFilter::new(config.fetch_metadata.exempted_paths.clone());
            let request = FetchMetadata {
                site: site.as_deref(),
                mode: mode.as_deref(),
                dest: dest.as_deref(),
                method: &method,
            };
            let decision = filter.admit(&path, &request);
            if filter.exempted_paths().contains(&path) {
                println!("{decision} (exempted path)");
            } else {
                println!("{decision}");
            }
        }
    }

    Ok(())
}

fn load(path: Option<&Path>) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(p) => load_config(p)?,
        None => GatewayConfig::default(),
    })
}
