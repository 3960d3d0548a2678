#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the bubble map.
//!
//! `serve` starts the API server. `options` and `render` load the datasets
//! once and print JSON to stdout, which is handy for checking a dataset
//! pair without a browser.

use std::path::PathBuf;

use bubble_map_config::AppConfig;
use bubble_map_render::{RawSelection, RenderOutcome};
use bubble_map_server_models::ApiOptions;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bubble_map", about = "Crime rate bubble map")]
struct Cli {
    /// TOML configuration file (defaults to `$BUBBLE_MAP_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Statistics dataset URL or path, overriding the configuration
    #[arg(long, global = true)]
    stats: Option<String>,

    /// Geography dataset URL or path, overriding the configuration
    #[arg(long, global = true)]
    geo: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Print the available categories and years
    Options,
    /// Render one selection and print the marker layer as `GeoJSON`
    Render {
        /// Category key (e.g. `Violent_rate`); defaults to the first one
        #[arg(long)]
        category: Option<String>,
        /// Year; defaults to the earliest one
        #[arg(long)]
        year: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(stats) = cli.stats {
        config.data.stats = stats;
    }
    if let Some(geo) = cli.geo {
        config.data.geo = geo;
    }

    match cli.command {
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(bubble_map_server::run_server(config))
            })
            .await??;
        }
        Commands::Options => {
            let session = bubble_map_server::load_session(&config).await?;
            let options = ApiOptions::from(session.dataset());
            println!("{}", serde_json::to_string_pretty(&options)?);
        }
        Commands::Render { category, year } => {
            let mut session = bubble_map_server::load_session(&config).await?;
            let defaults = session.default_selection();
            let selection = RawSelection {
                category: category.or(defaults.category),
                year: year.or(defaults.year),
            };

            match session.select(selection) {
                RenderOutcome::Drawn { drawn, skipped } => {
                    log::info!("Drew {drawn} markers");
                    if !skipped.is_empty() {
                        log::warn!("{} states had no geometry", skipped.len());
                    }
                }
                RenderOutcome::InvalidSelection { message } | RenderOutcome::Failed { message } => {
                    return Err(message.into());
                }
                other => log::warn!("Nothing drawn: {}", other.kind()),
            }

            println!(
                "{}",
                serde_json::to_string_pretty(&session.layer().to_feature_collection())?
            );
        }
    }

    Ok(())
}
