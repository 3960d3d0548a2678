#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the bubble map.
//!
//! Configuration comes from the file named by `BUBBLE_MAP_CONFIG` (if any)
//! plus the `BUBBLE_MAP_STATS`, `BUBBLE_MAP_GEO`, `BIND_ADDR` and `PORT`
//! environment variables.

use bubble_map_config::AppConfig;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = AppConfig::load(None)?;

    if let Err(e) = bubble_map_server::run_server(config).await {
        log::error!("Error fetching data: {e}");
        return Err(e.into());
    }

    Ok(())
}
