//! Dynamic site server command.

use std::path::PathBuf;

use anyhow::Result;

use inlay_server::{ServerConfig, SiteServer};

use crate::config;
use crate::site::Site;

/// Run the serve command.
pub async fn run(config_path: PathBuf, port: Option<u16>, open: bool) -> Result<()> {
    let config = config::load(&config_path)?;
    let site = Site::from_config(&config)?;

    let server_config = ServerConfig {
        host: config.serve.host.clone(),
        port: port.unwrap_or(config.serve.port),
        open,
        assets: site.assets.clone(),
    };

    tracing::info!("Starting site server on port {}", server_config.port);

    SiteServer::new(server_config, site.cache, site.pages, site.styles)
        .start()
        .await?;

    Ok(())
}
