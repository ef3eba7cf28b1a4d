//! Site server bootstrap.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use inlay_fs::ResourceCache;
use inlay_page::Pages;
use inlay_style::StyleRenderer;

use crate::routes::{self, AssetState, SiteState};

/// One static-asset mount: a route prefix mapped onto a base directory.
#[derive(Debug, Clone)]
pub struct AssetMount {
    pub route: String,
    pub dir: PathBuf,
}

/// Configuration for the site server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Open a browser on start
    pub open: bool,

    /// Static-asset mounts
    pub assets: Vec<AssetMount>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            open: false,
            assets: Vec::new(),
        }
    }
}

/// Errors from server bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),
}

/// Dynamic site server: pages, stylesheets, and static assets rendered per
/// request through the shared resource cache.
pub struct SiteServer {
    config: ServerConfig,
    cache: Arc<ResourceCache>,
    pages: Arc<Pages>,
    styles: Arc<StyleRenderer>,
}

impl SiteServer {
    pub fn new(
        config: ServerConfig,
        cache: Arc<ResourceCache>,
        pages: Arc<Pages>,
        styles: Arc<StyleRenderer>,
    ) -> Self {
        Self {
            config,
            cache,
            pages,
            styles,
        }
    }

    /// Build the router: stylesheets under `/styles/`, one sub-router per
    /// asset mount, and pages on the fallback route.
    pub fn router(&self) -> Router {
        let state = SiteState {
            pages: Arc::clone(&self.pages),
            styles: Arc::clone(&self.styles),
        };

        let mut app = Router::new()
            .route("/styles/{*path}", get(routes::style))
            .fallback(get(routes::page))
            .with_state(state);

        for mount in &self.config.assets {
            let assets = Router::new()
                .route("/{*path}", get(routes::asset))
                .with_state(AssetState {
                    cache: Arc::clone(&self.cache),
                    base: mount.dir.clone(),
                });

            app = app.nest(&format!("/{}", mount.route), assets);
        }

        app
    }

    /// Start serving.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        let app = self.router();

        tracing::info!("Serving site at http://{addr}");

        if self.config.open {
            let _ = open::that(format!("http://{addr}"));
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}
