//! Dynamic HTTP serving for the inlay site pipeline.
//!
//! Pages, stylesheets, and static assets are rendered per request through
//! the shared resource cache; failures forward to one centralized error
//! responder.

pub mod routes;
pub mod server;

pub use routes::{ServeError, SiteState};
pub use server::{AssetMount, ServerConfig, ServerError, SiteServer};
