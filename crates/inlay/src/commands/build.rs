//! Static site build command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use inlay_static::{copy_assets, Pipeline};

use crate::config;
use crate::site::Site;

/// Run the build command.
pub async fn run(config_path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let config = config::load(&config_path)?;
    let site = Site::from_config(&config)?;
    let output = output.unwrap_or_else(|| site.output.clone());

    tracing::info!("Building site into {}", output.display());

    let mut pipeline = Pipeline::new(Arc::clone(&site.cache), output);

    let styles = Arc::clone(&site.styles);
    pipeline.mount("css", move |writer| {
        let styles = Arc::clone(&styles);
        async move {
            styles.render_static(&writer).await?;
            Ok(())
        }
    });

    let pages = Arc::clone(&site.pages);
    pipeline.mount("", move |writer| {
        let pages = Arc::clone(&pages);
        async move {
            pages.render_static(&writer).await?;
            Ok(())
        }
    });

    for mount in &site.assets {
        let cache = Arc::clone(&site.cache);
        let dir = mount.dir.clone();
        pipeline.mount(mount.route.as_str(), move |writer| {
            let cache = Arc::clone(&cache);
            let dir = dir.clone();
            async move {
                copy_assets(&cache, &dir, &writer).await?;
                Ok(())
            }
        });
    }

    pipeline.render_all().await?;

    tracing::info!("Site built");

    Ok(())
}
