//! Component wiring shared by the commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use inlay_fs::ResourceCache;
use inlay_page::{MinijinjaCompiler, Pages};
use inlay_server::AssetMount;
use inlay_style::{GrassCompiler, ModuleRegistry, StyleRenderer};

use crate::config::ConfigFile;

/// Directory named asset modules resolve under.
const VENDOR_DIR: &str = "vendor";

/// The wired pipeline components for one site.
pub struct Site {
    pub root: PathBuf,
    pub output: PathBuf,
    pub cache: Arc<ResourceCache>,
    pub pages: Arc<Pages>,
    pub styles: Arc<StyleRenderer>,
    pub assets: Vec<AssetMount>,
}

impl Site {
    /// Wire the components from a loaded configuration.
    pub fn from_config(config: &ConfigFile) -> Result<Site> {
        let root = std::fs::canonicalize(&config.site.root)
            .with_context(|| format!("Site root not found: {}", config.site.root))?;
        let output = join_root(&root, &config.site.output);

        let cache = Arc::new(ResourceCache::new(root.clone()));

        let mut registry = ModuleRegistry::new();
        for (name, base) in &config.styles.mounts {
            registry.mount(name.as_str(), join_root(&root, base));
        }

        let pages = Arc::new(Pages::new(Arc::clone(&cache), Arc::new(MinijinjaCompiler)));
        let styles = Arc::new(StyleRenderer::new(
            Arc::clone(&cache),
            Arc::new(registry),
            Arc::new(GrassCompiler),
        ));

        let assets = config
            .assets
            .iter()
            .map(|section| {
                let dir = match (&section.module, &section.path) {
                    (Some(module), _) => root.join(VENDOR_DIR).join(module),
                    (None, Some(path)) => join_root(&root, path),
                    (None, None) => anyhow::bail!(
                        "Asset mount {} needs a 'path' or 'module'",
                        section.route
                    ),
                };

                Ok(AssetMount {
                    route: section.route.clone(),
                    dir,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Site {
            root,
            output,
            cache,
            pages,
            styles,
            assets,
        })
    }
}

fn join_root(root: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
