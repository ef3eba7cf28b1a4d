//! Stylesheet rendering through the compiler capability.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::runtime::Handle;

use inlay_fs::{Category, FsError, ResourceCache, Writer};

use crate::compiler::{Compiler, ImportLoader, LoadedImport};
use crate::resolve::{ModuleRegistry, ResolveError};

/// Errors from stylesheet rendering.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Failed to compile {file}: {message}")]
    Compile { file: String, message: String },
}

/// Compiles SCSS resources from the `styles` category into CSS.
#[derive(Debug, Clone)]
pub struct StyleRenderer {
    cache: Arc<ResourceCache>,
    registry: Arc<ModuleRegistry>,
    compiler: Arc<dyn Compiler>,
}

impl StyleRenderer {
    pub fn new(
        cache: Arc<ResourceCache>,
        registry: Arc<ModuleRegistry>,
        compiler: Arc<dyn Compiler>,
    ) -> Self {
        Self {
            cache,
            registry,
            compiler,
        }
    }

    /// Render the named stylesheet resource to CSS text.
    ///
    /// Compilation is synchronous CPU work and runs on a blocking thread;
    /// import reads are bridged back onto the runtime so nested imports go
    /// through the same resolution and caching path as the entry file.
    pub async fn render(&self, name: &str) -> Result<String, StyleError> {
        let entry = self
            .cache
            .resource(Category::Styles, name, Some("scss"))
            .await?;
        let source = entry.text();
        let file = entry.path.display().to_string();

        let loader = CacheLoader {
            cache: Arc::clone(&self.cache),
            registry: Arc::clone(&self.registry),
            handle: Handle::current(),
        };
        let compiler = Arc::clone(&self.compiler);
        let entry_file = file.clone();

        tokio::task::spawn_blocking(move || compiler.compile(&source, &entry_file, &loader))
            .await
            .map_err(|e| StyleError::Compile {
                file,
                message: e.to_string(),
            })?
    }

    /// Render every stylesheet in the category, writing each output through
    /// the writer with the extension rewritten to `.css`.
    ///
    /// One stylesheet's failure fails the whole batch.
    pub async fn render_static(&self, writer: &Writer) -> Result<(), StyleError> {
        let names = self.cache.resources(Category::Styles, "scss").await?;

        try_join_all(names.iter().map(|name| async move {
            let css = self.render(name).await?;
            writer.write(name, css.as_bytes(), Some("css")).await?;
            Ok::<_, StyleError>(())
        }))
        .await?;

        Ok(())
    }
}

/// Loader that resolves imports against the mount registry and reads them
/// through the resource cache.
#[derive(Debug)]
struct CacheLoader {
    cache: Arc<ResourceCache>,
    registry: Arc<ModuleRegistry>,
    handle: Handle,
}

impl ImportLoader for CacheLoader {
    fn load(&self, path: &str, parent: Option<&str>) -> Result<LoadedImport, StyleError> {
        let resolved = self.registry.resolve(path, parent)?;
        let file = self
            .handle
            .block_on(self.cache.read(&resolved.path, Some("scss")))?;

        Ok(LoadedImport {
            contents: file.text(),
            file: resolved.file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    use crate::compiler::GrassCompiler;

    /// Test compiler that inlines `@import "..."` lines through the loader,
    /// threading each loaded file's logical identifier as the parent of its
    /// own imports.
    #[derive(Debug)]
    struct InliningCompiler;

    impl Compiler for InliningCompiler {
        fn compile(
            &self,
            source: &str,
            _file: &str,
            imports: &dyn ImportLoader,
        ) -> Result<String, StyleError> {
            expand(source, None, imports)
        }
    }

    fn expand(
        source: &str,
        parent: Option<&str>,
        imports: &dyn ImportLoader,
    ) -> Result<String, StyleError> {
        let mut out = String::new();
        for line in source.lines() {
            let request = line
                .trim()
                .strip_prefix("@import \"")
                .and_then(|rest| rest.strip_suffix("\";"));
            match request {
                Some(request) => {
                    let loaded = imports.load(request, parent)?;
                    out.push_str(&expand(&loaded.contents, Some(&loaded.file), imports)?);
                }
                None => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }

    fn site_with_kit() -> (tempfile::TempDir, Arc<ResourceCache>, Arc<ModuleRegistry>) {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("styles")).unwrap();
        fs::create_dir(temp.path().join("kit")).unwrap();

        let cache = Arc::new(ResourceCache::new(temp.path()));
        let mut registry = ModuleRegistry::new();
        registry.mount("kit", temp.path().join("kit"));

        (temp, cache, Arc::new(registry))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn imports_resolve_through_mounts_and_parents() {
        let (temp, cache, registry) = site_with_kit();
        fs::write(
            temp.path().join("styles/site.scss"),
            "@import \"kit/grid\";\n.site {}",
        )
        .unwrap();
        fs::write(
            temp.path().join("kit/grid.scss"),
            "@import \"vars\";\n.grid {}",
        )
        .unwrap();
        fs::write(temp.path().join("kit/_vars.scss"), "$width: 10px;").unwrap();

        let renderer = StyleRenderer::new(cache, registry, Arc::new(InliningCompiler));
        let css = renderer.render("site").await.unwrap();

        assert_eq!(css, "$width: 10px;\n.grid {}\n.site {}\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn grass_compiles_mounted_modules() {
        let (temp, cache, registry) = site_with_kit();
        fs::write(
            temp.path().join("styles/site.scss"),
            "@import \"kit/colors\";\n\nbody {\n  color: $accent;\n}\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("kit/colors.scss"),
            "@import \"shade\";\n$accent: #ff3366;\n",
        )
        .unwrap();
        fs::write(temp.path().join("kit/_shade.scss"), "$shade: #112233;\n").unwrap();

        let renderer = StyleRenderer::new(cache, registry, Arc::new(GrassCompiler));
        let css = renderer.render("site").await.unwrap();

        assert!(css.contains("color: #ff3366"), "got: {css}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unresolvable_import_fails_the_render() {
        let (temp, cache, registry) = site_with_kit();
        fs::write(temp.path().join("styles/site.scss"), "@import \"nope/x\";").unwrap();

        let renderer = StyleRenderer::new(cache, registry, Arc::new(InliningCompiler));
        let err = renderer.render("site").await.unwrap_err();

        assert!(matches!(
            err,
            StyleError::Resolve(ResolveError::UnresolvableImport(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_stylesheet_is_not_found() {
        let (_temp, cache, registry) = site_with_kit();

        let renderer = StyleRenderer::new(cache, registry, Arc::new(InliningCompiler));
        let err = renderer.render("absent").await.unwrap_err();

        assert!(matches!(err, StyleError::Fs(FsError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn render_static_writes_every_stylesheet_as_css() {
        let (temp, cache, registry) = site_with_kit();
        fs::write(temp.path().join("styles/site.scss"), ".site {}").unwrap();
        fs::write(temp.path().join("styles/print.scss"), ".print {}").unwrap();

        let out = tempdir().unwrap();
        let renderer = StyleRenderer::new(cache, registry, Arc::new(InliningCompiler));
        renderer
            .render_static(&Writer::new(out.path()))
            .await
            .unwrap();

        assert!(out.path().join("site.css").exists());
        assert!(out.path().join("print.css").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn one_failing_stylesheet_fails_the_batch() {
        let (temp, cache, registry) = site_with_kit();
        fs::write(temp.path().join("styles/site.scss"), ".site {}").unwrap();
        fs::write(temp.path().join("styles/broken.scss"), "@import \"nope/x\";").unwrap();

        let out = tempdir().unwrap();
        let renderer = StyleRenderer::new(cache, registry, Arc::new(InliningCompiler));

        assert!(renderer.render_static(&Writer::new(out.path())).await.is_err());
    }
}
