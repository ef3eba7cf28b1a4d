//! Named renderer mounts over an output tree.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use futures::future::try_join_all;

use inlay_fs::{FsError, ResourceCache, Writer};

/// Boxed error renderers report with; the pipeline does not interpret it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

type RenderFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;
type RendererFn = Box<dyn Fn(Writer) -> RenderFuture + Send + Sync>;

/// Errors from a pipeline pass.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to prepare output directory: {0}")]
    Output(#[from] FsError),

    #[error("Renderer {mount} failed: {source}")]
    Renderer {
        mount: String,
        #[source]
        source: BoxError,
    },
}

/// Renders all of the files for a static site.
///
/// Each registered mount owns one subdirectory of the output tree; a pass
/// ensures the directories exist and invokes every renderer concurrently
/// with a writer scoped to its subdirectory.
pub struct Pipeline {
    cache: Arc<ResourceCache>,
    output: PathBuf,
    mounts: Vec<(String, RendererFn)>,
}

impl Pipeline {
    pub fn new(cache: Arc<ResourceCache>, output: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            output: output.into(),
            mounts: Vec::new(),
        }
    }

    /// The output root this pipeline renders into.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Mount a renderer under an output subdirectory.
    pub fn mount<F, Fut>(&mut self, prefix: impl Into<String>, renderer: F)
    where
        F: Fn(Writer) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.mounts
            .push((prefix.into(), Box::new(move |writer| Box::pin(renderer(writer)))));
    }

    /// Evaluate every mounted renderer.
    ///
    /// Fail-fast: the first failure decides the overall result, and no
    /// partial output is cleaned up.
    pub async fn render_all(&self) -> Result<(), PipelineError> {
        self.cache.directory(&self.output).await?;

        try_join_all(self.mounts.iter().map(|(prefix, renderer)| async move {
            let path = self.output.join(prefix);

            tracing::info!("Rendering {prefix} into {}", path.display());

            self.cache.directory(&path).await?;
            renderer(Writer::new(path))
                .await
                .map_err(|source| PipelineError::Renderer {
                    mount: prefix.clone(),
                    source,
                })
        }))
        .await?;

        Ok(())
    }
}
