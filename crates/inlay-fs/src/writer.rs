//! Output writing scoped to one directory.

use std::path::{Path, PathBuf};

use crate::cache::FsError;

/// A capability bound to one output directory.
///
/// The only operation is persisting named content beneath that directory;
/// each pipeline mount gets its own writer.
#[derive(Debug, Clone)]
pub struct Writer {
    dir: PathBuf,
}

impl Writer {
    /// Create a writer bound to a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory this writer persists under.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist content under the bound directory, appending `.{extension}`
    /// to the name when given.
    pub async fn write(
        &self,
        path: &str,
        content: &[u8],
        extension: Option<&str>,
    ) -> Result<(), FsError> {
        let name = match extension {
            Some(ext) => format!("{path}.{ext}"),
            None => path.to_string(),
        };
        let target = self.dir.join(name);

        tracing::info!("Writing {} bytes to {}", content.len(), target.display());

        tokio::fs::write(&target, content)
            .await
            .map_err(|e| FsError::Io {
                path: target,
                source: e,
            })
    }
}
