//! Static asset copying into the output tree.

use std::path::Path;

use futures::future::try_join_all;

use inlay_fs::{FsError, ResourceCache, Writer};

/// Copy every file directly under `base` through the writer, each under its
/// original base name. Subdirectories are skipped; reads go through the
/// cache like every other file access.
pub async fn copy_assets(
    cache: &ResourceCache,
    base: &Path,
    writer: &Writer,
) -> Result<(), FsError> {
    let children = cache.tree(base).await?;

    try_join_all(children.iter().map(|path| async move {
        let meta = tokio::fs::metadata(path).await.map_err(|e| FsError::Io {
            path: path.clone(),
            source: e,
        })?;
        if meta.is_dir() {
            return Ok(());
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(());
        };

        let file = cache.read(path, None).await?;
        writer.write(name, &file.content, None).await
    }))
    .await?;

    Ok(())
}
