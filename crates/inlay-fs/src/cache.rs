//! Mtime-keyed file cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Errors from file reads and directory operations.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            FsError::NotFound(path)
        } else {
            FsError::Io { path, source }
        }
    }
}

/// The fixed resource base directories of a site tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Pages,
    Data,
    Layouts,
    Styles,
}

impl Category {
    /// Directory name under the site root.
    pub fn dir(self) -> &'static str {
        match self {
            Category::Pages => "pages",
            Category::Data => "data",
            Category::Layouts => "layouts",
            Category::Styles => "styles",
        }
    }
}

/// A file read from disk, frozen together with the metadata it was read under.
#[derive(Debug)]
pub struct CachedFile {
    /// Path the file was read from, extension included.
    pub path: PathBuf,

    /// Raw content.
    pub content: Vec<u8>,

    /// Modification time observed immediately before the content was read.
    pub modified: SystemTime,

    /// Media type derived from the path's extension.
    pub content_type: String,
}

impl CachedFile {
    /// Content as UTF-8 text, lossily converted.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

/// Reads files from a site tree, memoizing content keyed by path and
/// invalidated by modification time.
///
/// A cache hit costs one stat call and never a content read. Staleness is
/// judged by mtime alone: two writes landing within the same timestamp
/// granularity leave the first content cached.
#[derive(Debug)]
pub struct ResourceCache {
    root: PathBuf,
    entries: Mutex<HashMap<PathBuf, Arc<CachedFile>>>,
}

impl ResourceCache {
    /// Create a cache over a site root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The site root this cache resolves categories under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a file, appending `.{extension}` to the path when given.
    ///
    /// Returns the cached entry when the stored modification time matches a
    /// fresh stat; otherwise (re)reads the content and replaces the entry.
    pub async fn read(
        &self,
        path: impl AsRef<Path>,
        extension: Option<&str>,
    ) -> Result<Arc<CachedFile>, FsError> {
        let path = match extension {
            Some(ext) => {
                let mut joined = path.as_ref().as_os_str().to_os_string();
                joined.push(".");
                joined.push(ext);
                PathBuf::from(joined)
            }
            None => path.as_ref().to_path_buf(),
        };

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| FsError::from_io(path.clone(), e))?;
        let modified = meta
            .modified()
            .map_err(|e| FsError::from_io(path.clone(), e))?;

        {
            let entries = self.entries.lock().expect("cache table lock poisoned");
            if let Some(cached) = entries.get(&path) {
                if cached.modified == modified {
                    tracing::debug!("Cache hit for {}", path.display());
                    return Ok(Arc::clone(cached));
                }
            }
        }

        tracing::debug!("Cache miss for {}", path.display());

        let content = tokio::fs::read(&path)
            .await
            .map_err(|e| FsError::from_io(path.clone(), e))?;

        let file = Arc::new(CachedFile {
            content,
            modified,
            content_type: mime_guess::from_path(&path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            path: path.clone(),
        });

        // Replaces any stale entry; a racing same-path read may store again,
        // and the last store wins.
        self.entries
            .lock()
            .expect("cache table lock poisoned")
            .insert(path, Arc::clone(&file));

        Ok(file)
    }

    /// Read a named resource under one of the fixed category directories.
    pub async fn resource(
        &self,
        category: Category,
        name: &str,
        extension: Option<&str>,
    ) -> Result<Arc<CachedFile>, FsError> {
        self.read(self.root.join(category.dir()).join(name), extension)
            .await
    }

    /// Ensure a directory and all missing ancestors exist.
    pub async fn directory(&self, path: impl AsRef<Path>) -> Result<(), FsError> {
        let path = path.as_ref();
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| FsError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// List the immediate children of a directory.
    pub async fn tree(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>, FsError> {
        let path = path.as_ref();
        let mut dir = tokio::fs::read_dir(path)
            .await
            .map_err(|e| FsError::from_io(path.to_path_buf(), e))?;

        let mut children = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| FsError::from_io(path.to_path_buf(), e))?
        {
            children.push(entry.path());
        }
        children.sort();

        Ok(children)
    }

    /// List the files directly under a category directory whose extension
    /// matches, as logical names with directory and extension stripped.
    pub async fn resources(
        &self,
        category: Category,
        extension: &str,
    ) -> Result<Vec<String>, FsError> {
        let children = self.tree(self.root.join(category.dir())).await?;

        let mut names = Vec::new();
        for child in children {
            if child.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            if let Some(stem) = child.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn set_mtime(path: &Path, time: SystemTime) {
        fs::OpenOptions::new()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    fn fixed_time() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    #[tokio::test]
    async fn returns_stale_content_when_mtime_is_unchanged() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("page.yml");
        let cache = ResourceCache::new(temp.path());

        fs::write(&path, "first").unwrap();
        set_mtime(&path, fixed_time());

        let cached = cache.read(&path, None).await.unwrap();
        assert_eq!(cached.content, b"first");

        // Rewrite with different content but force the original timestamp.
        fs::write(&path, "second").unwrap();
        set_mtime(&path, fixed_time());

        let cached = cache.read(&path, None).await.unwrap();
        assert_eq!(cached.content, b"first");
    }

    #[tokio::test]
    async fn rereads_and_replaces_entry_when_mtime_changes() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("page.yml");
        let cache = ResourceCache::new(temp.path());

        fs::write(&path, "first").unwrap();
        set_mtime(&path, fixed_time());
        assert_eq!(cache.read(&path, None).await.unwrap().content, b"first");

        fs::write(&path, "second").unwrap();
        set_mtime(&path, fixed_time() + Duration::from_secs(10));

        let cached = cache.read(&path, None).await.unwrap();
        assert_eq!(cached.content, b"second");

        // The replaced entry serves subsequent hits.
        let cached = cache.read(&path, None).await.unwrap();
        assert_eq!(cached.content, b"second");
    }

    #[tokio::test]
    async fn appends_extension_before_reading() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("site.scss"), "body {}").unwrap();
        let cache = ResourceCache::new(temp.path());

        let cached = cache
            .read(temp.path().join("site"), Some("scss"))
            .await
            .unwrap();

        assert_eq!(cached.content, b"body {}");
        assert!(cached.path.ends_with("site.scss"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp = tempdir().unwrap();
        let cache = ResourceCache::new(temp.path());

        let err = cache.read(temp.path().join("absent"), None).await.unwrap_err();

        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[tokio::test]
    async fn derives_content_type_from_extension() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("main.css"), "body {}").unwrap();
        let cache = ResourceCache::new(temp.path());

        let cached = cache.read(temp.path().join("main.css"), None).await.unwrap();

        assert_eq!(cached.content_type, "text/css");
    }

    #[tokio::test]
    async fn resource_resolves_under_category_directory() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("layouts")).unwrap();
        fs::write(temp.path().join("layouts/base.html"), "<html>").unwrap();
        let cache = ResourceCache::new(temp.path());

        let cached = cache
            .resource(Category::Layouts, "base", Some("html"))
            .await
            .unwrap();

        assert_eq!(cached.content, b"<html>");
    }

    #[tokio::test]
    async fn directory_is_idempotent() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("a/b/c");
        let cache = ResourceCache::new(temp.path());

        cache.directory(&path).await.unwrap();
        cache.directory(&path).await.unwrap();

        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn tree_lists_immediate_children() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("one.txt"), "").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/nested.txt"), "").unwrap();
        let cache = ResourceCache::new(temp.path());

        let children = cache.tree(temp.path()).await.unwrap();

        assert_eq!(
            children,
            vec![temp.path().join("one.txt"), temp.path().join("sub")]
        );
    }

    #[tokio::test]
    async fn resources_strips_directory_and_extension() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("styles")).unwrap();
        fs::write(temp.path().join("styles/site.scss"), "").unwrap();
        fs::write(temp.path().join("styles/print.scss"), "").unwrap();
        fs::write(temp.path().join("styles/notes.txt"), "").unwrap();
        let cache = ResourceCache::new(temp.path());

        let names = cache.resources(Category::Styles, "scss").await.unwrap();

        assert_eq!(names, vec!["print".to_string(), "site".to_string()]);
    }
}
