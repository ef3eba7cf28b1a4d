//! Page specification parsing.

use std::path::Path;

use serde::Deserialize;

use crate::page::PageError;

/// A parsed page specification.
///
/// `layout` and `data` are the fixed metadata section; every other
/// top-level key lands in `properties` and becomes visible to the template
/// verbatim. The two namespaces are structurally separate, so the metadata
/// keys can never leak into the rendered property bag.
#[derive(Debug, Deserialize)]
pub struct PageSpec {
    /// Layout resource identifier. Required, but validated after parsing so
    /// its absence reports as a page error rather than a parser diagnostic.
    #[serde(default)]
    pub layout: Option<String>,

    /// Declared auxiliary data sources, in order.
    #[serde(default)]
    pub data: Vec<DataSourceDecl>,

    /// All remaining top-level keys, in document order.
    #[serde(flatten)]
    pub properties: serde_yaml::Mapping,
}

/// One declared data source: either a bare path string or an explicit
/// path/name pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DataSourceDecl {
    Path(String),
    Entry {
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

/// A normalized data source; `name` keys the loaded value in the property
/// bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub path: String,
    pub name: String,
}

impl DataSourceDecl {
    /// Normalize into an explicit pair, stripping a leading slash from the
    /// bare-string form and deriving the name from the path's final segment
    /// (extension stripped) when absent.
    pub fn normalize(&self, page: &str) -> Result<DataSource, PageError> {
        let (path, name) = match self {
            DataSourceDecl::Path(path) => (Some(path.trim_start_matches('/').to_string()), None),
            DataSourceDecl::Entry { path, name } => (path.clone(), name.clone()),
        };

        let Some(path) = path else {
            return Err(PageError::MissingDataPath {
                page: page.to_string(),
            });
        };

        let name = match name {
            Some(name) => name,
            None => Path::new(&path)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(path.as_str())
                .to_string(),
        };

        Ok(DataSource { path, name })
    }
}
