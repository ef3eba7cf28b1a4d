//! Page composition and rendering.

use std::sync::Arc;

use futures::future::try_join_all;

use inlay_fs::{Category, FsError, ResourceCache, Writer};

use crate::spec::{DataSource, PageSpec};
use crate::template::{Template, TemplateCompiler};

/// Errors from page composition and rendering.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Specification for page {page} is missing required property 'layout'")]
    MissingLayout { page: String },

    #[error("Data source in page {page} is missing required property 'path'")]
    MissingDataPath { page: String },

    #[error("Invalid specification for page {page}: {message}")]
    InvalidSpec { page: String, message: String },

    #[error("Invalid data file {path}: {message}")]
    InvalidData { path: String, message: String },

    #[error("Template {file}: {message}")]
    Template { file: String, message: String },

    #[error(transparent)]
    Fs(#[from] FsError),
}

/// Composes pages from YAML specifications, layouts, and data files.
///
/// Composition is cached at the file level only: the page object itself is
/// built fresh per request, while layout and data reads hit the shared
/// resource cache.
#[derive(Debug, Clone)]
pub struct Pages {
    cache: Arc<ResourceCache>,
    compiler: Arc<dyn TemplateCompiler>,
}

impl Pages {
    pub fn new(cache: Arc<ResourceCache>, compiler: Arc<dyn TemplateCompiler>) -> Self {
        Self { cache, compiler }
    }

    /// Load a page: parse its specification, compile its layout, and load
    /// all declared data sources concurrently.
    pub async fn load(&self, name: &str) -> Result<Page, PageError> {
        let file = self
            .cache
            .resource(Category::Pages, name, Some("yml"))
            .await?;
        let spec: PageSpec =
            serde_yaml::from_slice(&file.content).map_err(|e| PageError::InvalidSpec {
                page: name.to_string(),
                message: e.to_string(),
            })?;

        let Some(layout) = spec.layout else {
            return Err(PageError::MissingLayout {
                page: name.to_string(),
            });
        };

        let layout_file = self
            .cache
            .resource(Category::Layouts, &layout, Some("html"))
            .await?;
        let template = self
            .compiler
            .compile(&layout_file.text(), &layout_file.path)?;

        let sources = spec
            .data
            .iter()
            .map(|decl| decl.normalize(name))
            .collect::<Result<Vec<_>, _>>()?;

        let loaded = try_join_all(sources.iter().map(|source| self.data(source))).await?;

        let mut properties = spec.properties;
        for (key, value) in loaded {
            properties.insert(serde_yaml::Value::String(key), value);
        }

        Ok(Page {
            name: name.to_string(),
            template,
            properties,
        })
    }

    /// Load one data source as a property bag entry.
    async fn data(&self, source: &DataSource) -> Result<(String, serde_yaml::Value), PageError> {
        let file = self
            .cache
            .resource(Category::Data, &source.path, Some("yml"))
            .await?;
        let value = serde_yaml::from_slice(&file.content).map_err(|e| PageError::InvalidData {
            path: source.path.clone(),
            message: e.to_string(),
        })?;

        Ok((source.name.clone(), value))
    }

    /// Compose and render every page in the category, writing `<name>.html`
    /// through the writer. One page's failure fails the whole batch.
    pub async fn render_static(&self, writer: &Writer) -> Result<(), PageError> {
        let names = self.cache.resources(Category::Pages, "yml").await?;

        try_join_all(names.iter().map(|name| async move {
            let page = self.load(name).await?;
            let html = page.render()?;
            writer.write(name, html.as_bytes(), Some("html")).await?;
            Ok::<_, PageError>(())
        }))
        .await?;

        Ok(())
    }
}

/// A composed page: the compiled layout bound to the final property bag.
#[derive(Debug)]
pub struct Page {
    name: String,
    template: Box<dyn Template>,
    properties: serde_yaml::Mapping,
}

impl Page {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property bag the template renders against.
    pub fn properties(&self) -> &serde_yaml::Mapping {
        &self.properties
    }

    /// Render the layout against the property bag.
    pub fn render(&self) -> Result<String, PageError> {
        tracing::debug!("Rendering page {}", self.name);
        self.template.render(&self.properties)
    }
}
