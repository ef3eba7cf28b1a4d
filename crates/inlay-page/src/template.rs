//! The template engine capability.

use std::fmt;
use std::path::Path;

use minijinja::Environment;

use crate::page::PageError;

/// A compiled layout, ready to render a property bag.
pub trait Template: fmt::Debug + Send + Sync {
    fn render(&self, properties: &serde_yaml::Mapping) -> Result<String, PageError>;
}

/// An opaque template compile step, bound to the source's path for
/// diagnostics.
pub trait TemplateCompiler: fmt::Debug + Send + Sync {
    fn compile(&self, source: &str, path: &Path) -> Result<Box<dyn Template>, PageError>;
}

/// Template engine backed by minijinja.
#[derive(Debug, Default)]
pub struct MinijinjaCompiler;

impl TemplateCompiler for MinijinjaCompiler {
    fn compile(&self, source: &str, path: &Path) -> Result<Box<dyn Template>, PageError> {
        let name = path.display().to_string();
        let mut env = Environment::new();
        env.add_template_owned(name.clone(), source.to_string())
            .map_err(|e| PageError::Template {
                file: name.clone(),
                message: e.to_string(),
            })?;

        Ok(Box::new(MinijinjaTemplate { env, name }))
    }
}

#[derive(Debug)]
struct MinijinjaTemplate {
    env: Environment<'static>,
    name: String,
}

impl Template for MinijinjaTemplate {
    fn render(&self, properties: &serde_yaml::Mapping) -> Result<String, PageError> {
        let template = self
            .env
            .get_template(&self.name)
            .map_err(|e| PageError::Template {
                file: self.name.clone(),
                message: e.to_string(),
            })?;

        template.render(properties).map_err(|e| PageError::Template {
            file: self.name.clone(),
            message: e.to_string(),
        })
    }
}
