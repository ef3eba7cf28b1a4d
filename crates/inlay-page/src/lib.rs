//! Page composition from YAML specifications and layout templates.
//!
//! A page is a YAML document naming a layout and a set of auxiliary data
//! files; composition loads all of them through the resource cache and
//! renders the merged property bag through an opaque template engine.

pub mod page;
pub mod spec;
pub mod template;

pub use page::{Page, PageError, Pages};
pub use spec::{DataSource, DataSourceDecl, PageSpec};
pub use template::{MinijinjaCompiler, Template, TemplateCompiler};
