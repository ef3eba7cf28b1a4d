//! Logical import path resolution against named module mounts.

use std::collections::HashMap;
use std::path::PathBuf;

/// Errors from import resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Cannot resolve {0} to a stylesheet module")]
    UnresolvableImport(String),
}

/// A named mapping from a logical path prefix to a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMount {
    pub name: String,
    pub base: PathBuf,
}

/// The outcome of resolving one logical import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    /// Absolute target path, extension not yet appended.
    pub path: PathBuf,

    /// The mount the target belongs to.
    pub mount: ModuleMount,

    /// Mount-qualified logical identifier of the target file.
    pub file: String,

    /// The import that triggered this resolution, when one was given.
    pub parent: Option<String>,
}

/// Registry of module mount points, populated before resolution begins.
///
/// Resolution is pure: it consults the mount table and performs no I/O.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    mounts: HashMap<String, PathBuf>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mount point. Mounts are append-only configuration.
    pub fn mount(&mut self, name: impl Into<String>, base: impl Into<PathBuf>) {
        self.mounts.insert(name.into(), base.into());
    }

    /// Resolve a logical import path, optionally in the context of the
    /// importing file.
    ///
    /// A path whose first segment names a registered mount resolves directly
    /// beneath that mount; mount names win over relative segments. Anything
    /// else needs a parent for context and resolves relative to the parent's
    /// directory within the parent's mount, with the final segment rewritten
    /// to the `_`-prefixed partial form.
    pub fn resolve(
        &self,
        logical: &str,
        parent: Option<&str>,
    ) -> Result<ResolvedImport, ResolveError> {
        match parent {
            Some(parent) => tracing::debug!("Resolve {logical}, imported by {parent}"),
            None => tracing::debug!("Resolve {logical}"),
        }

        let (head, rest) = split_first(logical);

        if let Some(base) = self.mounts.get(head) {
            return Ok(ResolvedImport {
                path: join_logical(base.clone(), rest),
                mount: ModuleMount {
                    name: head.to_string(),
                    base: base.clone(),
                },
                file: logical.to_string(),
                parent: parent.map(str::to_string),
            });
        }

        // An unqualified path has no relative context of its own.
        let Some(parent) = parent else {
            return Err(ResolveError::UnresolvableImport(logical.to_string()));
        };

        let context = self.resolve_qualified(parent)?;

        // Internal references follow the partial convention: the final
        // segment gains an underscore prefix.
        let (dir, name) = split_last(logical);
        let partial = match dir {
            "" => format!("_{name}"),
            dir => format!("{dir}/_{name}"),
        };

        let (_, parent_rest) = split_first(parent);
        let (parent_dir, _) = split_last(parent_rest);
        let relative = match parent_dir {
            "" => partial,
            dir => format!("{dir}/{partial}"),
        };

        tracing::debug!(
            "Using module {} ({}) for {relative}",
            context.mount.name,
            context.mount.base.display()
        );

        Ok(ResolvedImport {
            path: join_logical(context.mount.base.clone(), &relative),
            file: format!("{}/{relative}", context.mount.name),
            mount: context.mount,
            parent: None,
        })
    }

    /// Resolve a path known to be mount-qualified, ignoring any further
    /// relative context.
    fn resolve_qualified(&self, logical: &str) -> Result<ResolvedImport, ResolveError> {
        let (head, rest) = split_first(logical);

        let Some(base) = self.mounts.get(head) else {
            return Err(ResolveError::UnresolvableImport(logical.to_string()));
        };

        Ok(ResolvedImport {
            path: join_logical(base.clone(), rest),
            mount: ModuleMount {
                name: head.to_string(),
                base: base.clone(),
            },
            file: logical.to_string(),
            parent: None,
        })
    }
}

/// Split a logical path on its first separator.
fn split_first(logical: &str) -> (&str, &str) {
    logical.split_once('/').unwrap_or((logical, ""))
}

/// Split a logical path into directory and final segment.
fn split_last(logical: &str) -> (&str, &str) {
    logical.rsplit_once('/').unwrap_or(("", logical))
}

/// Join a `/`-separated logical path onto a base directory.
fn join_logical(base: PathBuf, logical: &str) -> PathBuf {
    logical
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(base, |path, segment| path.join(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.mount("pkg", "/base");
        registry
    }

    #[test]
    fn mount_qualified_path_resolves_beneath_the_mount() {
        let resolved = registry().resolve("pkg/foo", None).unwrap();

        assert_eq!(resolved.path, PathBuf::from("/base/foo"));
        assert_eq!(resolved.file, "pkg/foo");
        assert_eq!(resolved.mount.name, "pkg");
        assert_eq!(resolved.parent, None);
    }

    #[test]
    fn qualified_form_records_the_parent() {
        let resolved = registry().resolve("pkg/foo", Some("pkg/entry")).unwrap();

        assert_eq!(resolved.parent.as_deref(), Some("pkg/entry"));
    }

    #[test]
    fn mount_names_win_over_relative_segments() {
        let mut registry = registry();
        registry.mount("shared", "/shared");

        let resolved = registry.resolve("shared/grid", Some("pkg/entry")).unwrap();

        assert_eq!(resolved.path, PathBuf::from("/shared/grid"));
        assert_eq!(resolved.mount.name, "shared");
    }

    #[test]
    fn relative_import_gets_the_partial_prefix_in_the_parent_directory() {
        let resolved = registry().resolve("bar", Some("pkg/sub/entry")).unwrap();

        assert_eq!(resolved.path, PathBuf::from("/base/sub/_bar"));
        assert_eq!(resolved.file, "pkg/sub/_bar");
        assert_eq!(resolved.mount.name, "pkg");
        assert_eq!(resolved.parent, None);
    }

    #[test]
    fn relative_import_keeps_its_own_directory_segments() {
        let resolved = registry()
            .resolve("widgets/button", Some("pkg/entry"))
            .unwrap();

        assert_eq!(resolved.path, PathBuf::from("/base/widgets/_button"));
        assert_eq!(resolved.file, "pkg/widgets/_button");
    }

    #[test]
    fn unqualified_path_without_parent_is_unresolvable() {
        let err = registry().resolve("unknown/path", None).unwrap_err();

        assert!(matches!(err, ResolveError::UnresolvableImport(path) if path == "unknown/path"));
    }

    #[test]
    fn parent_outside_any_mount_is_unresolvable() {
        let err = registry().resolve("bar", Some("nope/entry")).unwrap_err();

        assert!(matches!(err, ResolveError::UnresolvableImport(path) if path == "nope/entry"));
    }
}
