//! The stylesheet compiler capability and its grass-backed implementation.

use std::fmt;
use std::path::{Component, Path};
use std::sync::Mutex;

use crate::render::StyleError;

/// Content loaded for one import request, paired with the logical file
/// identifier the compiler should attribute it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImport {
    pub contents: String,
    pub file: String,
}

/// Satisfies a compiler's import requests.
///
/// `path` is the requested import; `parent` is the logical identifier of
/// the importing file when the request is not from the entry stylesheet.
pub trait ImportLoader: fmt::Debug + Send + Sync {
    fn load(&self, path: &str, parent: Option<&str>) -> Result<LoadedImport, StyleError>;
}

/// An opaque compile step: SCSS source in, CSS text out.
///
/// `file` identifies the entry stylesheet for diagnostics. Nested imports
/// are satisfied through the supplied loader.
pub trait Compiler: fmt::Debug + Send + Sync {
    fn compile(
        &self,
        source: &str,
        file: &str,
        imports: &dyn ImportLoader,
    ) -> Result<String, StyleError>;
}

/// SCSS compiler backed by the `grass` crate.
///
/// grass resolves imports by probing candidate paths against a virtual file
/// system; the probes arrive pre-joined to the importing file's logical
/// directory and already cover the `_`-partial spellings, so each one maps
/// straight onto a mount-qualified loader request.
#[derive(Debug, Default)]
pub struct GrassCompiler;

impl Compiler for GrassCompiler {
    fn compile(
        &self,
        source: &str,
        file: &str,
        imports: &dyn ImportLoader,
    ) -> Result<String, StyleError> {
        let fs = LoaderFs {
            loader: imports,
            failure: Mutex::new(None),
        };
        let options = grass::Options::default()
            .style(grass::OutputStyle::Expanded)
            .fs(&fs)
            .load_path(Path::new(""));

        match grass::from_string(source.to_string(), &options) {
            Ok(css) => Ok(css),
            Err(err) => {
                // A loader failure surfaces through the compiler as a generic
                // diagnostic; prefer the recorded original.
                if let Some(failure) = fs.failure.lock().expect("failure slot poisoned").take() {
                    return Err(failure);
                }
                Err(StyleError::Compile {
                    file: file.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }
}

/// Adapts an [`ImportLoader`] to the virtual file system grass probes.
struct LoaderFs<'a> {
    loader: &'a dyn ImportLoader,
    failure: Mutex<Option<StyleError>>,
}

impl fmt::Debug for LoaderFs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderFs").finish_non_exhaustive()
    }
}

impl grass::Fs for LoaderFs<'_> {
    fn is_dir(&self, _path: &Path) -> bool {
        false
    }

    fn is_file(&self, path: &Path) -> bool {
        logical_probe(path)
            .map(|logical| self.loader.load(&logical, None).is_ok())
            .unwrap_or(false)
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        let Some(logical) = logical_probe(path) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unresolvable import probe: {}", path.display()),
            ));
        };

        match self.loader.load(&logical, None) {
            Ok(loaded) => Ok(loaded.contents.into_bytes()),
            Err(err) => {
                let message = err.to_string();
                *self.failure.lock().expect("failure slot poisoned") = Some(err);
                Err(std::io::Error::other(message))
            }
        }
    }
}

/// Map a probe path back to the logical import it stands for: forward
/// slashes, `.scss` stripped, `_`-partial spellings kept verbatim.
fn logical_probe(path: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    let last = segments.pop()?;
    let last = last.strip_suffix(".scss").unwrap_or(last);
    segments.push(last);

    Some(segments.join("/"))
}
