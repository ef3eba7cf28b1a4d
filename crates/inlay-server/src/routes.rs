//! Route handlers over the site pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path as RoutePath, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use inlay_fs::{FsError, ResourceCache};
use inlay_page::{PageError, Pages};
use inlay_style::{StyleError, StyleRenderer};

/// Shared state for the page and stylesheet routes.
#[derive(Clone)]
pub struct SiteState {
    pub pages: Arc<Pages>,
    pub styles: Arc<StyleRenderer>,
}

/// State for one static-asset mount.
#[derive(Clone)]
pub struct AssetState {
    pub cache: Arc<ResourceCache>,
    pub base: PathBuf,
}

/// A core failure crossing the HTTP boundary.
///
/// Handlers never map failures themselves; everything funnels through this
/// responder so a missing resource is a 404 and anything else a 500.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Fs(#[from] FsError),
}

impl ServeError {
    fn status(&self) -> StatusCode {
        match self {
            ServeError::Page(PageError::Fs(FsError::NotFound(_)))
            | ServeError::Style(StyleError::Fs(FsError::NotFound(_)))
            | ServeError::Fs(FsError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("{self}");
        } else {
            tracing::error!("{self}");
        }

        (status, self.to_string()).into_response()
    }
}

/// Serve a page resource.
///
/// `..` traversal is normalized, the site root defaults to `index`, and a
/// `.html` suffix on the base name is ignored.
pub async fn page(State(state): State<SiteState>, uri: Uri) -> Result<Response, ServeError> {
    let path = normalize_request_path(uri.path());
    let path = if path.is_empty() {
        "index".to_string()
    } else {
        path
    };
    let name = path.strip_suffix(".html").unwrap_or(&path);

    tracing::debug!("Serve page {name} for {uri}");

    let page = state.pages.load(name).await?;
    let html = page.render()?;

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response())
}

/// Serve a compiled stylesheet; the `.css` suffix maps back to the `.scss`
/// resource name.
pub async fn style(
    State(state): State<SiteState>,
    RoutePath(path): RoutePath<String>,
) -> Result<Response, ServeError> {
    let path = normalize_request_path(&path);
    let name = path.strip_suffix(".css").unwrap_or(&path);

    tracing::info!("Serve stylesheet {name}");

    let css = state.styles.render(name).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        css,
    )
        .into_response())
}

/// Serve a static file from the mount's base directory with its derived
/// content type.
pub async fn asset(
    State(state): State<AssetState>,
    RoutePath(path): RoutePath<String>,
) -> Result<Response, ServeError> {
    let path = normalize_request_path(&path);
    let file = state.cache.read(state.base.join(&path), None).await?;

    Ok((
        [(header::CONTENT_TYPE, file.content_type.clone())],
        file.content.clone(),
    )
        .into_response())
}

/// Normalize a request path: drop the leading separator and resolve `.` and
/// `..` segments without ever escaping the root.
pub fn normalize_request_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_the_leading_separator() {
        assert_eq!(normalize_request_path("/about"), "about");
        assert_eq!(normalize_request_path("/guides/setup"), "guides/setup");
    }

    #[test]
    fn normalization_resolves_traversal_within_the_root() {
        assert_eq!(normalize_request_path("/a/../b"), "b");
        assert_eq!(normalize_request_path("/../../etc/passwd"), "etc/passwd");
        assert_eq!(normalize_request_path("/a/./b"), "a/b");
    }

    #[test]
    fn root_request_normalizes_to_empty() {
        assert_eq!(normalize_request_path("/"), "");
    }

    #[test]
    fn missing_resources_map_to_not_found() {
        let err = ServeError::Fs(FsError::NotFound("x".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ServeError::Page(PageError::Fs(FsError::NotFound("x".into())));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_failures_map_to_internal_error() {
        let err = ServeError::Page(PageError::MissingLayout {
            page: "home".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ServeError::Style(StyleError::Compile {
            file: "site.scss".to_string(),
            message: "bad".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
