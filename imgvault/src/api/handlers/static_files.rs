//! Read-only serving of the storage root.
//!
//! Stored names are always hex digests, so no served path segment ever starts with a dot.
//! In-flight writes use dot-prefixed temporary names in the same directories, and those must
//! never be reachable.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Answer 404 for any path with a hidden segment, including percent-encoded dots.
pub async fn hide_dotfiles(request: Request, next: Next) -> Response {
    let hidden = request
        .uri()
        .path()
        .split('/')
        .any(|segment| segment.starts_with('.') || segment.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("%2e")));

    if hidden {
        tracing::debug!(path = %request.uri().path(), "Refusing to serve hidden path");
        return StatusCode::NOT_FOUND.into_response();
    }

    next.run(request).await
}
