//! Error types for icon loading, configuration and host interaction.

use std::io;

/// Errors produced while rendering icons, loading resources or talking to the host.
///
/// Most of these never reach a caller: the [`IconManager`](crate::IconManager)
/// turns rendering and loading failures into the next fallback tier and logs
/// them. Preference persistence and host subscription failures are the ones
/// that surface as a `Result`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("resource not found: {0}")]
    ResourceMissing(String),

    #[error("unknown predefined icon: {0}")]
    UnknownTheme(String),

    #[error("failed to parse SVG: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("cannot allocate a {0}x{0} pixmap")]
    Pixmap(u32),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workbench error: {0}")]
    Host(String),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, Error>;
