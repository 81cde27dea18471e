//! Error types for report rendering.

use thiserror::Error;

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while loading or rendering a template.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The template path did not resolve to a readable file.
    #[error("template not found at {path}: {source}")]
    TemplateNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The template engine failed. Query-adapter failures raised inside
    /// template expressions surface here as the render error's source chain.
    #[error("template render failed: {0}")]
    Render(#[from] minijinja::Error),
}
