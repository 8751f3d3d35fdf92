//! Error types for the build pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building the site
#[derive(Debug, Error)]
pub enum Error {
    /// A required front-matter field is absent
    #[error("{path}: missing required field `{field}`")]
    MissingField { path: String, field: &'static str },

    /// The `date` field could not be parsed
    #[error("{path}: could not parse date `{value}`")]
    InvalidDate { path: String, value: String },

    /// The front-matter block is not valid YAML
    #[error("{path}: invalid front-matter: {source}")]
    InvalidFrontMatter {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A text source is not valid UTF-8
    #[error("{path}: content is not valid UTF-8")]
    InvalidUtf8 { path: String },

    /// A template was referenced but never loaded
    #[error("template not found: {name}")]
    MissingTemplate { name: String },

    /// Template compilation or rendering failed (e.g. an unresolved placeholder)
    #[error("template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: tera::Error,
    },

    /// A stylesheet could not be parsed or printed
    #[error("{path}: {message}")]
    Stylesheet { path: String, message: String },

    /// Filesystem error on a specific path
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more items failed; unrelated items were still written
    #[error("build failed for {} item(s): {}", .0.len(), .0.join(", "))]
    Build(Vec<String>),
}

impl Error {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Render an error with its full source chain on one line
pub fn report(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, Error>;
