use thiserror::Error;

/// Errors that can occur while building an import dataset.
///
/// The extraction core itself never surfaces these: per-file failures are
/// swallowed there and the file is left out of the result. Everything around
/// it (configuration, discovery, dataset assembly, filtering) reports through
/// this type.
#[derive(Error, Debug)]
pub enum ImportMapError {
    #[error("file error: {message} (path: {path})")]
    File { message: String, path: String },

    #[error("parse error: {message} (path: {path})")]
    Parse { message: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("dataset error: {message} (path: {path})")]
    Dataset { message: String, path: String },

    #[error("discovery error: {message} (query: {query})")]
    Discovery { message: String, query: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] ureq::Error),
}

/// Convenience alias for results using `ImportMapError`.
pub type Result<T> = std::result::Result<T, ImportMapError>;
