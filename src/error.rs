use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovgapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid coverage JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed coverage record for {path}: {detail}")]
    MalformedCoverage { path: String, detail: String },

    #[error("Invalid path pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("HTTP request to {url} failed: {detail}")]
    Http { url: String, detail: String },
}

pub type Result<T> = std::result::Result<T, CovgapError>;
