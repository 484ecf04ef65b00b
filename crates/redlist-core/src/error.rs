use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file not readable: {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("catalog has no '{0}' column")]
    MissingColumn(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("threshold {0} is outside 0..=100")]
    InvalidThreshold(u8),
}
