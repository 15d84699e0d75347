use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CountryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),

    #[error("country store lock poisoned")]
    StoreLockPoisoned,

    #[error("{source_name} source unavailable: {cause}")]
    SourceUnavailable { source_name: String, cause: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),

    #[error("failed to encode summary image: {0}")]
    ImageEncode(#[from] image::ImageError),

    #[error("failed to write {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid timestamp stored for {0}")]
    InvalidTimestamp(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CountryError {
    /// Whether this error comes from one of the external data sources.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, CountryError::SourceUnavailable { .. })
    }
}

pub type CountryResult<T> = std::result::Result<T, CountryError>;
