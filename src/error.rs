use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Duplicate payment: {0}")]
    DuplicateKey(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Health probe inconclusive: {0}")]
    ProbeInconclusive(String),
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
    #[error("Work queue is full")]
    QueueFull,
    #[error("Work queue is closed")]
    QueueClosed,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RouterError {
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::StoreUnavailable(err.into())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for RouterError {
    fn from(err: rocksdb::Error) -> Self {
        Self::store(err)
    }
}
