use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
