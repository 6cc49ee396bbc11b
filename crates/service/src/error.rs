use ledger::{EngineError, ErrorKind};
use store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Recommendation failed: {0:#}")]
    Recommendation(anyhow::Error),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Engine(err) => err.kind(),
            ServiceError::Recommendation(_) => ErrorKind::Internal,
        }
    }

    /// The engine error, when there is one
    pub fn engine(&self) -> Option<&EngineError> {
        match self {
            ServiceError::Engine(err) => Some(err),
            ServiceError::Recommendation(_) => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Engine(err.into())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
