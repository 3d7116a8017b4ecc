use thiserror::Error;

use agristore_auth::CredentialError;
use agristore_core::{DomainError, ProductId};

use crate::store::StoreError;
use crate::uploads::UploadError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A storage collaborator failed; not further classified.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Stock was reserved for a sale that could not be recorded, and the
    /// reservation could not be released.
    #[error("sale of {quantity} x {product_id} left stock out of step with sales: {reason}")]
    PartialFailure {
        product_id: ProductId,
        quantity: u32,
        reason: String,
    },
}

impl ServiceError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { entity, key } => {
                Self::Domain(DomainError::conflict(format!("{entity} '{key}' already exists")))
            }
            StoreError::Backend(msg) => Self::Storage(msg),
        }
    }
}

impl From<UploadError> for ServiceError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Rejected(e) => Self::Domain(e),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<CredentialError> for ServiceError {
    fn from(err: CredentialError) -> Self {
        Self::Storage(err.to_string())
    }
}
