//! `agristore-core`: shared domain building blocks.
//!
//! Pure types only: identifiers, the domain error model, pagination and
//! partial-update wrappers. No storage or transport concerns.

pub mod entity;
pub mod error;
pub mod id;
pub mod page;
pub mod patch;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ImageId, ProductId, SaleId, UserId};
pub use page::{Page, PageRequest};
pub use patch::Patch;
