//! Infrastructure layer: storage backends, image uploads, application
//! services and development seeding.

pub mod seed;
pub mod services;
pub mod store;
pub mod uploads;
