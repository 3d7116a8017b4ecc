//! `agristore-catalog`: products, categories and product images.

pub mod category;
pub mod filter;
pub mod image;
pub mod product;

pub use category::{Category, NewCategory};
pub use filter::ProductFilter;
pub use image::{ImageSource, ProductImage, StoredFile, UploadedImage};
pub use product::{NewProduct, Product, ProductPatch};
