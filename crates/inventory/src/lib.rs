//! Inventory domain: stock levels layered over catalog products.
//!
//! Pure functions over product snapshots; storage backends either call these
//! directly or compute the same shapes natively.

pub mod stock;

pub use stock::{
    CategoryStock, DEFAULT_LOW_STOCK_THRESHOLD, LowStockProduct, StockSummary, effective_threshold,
    low_stock, summarize,
};
