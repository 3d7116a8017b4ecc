//! Sales domain: recorded sales, reporting periods, rollups and export.
//!
//! Deterministic logic only (no IO, no HTTP, no storage).

pub mod export;
pub mod period;
pub mod report;
pub mod sale;

pub use export::{CSV_HEADER, ExportFormat, export_filename, write_csv};
pub use period::{Period, end_of_day, parse_date, start_of_day};
pub use report::{ProductRollup, ProductSales, SaleTotals, SalesSummary, name_rollups, rollup_by_product};
pub use sale::{NewSale, Sale, SaleFilter, resolve_price};
