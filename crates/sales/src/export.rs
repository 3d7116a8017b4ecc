//! Sales export.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;

use agristore_core::{DomainError, ProductId};

use crate::report::UNKNOWN_PRODUCT;
use crate::{Period, Sale};

pub const CSV_HEADER: &str = "ID,Product ID,Product Name,Quantity,Price,Total,Date Sold";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            other => Err(DomainError::UnsupportedFormat(other.to_string())),
        }
    }
}

pub fn export_filename(period: &Period) -> String {
    format!(
        "sales_{}_to_{}.csv",
        period.from_date().format("%Y-%m-%d"),
        period.to_date().format("%Y-%m-%d")
    )
}

/// One header line plus one line per sale, `\n` terminated.
pub fn write_csv(sales: &[Sale], names: &HashMap<ProductId, String>) -> String {
    let mut out = String::with_capacity(64 * (sales.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');

    for sale in sales {
        let name = names
            .get(&sale.product_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_PRODUCT);
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{},{},{:.2},{:.2},{}",
            sale.id,
            sale.product_id,
            csv_field(name),
            sale.quantity,
            sale.price,
            sale.total,
            sale.date_sold.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    out
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
