//! Append-only daily logs kept in a spreadsheet.

mod google;
mod journal;
#[cfg(test)]
pub mod memory;

pub use google::{GoogleSheet, ServiceAccountKey};
pub use journal::{delete_rows_for_date, rows_for_date};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// One worksheet: rows of cells, the first row being the header.
#[async_trait]
pub trait Spreadsheet: Send + Sync {
    /// Appends a row after the last non-empty one.
    async fn append_row(&self, row: Vec<Value>) -> Result<()>;

    /// Every row, header included, as displayed text.
    async fn rows(&self) -> Result<Vec<Vec<String>>>;

    /// Deletes the row at zero-based `index`; later rows shift up.
    async fn delete_row(&self, index: usize) -> Result<()>;
}
