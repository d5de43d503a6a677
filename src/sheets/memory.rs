use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

use super::Spreadsheet;

/// In-process worksheet used by tests.
#[derive(Default)]
pub struct MemorySheet {
    rows: Mutex<Vec<Vec<String>>>,
}

impl MemorySheet {
    pub fn with_header(header: &[&str]) -> Self {
        Self {
            rows: Mutex::new(vec![header.iter().map(|h| h.to_string()).collect()]),
        }
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Spreadsheet for MemorySheet {
    async fn append_row(&self, row: Vec<Value>) -> Result<()> {
        let mut rows = self.rows.lock().map_err(|_| anyhow!("sheet lock poisoned"))?;
        rows.push(row.iter().map(display).collect());
        Ok(())
    }

    async fn rows(&self) -> Result<Vec<Vec<String>>> {
        let rows = self.rows.lock().map_err(|_| anyhow!("sheet lock poisoned"))?;
        Ok(rows.clone())
    }

    async fn delete_row(&self, index: usize) -> Result<()> {
        let mut rows = self.rows.lock().map_err(|_| anyhow!("sheet lock poisoned"))?;
        if index >= rows.len() {
            return Err(anyhow!("Row {} out of range", index));
        }
        rows.remove(index);
        Ok(())
    }
}
