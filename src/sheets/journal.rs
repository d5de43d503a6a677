use anyhow::Result;
use tracing::info;

use super::Spreadsheet;
use crate::TARGET_SHEETS;

/// Data rows (header skipped) whose first cell is `date`.
pub fn rows_for_date<'a>(rows: &'a [Vec<String>], date: &str) -> Vec<&'a Vec<String>> {
    rows.iter()
        .skip(1)
        .filter(|row| row.first().map(String::as_str) == Some(date))
        .collect()
}

/// Deletes every row logged on `date`, returning how many were removed.
///
/// Rows are removed from the bottom up so earlier indices stay valid. This is not
/// atomic: a failure part way through leaves the remaining rows in place.
pub async fn delete_rows_for_date<S: Spreadsheet + ?Sized>(sheet: &S, date: &str) -> Result<usize> {
    let rows = sheet.rows().await?;
    let indices: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.first().map(String::as_str) == Some(date))
        .map(|(index, _)| index)
        .collect();

    for index in indices.iter().rev() {
        sheet.delete_row(*index).await?;
    }

    info!(target: TARGET_SHEETS, "Deleted {} rows for {}", indices.len(), date);
    Ok(indices.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::memory::MemorySheet;
    use serde_json::json;

    #[tokio::test]
    async fn test_delete_rows_for_date() {
        let sheet = MemorySheet::with_header(&["Date", "Item", "Calories"]);
        for (date, item) in [
            ("2026-10-18", "toast"),
            ("2026-10-19", "apple"),
            ("2026-10-18", "soup"),
            ("2026-10-19", "rice"),
            ("2026-10-19", "egg"),
        ] {
            sheet
                .append_row(vec![json!(date), json!(item), json!(100)])
                .await
                .unwrap();
        }

        let rows = sheet.rows().await.unwrap();
        assert_eq!(rows_for_date(&rows, "2026-10-19").len(), 3);

        assert_eq!(delete_rows_for_date(&sheet, "2026-10-19").await.unwrap(), 3);
        let remaining = sheet.rows().await.unwrap();
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining[1][1], "toast");
        assert_eq!(remaining[2][1], "soup");

        assert_eq!(delete_rows_for_date(&sheet, "2026-10-19").await.unwrap(), 0);
    }
}
