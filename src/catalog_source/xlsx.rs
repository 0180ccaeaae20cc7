//! Excelカタログの読み込み（先頭シートの1行目をヘッダーとして扱う）

use crate::error::{BidWriterError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// セルを文字列化（空セルは空文字）
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// 先頭シートをヘッダー行とデータ行に分けて返す
pub fn read_rows(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| BidWriterError::InvalidCatalog(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| BidWriterError::InvalidCatalog(format!("{}: シートがありません", path.display())))?
        .map_err(|e| BidWriterError::InvalidCatalog(format!("{}: {}", path.display(), e)))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .ok_or_else(|| BidWriterError::InvalidCatalog(format!("{}: 空のシートです", path.display())))?;

    let data = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .collect();

    Ok((header, data))
}
