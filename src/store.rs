//! 作業指示ごとの保存データ管理
//!
//! データディレクトリに `WO_{作業指示番号}.json` として保存する。

use crate::config::Config;
use crate::error::{BidWriterError, Result};
use bid_writer_common::BidState;
use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const FILE_PREFIX: &str = "WO_";
const FILE_EXTENSION: &str = "json";

lazy_static! {
    /// 作業指示番号に使える文字（ファイル名になるので区切り文字は不可）
    static ref WORK_ORDER_RE: Regex = Regex::new(r"^[A-Za-z0-9_\-][A-Za-z0-9_.\-]*$").unwrap();
}

/// 作業指示番号を検証して前後の空白を除いた値を返す
pub fn validate_work_order(work_order: &str) -> Result<String> {
    let trimmed = work_order.trim();
    if trimmed.is_empty() {
        return Err(BidWriterError::MissingWorkOrder);
    }
    if !WORK_ORDER_RE.is_match(trimmed) {
        return Err(BidWriterError::InvalidWorkOrder(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// 作業指示番号がない場合の自動保存名（"AutoSave_1767225600"）
pub fn autosave_name(prefix: &str, unix_seconds: i64) -> String {
    format!("{}_{}", prefix, unix_seconds)
}

/// 一覧表示用の情報
#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub work_order: String,
    pub path: PathBuf,
    /// 明細インスタンス数（読めないファイルは0）
    pub bid_count: usize,
    pub selected_count: usize,
    pub modified: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.data_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, work_order: &str) -> Result<PathBuf> {
        let work_order = validate_work_order(work_order)?;
        Ok(self
            .dir
            .join(format!("{}{}.{}", FILE_PREFIX, work_order, FILE_EXTENSION)))
    }

    pub fn exists(&self, work_order: &str) -> bool {
        self.path_for(work_order).map(|p| p.is_file()).unwrap_or(false)
    }

    /// 保存（既存ファイルは上書き）
    pub fn save(&self, state: &BidState) -> Result<PathBuf> {
        let path = self.path_for(&state.work_order)?;
        std::fs::create_dir_all(&self.dir)?;

        // 一時ファイルに書いてから置き換える
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, state.to_json()?)?;
        std::fs::rename(&tmp_path, &path)?;

        tracing::debug!("saved {} ({} items)", path.display(), state.bid_count());
        Ok(path)
    }

    pub fn load(&self, work_order: &str) -> Result<BidState> {
        let path = self.path_for(work_order)?;
        if !path.is_file() {
            return Err(BidWriterError::StateNotFound(work_order.trim().to_string()));
        }

        let content = std::fs::read_to_string(&path)?;
        let mut state = BidState::from_json(&content)?;
        // 作業指示番号はファイル名を正とする
        state.work_order = validate_work_order(work_order)?;
        Ok(state)
    }

    pub fn delete(&self, work_order: &str) -> Result<()> {
        let path = self.path_for(work_order)?;
        if !path.is_file() {
            return Err(BidWriterError::StateNotFound(work_order.trim().to_string()));
        }
        std::fs::remove_file(&path)?;
        tracing::debug!("deleted {}", path.display());
        Ok(())
    }

    /// 保存データを別の場所へコピー（`dest` がディレクトリならファイル名はそのまま）
    pub fn export_to(&self, work_order: &str, dest: &Path) -> Result<PathBuf> {
        let path = self.path_for(work_order)?;
        if !path.is_file() {
            return Err(BidWriterError::StateNotFound(work_order.trim().to_string()));
        }

        let target = if dest.is_dir() {
            match path.file_name() {
                Some(name) => dest.join(name),
                None => dest.to_path_buf(),
            }
        } else {
            if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            dest.to_path_buf()
        };

        std::fs::copy(&path, &target)?;
        Ok(target)
    }

    /// 保存データ一覧（更新日時の新しい順）
    ///
    /// `search` は作業指示番号の部分一致（大文字小文字無視）。
    pub fn list(&self, search: Option<&str>) -> Result<Vec<StoreEntry>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let Some(work_order) = work_order_from_path(path) else {
                continue;
            };
            if let Some(needle) = &needle {
                if !work_order.to_lowercase().contains(needle) {
                    continue;
                }
            }

            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Local>::from)
                .unwrap_or_else(Local::now);

            let (bid_count, selected_count) = match std::fs::read_to_string(path)
                .map_err(BidWriterError::from)
                .and_then(|text| BidState::from_json(&text).map_err(BidWriterError::from))
            {
                Ok(state) => (state.bid_count(), state.selected_count()),
                Err(e) => {
                    tracing::warn!("{} を読み込めません: {}", path.display(), e);
                    (0, 0)
                }
            };

            entries.push(StoreEntry {
                work_order,
                path: path.to_path_buf(),
                bid_count,
                selected_count,
                modified,
            });
        }

        entries.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.work_order.cmp(&b.work_order))
        });
        Ok(entries)
    }
}

/// "WO_1234.json" → "1234"
fn work_order_from_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let work_order = stem.strip_prefix(FILE_PREFIX)?;
    if work_order.is_empty() {
        None
    } else {
        Some(work_order.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_work_order() {
        assert_eq!(validate_work_order(" 1234 ").unwrap(), "1234");
        assert_eq!(validate_work_order("AutoSave_1700000000").unwrap(), "AutoSave_1700000000");
        assert!(matches!(validate_work_order("  "), Err(BidWriterError::MissingWorkOrder)));
        assert!(matches!(validate_work_order("../etc"), Err(BidWriterError::InvalidWorkOrder(_))));
        assert!(matches!(validate_work_order("a/b"), Err(BidWriterError::InvalidWorkOrder(_))));
        assert!(matches!(validate_work_order(".hidden"), Err(BidWriterError::InvalidWorkOrder(_))));
    }

    #[test]
    fn test_autosave_name() {
        assert_eq!(autosave_name("AutoSave", 1_700_000_000), "AutoSave_1700000000");
    }

    #[test]
    fn test_work_order_from_path() {
        assert_eq!(work_order_from_path(Path::new("/d/WO_88.json")), Some("88".to_string()));
        assert_eq!(work_order_from_path(Path::new("/d/WO_.json")), None);
        assert_eq!(work_order_from_path(Path::new("/d/catalog_cache.csv")), None);
        assert_eq!(work_order_from_path(Path::new("/d/WO_88.json.tmp")), None);
    }
}
