//! カタログ・価格表の読み込み
//!
//! 読み込み順:
//! 1. `--catalog` で指定したファイル（.csv / .xlsx）またはURL
//! 2. 設定のURL（環境変数 BID_WRITER_CATALOG_URL が優先）
//! 3. 前回取得したカタログのキャッシュ
//! 4. 組み込みのデフォルトカタログ

pub mod remote;
pub mod xlsx;

use crate::config::Config;
use crate::error::{BidWriterError, Result};
use bid_writer_common::{Catalog, PricingTables};
use std::fmt;
use std::path::{Path, PathBuf};

/// 取得したカタログのキャッシュファイル名
pub const CATALOG_CACHE_FILE: &str = "catalog_cache.csv";

/// カタログの取得元
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogOrigin {
    Remote(String),
    File(PathBuf),
    Cache(PathBuf),
    Builtin,
}

impl fmt::Display for CatalogOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogOrigin::Remote(url) => write!(f, "オンライン ({})", url),
            CatalogOrigin::File(path) => write!(f, "ファイル ({})", path.display()),
            CatalogOrigin::Cache(path) => write!(f, "キャッシュ ({})", path.display()),
            CatalogOrigin::Builtin => write!(f, "組み込みデフォルト"),
        }
    }
}

/// 読み込んだカタログと取得元
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub origin: CatalogOrigin,
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// 拡張子で判別してファイルから読み込み
pub fn load_catalog_file(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        return Err(BidWriterError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let catalog = match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => {
            let (header, rows) = xlsx::read_rows(path)?;
            Catalog::from_rows(&header, rows)?
        }
        _ => {
            let text = std::fs::read_to_string(path)?;
            Catalog::from_csv_str(&text)?
        }
    };

    if catalog.is_empty() {
        return Err(BidWriterError::InvalidCatalog(format!(
            "{}: 明細が1件もありません",
            path.display()
        )));
    }
    Ok(catalog)
}

/// URLから取得し、成功したらキャッシュに保存
async fn load_remote(url: &str, config: &Config, cache_path: Option<&Path>) -> Result<Catalog> {
    let text = remote::fetch_text(url, config.request_timeout_seconds).await?;
    let catalog = Catalog::from_csv_str(&text)?;
    if catalog.is_empty() {
        return Err(BidWriterError::InvalidCatalog(format!("{}: 明細が1件もありません", url)));
    }

    if let Some(cache_path) = cache_path {
        let saved = cache_path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| std::fs::write(cache_path, &text));
        if let Err(e) = saved {
            tracing::warn!("カタログのキャッシュ保存に失敗: {}", e);
        }
    }
    Ok(catalog)
}

/// カタログを読み込む（失敗時はキャッシュ → 組み込みデフォルトの順に切り替える）
///
/// * `location` - ファイルパスまたはURL（省略時は設定のURL）
/// * `offline` - URLからの取得を行わない
pub async fn load_catalog(config: &Config, location: Option<&str>, offline: bool) -> LoadedCatalog {
    let cache_path = config.data_dir().ok().map(|d| d.join(CATALOG_CACHE_FILE));

    match location {
        Some(location) if !is_url(location) => {
            let path = PathBuf::from(location);
            match load_catalog_file(&path) {
                Ok(catalog) => return log_loaded(catalog, CatalogOrigin::File(path)),
                Err(e) => tracing::warn!("カタログファイルを読み込めません: {}", e),
            }
        }
        _ => {
            let url = location.map(str::to_string).or_else(|| config.catalog_url());
            match url {
                Some(url) if !offline => match load_remote(&url, config, cache_path.as_deref()).await {
                    Ok(catalog) => return log_loaded(catalog, CatalogOrigin::Remote(url)),
                    Err(e) => tracing::warn!("オンラインカタログを取得できません: {}", e),
                },
                Some(_) => tracing::debug!("オフラインのためオンラインカタログを使いません"),
                None => tracing::debug!("カタログURLが未設定です"),
            }
        }
    }

    if let Some(cache_path) = cache_path.filter(|p| p.exists()) {
        match load_catalog_file(&cache_path) {
            Ok(catalog) => return log_loaded(catalog, CatalogOrigin::Cache(cache_path)),
            Err(e) => tracing::warn!("キャッシュを読み込めません: {}", e),
        }
    }

    tracing::warn!("組み込みのデフォルトカタログを使用します");
    log_loaded(Catalog::default_catalog(), CatalogOrigin::Builtin)
}

fn log_loaded(catalog: Catalog, origin: CatalogOrigin) -> LoadedCatalog {
    tracing::info!("カタログ読み込み: {} 件 ({})", catalog.len(), origin);
    for warning in catalog.validate() {
        tracing::warn!("テンプレート: {}", warning);
    }
    LoadedCatalog { catalog, origin }
}

/// 草刈り・屋根の価格表を読み込む（失敗時は組み込みの価格表）
pub async fn load_pricing(config: &Config, location: Option<&str>, offline: bool) -> PricingTables {
    let loaded = match location {
        Some(location) if !is_url(location) => std::fs::read_to_string(location)
            .map_err(BidWriterError::from)
            .and_then(|text| PricingTables::from_csv_str(&text).map_err(BidWriterError::from)),
        _ => {
            let url = location
                .map(str::to_string)
                .or_else(|| config.pricing_url.clone().filter(|u| !u.trim().is_empty()));
            match url {
                Some(url) if !offline => remote::fetch_text(&url, config.request_timeout_seconds)
                    .await
                    .and_then(|text| PricingTables::from_csv_str(&text).map_err(BidWriterError::from)),
                _ => Err(BidWriterError::CatalogFetch("価格表のURLが使えません".into())),
            }
        }
    };

    match loaded {
        Ok(tables) => tables,
        Err(e) => {
            tracing::warn!("価格表を読み込めません（組み込みの価格表を使用）: {}", e);
            PricingTables::default_tables()
        }
    }
}
