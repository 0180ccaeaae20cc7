use crate::error::{BidWriterError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 公開カタログ（CSV）
pub const DEFAULT_CATALOG_URL: &str =
    "https://docs.google.com/spreadsheets/d/1sBPUtZqtoPREX2STfjBIs_kNF4HE4kCvsyloL9oC-tY/gviz/tq?tqx=out:csv&sheet=Sheet1";

/// 公開価格表（草刈り・屋根）
pub const DEFAULT_PRICING_URL: &str =
    "https://docs.google.com/spreadsheets/d/e/2PACX-1vRJEpqzTtW-2qqxzkI_QMkwwaYIEEHid_3j1blvxwovK7aVXWB0411eBZVjKZCEKFYaQ8VcLdPe_IU6/pub?output=csv";

/// カタログURLを上書きする環境変数
pub const CATALOG_URL_ENV: &str = "BID_WRITER_CATALOG_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog_url: Option<String>,
    pub pricing_url: Option<String>,
    /// 保存データの置き場所（未設定なら ~/.bid-writer）
    pub data_dir: Option<PathBuf>,
    pub company_name: String,
    pub request_timeout_seconds: u64,
    pub autosave_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| BidWriterError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("bid-writer").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            catalog_url: Some(DEFAULT_CATALOG_URL.into()),
            pricing_url: Some(DEFAULT_PRICING_URL.into()),
            data_dir: None,
            company_name: "Techvengers".into(),
            request_timeout_seconds: 10,
            autosave_prefix: "AutoSave".into(),
        }
    }

    /// カタログURL（環境変数を優先）
    pub fn catalog_url(&self) -> Option<String> {
        if let Ok(url) = std::env::var(CATALOG_URL_ENV) {
            if !url.trim().is_empty() {
                return Some(url.trim().to_string());
            }
        }
        self.catalog_url.clone().filter(|u| !u.trim().is_empty())
    }

    /// 保存データの置き場所
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| BidWriterError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".bid-writer"))
    }

    pub fn set_catalog_url(&mut self, url: String) -> Result<()> {
        self.catalog_url = Some(url).filter(|u| !u.trim().is_empty());
        self.save()
    }

    pub fn set_pricing_url(&mut self, url: String) -> Result<()> {
        self.pricing_url = Some(url).filter(|u| !u.trim().is_empty());
        self.save()
    }

    pub fn set_company_name(&mut self, name: String) -> Result<()> {
        if name.trim().is_empty() {
            return Err(BidWriterError::Config("会社名が空です".into()));
        }
        self.company_name = name.trim().to_string();
        self.save()
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.data_dir = Some(dir);
        self.save()
    }
}
