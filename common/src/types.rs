//! 見積データの型定義
//!
//! - CatalogItem: カタログの明細（テンプレート + 単価）
//! - InstanceId: 明細インスタンスの識別子（カテゴリ / 明細名 / 番号）
//! - ItemInstance: 作業指示ごとに入力された明細
//! - InstanceUpdate: 明細の部分更新

use crate::error::Error;
use crate::pricing::{line_total, parse_amount};
use crate::template::{render_or_raw, BidVars};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// カタログ明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub category: String,
    pub item_name: String,
    pub template: String,
    /// カタログ記載のままの単価（例: "15.00"）
    pub unit_price: String,
}

impl CatalogItem {
    pub fn new(
        category: impl Into<String>,
        item_name: impl Into<String>,
        template: impl Into<String>,
        unit_price: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            item_name: item_name.into(),
            template: template.into(),
            unit_price: unit_price.into(),
        }
    }
}

/// 明細インスタンスの識別子
///
/// 並び順はカテゴリ → 明細名 → 番号（数値順）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceId {
    pub category: String,
    pub item_name: String,
    pub number: u32,
}

impl InstanceId {
    pub fn new(category: impl Into<String>, item_name: impl Into<String>, number: u32) -> Self {
        Self {
            category: category.into(),
            item_name: item_name.into(),
            number,
        }
    }

    /// 最初のインスタンス（#1）か
    pub fn is_base(&self) -> bool {
        self.number == 1
    }

    /// 見積書での並び順（明細名 → 番号 → カテゴリ）
    ///
    /// 同時承認グループの番号付けと単独明細の並びに使う。
    /// カテゴリ違いの同名明細は最後にカテゴリで区別する。
    pub fn cmp_bid_order(&self, other: &Self) -> Ordering {
        self.item_name
            .cmp(&other.item_name)
            .then(self.number.cmp(&other.number))
            .then_with(|| self.category.cmp(&other.category))
    }

    /// 画面表示名（"Trim Tree" / "Trim Tree #2"）
    pub fn display_name(&self) -> String {
        if self.is_base() {
            self.item_name.clone()
        } else {
            format!("{} #{}", self.item_name, self.number)
        }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.category, self.item_name, self.number)
    }
}

/// "Category/Item Name#N" 形式を解釈（#N 省略時は #1）
impl FromStr for InstanceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, rest) = s
            .split_once('/')
            .ok_or_else(|| Error::InvalidInstanceId(s.to_string()))?;
        let category = category.trim();

        let (item_name, number) = match rest.rsplit_once('#') {
            Some((name, num)) => match num.trim().parse::<u32>() {
                Ok(n) => (name.trim(), n),
                Err(_) => (rest.trim(), 1),
            },
            None => (rest.trim(), 1),
        };

        if category.is_empty() || item_name.is_empty() || number == 0 {
            return Err(Error::InvalidInstanceId(s.to_string()));
        }

        Ok(Self::new(category, item_name, number))
    }
}

fn default_quantity() -> String {
    "0".to_string()
}

/// 作業指示ごとの明細インスタンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInstance {
    #[serde(flatten)]
    pub id: InstanceId,

    /// 作成時のテンプレート
    pub template: String,

    #[serde(default = "default_quantity")]
    pub quantity: String,

    #[serde(default)]
    pub unit_price: String,

    #[serde(default)]
    pub location: String,

    /// 追加情報（備考）
    #[serde(default)]
    pub info: String,

    /// 同時承認グループのキー（空なら単独）
    #[serde(default)]
    pub conjunction_key: String,

    #[serde(default)]
    pub selected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<PathBuf>,

    /// 手修正した見積文（テンプレート差し込み結果の代わりに使う）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
}

impl ItemInstance {
    /// カタログ明細から新しいインスタンスを作成
    pub fn from_catalog(item: &CatalogItem, number: u32) -> Self {
        Self {
            id: InstanceId::new(&item.category, &item.item_name, number),
            template: item.template.clone(),
            quantity: default_quantity(),
            unit_price: item.unit_price.clone(),
            location: String::new(),
            info: String::new(),
            conjunction_key: String::new(),
            selected: false,
            photo: None,
            custom_text: None,
        }
    }

    pub fn quantity_value(&self) -> f64 {
        parse_amount(&self.quantity)
    }

    pub fn unit_price_value(&self) -> f64 {
        parse_amount(&self.unit_price)
    }

    /// 合計 = round(数量 × 単価, 2)
    pub fn total(&self) -> f64 {
        line_total(self.quantity_value(), self.unit_price_value())
    }

    /// 正規化した同時承認キー（前後空白除去・大文字化、空ならNone）
    pub fn conjunction(&self) -> Option<String> {
        crate::conjunction::normalize_key(&self.conjunction_key)
    }

    /// テンプレートへの差し込み値
    ///
    /// 数量が空なら "0"、場所が空なら "N/A"。
    pub fn vars(&self) -> BidVars<'_> {
        let quantity = self.quantity.trim();
        let location = self.location.trim();
        BidVars {
            quantity: if quantity.is_empty() { "0" } else { quantity },
            location: if location.is_empty() { "N/A" } else { location },
            info: self.info.trim(),
            total: self.total(),
        }
    }

    /// 見積本文（手修正があればそれを優先）
    pub fn body_text(&self) -> String {
        match self.custom_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => render_or_raw(&self.template, &self.vars()),
        }
    }
}

/// 明細の部分更新（None は変更なし）
#[derive(Debug, Clone, Default)]
pub struct InstanceUpdate {
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub location: Option<String>,
    pub info: Option<String>,
    pub conjunction_key: Option<String>,
    pub selected: Option<bool>,
    pub photo: Option<Option<PathBuf>>,
    pub custom_text: Option<Option<String>>,
}

impl InstanceUpdate {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.unit_price.is_none()
            && self.location.is_none()
            && self.info.is_none()
            && self.conjunction_key.is_none()
            && self.selected.is_none()
            && self.photo.is_none()
            && self.custom_text.is_none()
    }

    pub fn apply(self, instance: &mut ItemInstance) {
        if let Some(v) = self.quantity {
            instance.quantity = v;
        }
        if let Some(v) = self.unit_price {
            instance.unit_price = v;
        }
        if let Some(v) = self.location {
            instance.location = v;
        }
        if let Some(v) = self.info {
            instance.info = v;
        }
        if let Some(v) = self.conjunction_key {
            instance.conjunction_key = v;
        }
        if let Some(v) = self.selected {
            instance.selected = v;
        }
        if let Some(v) = self.photo {
            instance.photo = v;
        }
        if let Some(v) = self.custom_text {
            instance.custom_text = v;
        }
    }
}
