//! 作業指示ごとの保存データ（JSON）
//!
//! ```json
//! {"version": 1, "work_order": "1234", "saved_at": "...", "items": [...]}
//! ```
//!
//! `version` を持たない旧形式（`selected_items` / `item_photos`）も読める。

use crate::error::{Error, Result};
use crate::sheet::BidSheet;
use crate::types::{InstanceId, ItemInstance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 現在の保存形式のバージョン
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidState {
    pub version: u32,
    pub work_order: String,
    /// RFC 3339
    #[serde(default)]
    pub saved_at: String,
    #[serde(default)]
    pub items: Vec<ItemInstance>,
}

impl BidState {
    /// シートの内容を保存用に取り出す
    pub fn capture(sheet: &BidSheet, work_order: &str, saved_at: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            work_order: work_order.to_string(),
            saved_at: saved_at.into(),
            items: sheet.instances().cloned().collect(),
        }
    }

    /// シートに復元（同じIDが重複していれば後勝ち）
    pub fn into_sheet(self) -> BidSheet {
        let mut sheet = BidSheet::new();
        for item in self.items {
            sheet.insert(item);
        }
        sheet
    }

    /// 保存されている明細インスタンス数
    pub fn bid_count(&self) -> usize {
        self.items.len()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|i| i.selected).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSONから読み込み（新しすぎるバージョンはエラー）
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        if value.get("version").is_none() && value.get("selected_items").is_some() {
            let legacy: LegacyState = serde_json::from_value(value)?;
            return Ok(legacy.into_state());
        }

        let state: BidState = serde_json::from_value(value)?;
        if state.version > STATE_VERSION {
            return Err(Error::UnsupportedVersion {
                found: state.version,
                supported: STATE_VERSION,
            });
        }
        Ok(state)
    }
}

// ============================================
// 旧形式
// ============================================

#[derive(Debug, Default, Deserialize)]
struct LegacyInstanceInfo {
    #[serde(default)]
    instance_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LegacyItem {
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    template: String,
    #[serde(default)]
    qty: Option<String>,
    #[serde(default)]
    unit_price: Option<String>,
    #[serde(default)]
    location: String,
    #[serde(default)]
    add_info: String,
    original_name: String,
    #[serde(default)]
    instance_info: LegacyInstanceInfo,
    #[serde(default)]
    conjunction_key: String,
}

#[derive(Debug, Deserialize)]
struct LegacyState {
    #[serde(default)]
    selected_items: BTreeMap<String, BTreeMap<String, LegacyItem>>,
    /// キーは "{カテゴリ}_{明細キー}"
    #[serde(default)]
    item_photos: BTreeMap<String, String>,
}

impl LegacyState {
    fn into_state(self) -> BidState {
        let mut items = Vec::new();
        for (category, entries) in self.selected_items {
            for (item_key, item) in entries {
                let photo = self
                    .item_photos
                    .get(&format!("{}_{}", category, item_key))
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from);

                items.push(ItemInstance {
                    id: InstanceId::new(
                        category.as_str(),
                        item.original_name.as_str(),
                        item.instance_info.instance_id.unwrap_or(1).max(1),
                    ),
                    template: item.template,
                    quantity: item.qty.unwrap_or_else(|| "0".to_string()),
                    unit_price: item.unit_price.unwrap_or_else(|| "0.00".to_string()),
                    location: item.location,
                    info: item.add_info,
                    conjunction_key: item.conjunction_key,
                    selected: item.selected,
                    photo,
                    custom_text: None,
                });
            }
        }
        items.sort_by(|a, b| a.id.cmp(&b.id));

        BidState {
            version: STATE_VERSION,
            work_order: String::new(),
            saved_at: String::new(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::types::InstanceUpdate;

    fn sample_sheet() -> BidSheet {
        let catalog = Catalog::default_catalog();
        let mut sheet = BidSheet::from_catalog(&catalog);
        let extra = sheet.add_instance(&catalog, "Mold", "Kilz").unwrap();
        sheet
            .update(
                &extra,
                InstanceUpdate {
                    quantity: Some("120".to_string()),
                    location: Some("attic".to_string()),
                    selected: Some(true),
                    photo: Some(Some(PathBuf::from("/tmp/attic.jpg"))),
                    ..Default::default()
                },
            )
            .unwrap();
        sheet
    }

    #[test]
    fn test_capture_and_restore() {
        let sheet = sample_sheet();
        let state = BidState::capture(&sheet, "1234", "2026-01-02T03:04:05Z");
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.bid_count(), 5);
        assert_eq!(state.selected_count(), 1);

        let json = state.to_json().expect("シリアライズ失敗");
        let restored = BidState::from_json(&json).expect("デシリアライズ失敗");
        assert_eq!(restored.work_order, "1234");
        assert_eq!(restored.into_sheet(), sheet);
    }

    #[test]
    fn test_json_field_names() {
        let state = BidState::capture(&sample_sheet(), "77", "now");
        let json = state.to_json().unwrap();
        assert!(json.contains("\"work_order\": \"77\""));
        assert!(json.contains("\"saved_at\": \"now\""));
        assert!(json.contains("\"conjunctionKey\""));
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = r#"{"version": 99, "work_order": "1", "items": []}"#;
        let err = BidState::from_json(json).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { found: 99, supported: 1 }));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{"version": 1, "work_order": "5",
            "items": [{"category": "Mold", "itemName": "Kilz", "number": 1, "template": "Paint"}]}"#;
        let state = BidState::from_json(json).unwrap();
        assert_eq!(state.saved_at, "");
        assert_eq!(state.items[0].quantity, "0");
        assert!(!state.items[0].selected);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(BidState::from_json("{not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_legacy_format() {
        let json = r#"{
            "selected_items": {
                "Mold": {
                    "Kilz_1": {
                        "selected": true, "template": "Paint {quantity} SF", "qty": "40",
                        "unit_price": "0.50", "location": "basement", "add_info": "",
                        "original_name": "Kilz",
                        "instance_info": {"instance_id": 1, "display_name": "Kilz", "key": "Kilz_1"},
                        "conjunction_key": "A"
                    },
                    "Kilz_2": {
                        "selected": false, "template": "Paint {quantity} SF", "qty": "10",
                        "unit_price": "0.50", "location": "", "add_info": "north wall",
                        "original_name": "Kilz",
                        "instance_info": {"instance_id": 2, "display_name": "Kilz #2", "key": "Kilz_2"},
                        "conjunction_key": ""
                    }
                }
            },
            "item_photos": {"Mold_Kilz_2": "/photos/wall.png"}
        }"#;

        let state = BidState::from_json(json).unwrap();
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.bid_count(), 2);

        let sheet = state.into_sheet();
        let first = sheet.get(&InstanceId::new("Mold", "Kilz", 1)).unwrap();
        assert!(first.selected);
        assert_eq!(first.total(), 20.0);
        assert_eq!(first.conjunction_key, "A");

        let second = sheet.get(&InstanceId::new("Mold", "Kilz", 2)).unwrap();
        assert_eq!(second.info, "north wall");
        assert_eq!(second.photo, Some(PathBuf::from("/photos/wall.png")));
    }
}
