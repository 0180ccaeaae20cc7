//! 同時承認グループ
//!
//! 同じキーを持つ選択済み明細を1グループとし、
//! 見積書の並び順（明細名 → 番号 → カテゴリ）で "A1:", "A2:" ... と番号を振る。
//! 選択済みメンバーが1件だけのキーはラベルを付けない。

use crate::sheet::BidSheet;
use crate::types::InstanceId;
use std::collections::BTreeMap;

/// キーを正規化（前後空白除去・大文字化、空ならNone）
pub fn normalize_key(raw: &str) -> Option<String> {
    let key = raw.trim().to_uppercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// グループ内での位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConjunctionLabel {
    pub key: String,
    /// 1始まり
    pub position: usize,
    pub size: usize,
}

impl ConjunctionLabel {
    /// 本文の前に付ける "A1: "
    pub fn prefix(&self) -> String {
        format!("{}{}: ", self.key, self.position)
    }

    /// 本文の後に付ける注記
    pub fn suffix(&self) -> String {
        format!(
            "** {key}1 to {key}{size} must be approved together **",
            key = self.key,
            size = self.size
        )
    }
}

/// 選択済み明細のキー別グループ（キー昇順、メンバーは見積書の並び順）
#[derive(Debug, Clone, Default)]
pub struct ConjunctionGroups {
    groups: BTreeMap<String, Vec<InstanceId>>,
}

impl ConjunctionGroups {
    /// シートの選択済み明細からグループを作る
    pub fn from_sheet(sheet: &BidSheet) -> Self {
        let mut groups: BTreeMap<String, Vec<InstanceId>> = BTreeMap::new();
        for inst in sheet.selected() {
            if let Some(key) = inst.conjunction() {
                groups.entry(key).or_default().push(inst.id.clone());
            }
        }
        for members in groups.values_mut() {
            members.sort_by(InstanceId::cmp_bid_order);
        }
        Self { groups }
    }

    /// 明細のラベル（2件以上のグループに属する場合のみ）
    pub fn label_for(&self, id: &InstanceId, raw_key: &str) -> Option<ConjunctionLabel> {
        let key = normalize_key(raw_key)?;
        let members = self.groups.get(&key)?;
        if members.len() < 2 {
            return None;
        }
        let index = members.iter().position(|m| m == id)?;
        Some(ConjunctionLabel {
            key,
            position: index + 1,
            size: members.len(),
        })
    }

    /// キー昇順でグループを列挙
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[InstanceId])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn members(&self, key: &str) -> Option<&[InstanceId]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
