//! 見積シート（作業指示1件分の明細インスタンス集合）
//!
//! 各カタログ明細は必ず #1 を持ち、"+" で #2, #3 ... を追加できる。
//! #1 は削除できない。

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::types::{InstanceId, InstanceUpdate, ItemInstance};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BidSheet {
    instances: BTreeMap<InstanceId, ItemInstance>,
}

impl BidSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// カタログの全明細に #1 を用意したシート
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut sheet = Self::new();
        sheet.ensure_base_instances(catalog);
        sheet
    }

    /// インスタンスを持たないカタログ明細に #1 を追加
    ///
    /// 追加した件数を返す。
    pub fn ensure_base_instances(&mut self, catalog: &Catalog) -> usize {
        let mut added = 0;
        for item in catalog.items() {
            let exists = self
                .instances
                .keys()
                .any(|id| id.category == item.category && id.item_name == item.item_name);
            if !exists {
                let inst = ItemInstance::from_catalog(item, 1);
                self.instances.insert(inst.id.clone(), inst);
                added += 1;
            }
        }
        added
    }

    /// 既存インスタンスをそのまま登録（保存データの復元用）
    pub fn insert(&mut self, instance: ItemInstance) -> Option<ItemInstance> {
        self.instances.insert(instance.id.clone(), instance)
    }

    /// 明細のインスタンスを追加（番号 = 既存の最大 + 1）
    pub fn add_instance(
        &mut self,
        catalog: &Catalog,
        category: &str,
        item_name: &str,
    ) -> Result<InstanceId> {
        let item = catalog
            .find(category, item_name)
            .ok_or_else(|| Error::UnknownItem {
                category: category.to_string(),
                item_name: item_name.to_string(),
            })?;

        let next_number = self
            .instances
            .keys()
            .filter(|id| id.category == category && id.item_name == item_name)
            .map(|id| id.number)
            .max()
            .map_or(1, |n| n + 1);

        let inst = ItemInstance::from_catalog(item, next_number);
        let id = inst.id.clone();
        self.instances.insert(id.clone(), inst);
        Ok(id)
    }

    /// インスタンスを削除（写真の参照も一緒に消える）
    pub fn delete_instance(&mut self, id: &InstanceId) -> Result<ItemInstance> {
        if !self.instances.contains_key(id) {
            return Err(Error::UnknownInstance(id.to_string()));
        }
        if id.is_base() {
            return Err(Error::BaseInstance(id.to_string()));
        }
        self.instances
            .remove(id)
            .ok_or_else(|| Error::UnknownInstance(id.to_string()))
    }

    pub fn get(&self, id: &InstanceId) -> Option<&ItemInstance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &InstanceId) -> Result<&mut ItemInstance> {
        self.instances
            .get_mut(id)
            .ok_or_else(|| Error::UnknownInstance(id.to_string()))
    }

    /// 選択状態を反転し、反転後の状態を返す
    pub fn toggle(&mut self, id: &InstanceId) -> Result<bool> {
        let inst = self.get_mut(id)?;
        inst.selected = !inst.selected;
        Ok(inst.selected)
    }

    pub fn set_selected(&mut self, id: &InstanceId, selected: bool) -> Result<()> {
        self.get_mut(id)?.selected = selected;
        Ok(())
    }

    pub fn update(&mut self, id: &InstanceId, update: InstanceUpdate) -> Result<()> {
        let inst = self.get_mut(id)?;
        update.apply(inst);
        Ok(())
    }

    /// 入力をすべてリセット（インスタンスと写真は残す）
    ///
    /// 単価はカタログの初期値に戻す。カタログから消えた明細は現在値のまま。
    pub fn clear(&mut self, catalog: &Catalog) {
        for inst in self.instances.values_mut() {
            inst.selected = false;
            inst.quantity = "0".to_string();
            if let Some(price) = catalog.initial_price(&inst.id.category, &inst.id.item_name) {
                inst.unit_price = price.to_string();
            }
            inst.location.clear();
            inst.info.clear();
            inst.conjunction_key.clear();
            inst.custom_text = None;
        }
    }

    /// InstanceId順の全インスタンス
    pub fn instances(&self) -> impl Iterator<Item = &ItemInstance> {
        self.instances.values()
    }

    /// カテゴリ内のインスタンス（InstanceId順）
    pub fn instances_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a ItemInstance> {
        self.instances
            .values()
            .filter(move |inst| inst.id.category == category)
    }

    /// 選択済みインスタンス（InstanceId順）
    pub fn selected(&self) -> impl Iterator<Item = &ItemInstance> {
        self.instances.values().filter(|inst| inst.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    /// シートに登場するカテゴリ名（昇順、重複なし）
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.instances.keys().map(|id| id.category.as_str()).collect();
        names.dedup();
        names
    }

    /// 明細名・テンプレート・カテゴリ名の部分一致検索（大文字小文字無視）
    pub fn search(&self, term: &str) -> Vec<&InstanceId> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        self.instances
            .values()
            .filter(|inst| {
                inst.id.category.to_lowercase().contains(&term)
                    || inst.id.item_name.to_lowercase().contains(&term)
                    || inst.template.to_lowercase().contains(&term)
            })
            .map(|inst| &inst.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
