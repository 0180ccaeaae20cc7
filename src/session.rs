//! 作業指示1件分の編集セッション
//!
//! 保存データを読み込み、カタログに追加された明細の #1 を補い、
//! 編集後に保存する。

use crate::error::{BidWriterError, Result};
use crate::store::{validate_work_order, StateStore};
use bid_writer_common::{compose, BidSheet, BidState, Catalog, InstanceId, Proposal};
use chrono::Local;
use std::path::PathBuf;

pub struct Session {
    pub work_order: String,
    pub sheet: BidSheet,
}

impl Session {
    /// 新規作成（既存データがある場合は `overwrite` が必要）
    pub fn create(store: &StateStore, catalog: &Catalog, work_order: &str, overwrite: bool) -> Result<Self> {
        let work_order = validate_work_order(work_order)?;
        if store.exists(&work_order) && !overwrite {
            return Err(BidWriterError::StateExists(work_order));
        }
        Ok(Self {
            work_order,
            sheet: BidSheet::from_catalog(catalog),
        })
    }

    /// 保存データを開く
    pub fn open(store: &StateStore, catalog: &Catalog, work_order: &str) -> Result<Self> {
        let state = store.load(work_order)?;
        let work_order = state.work_order.clone();
        let mut sheet = state.into_sheet();

        let added = sheet.ensure_base_instances(catalog);
        if added > 0 {
            tracing::info!("カタログに追加された明細 {} 件をシートに補充", added);
        }

        let mut session = Self { work_order, sheet };
        let dropped = session.drop_missing_photos()?;
        if !dropped.is_empty() {
            tracing::warn!("見つからない写真 {} 件の参照を外しました", dropped.len());
        }
        Ok(session)
    }

    pub fn save(&self, store: &StateStore) -> Result<PathBuf> {
        let state = BidState::capture(&self.sheet, &self.work_order, Local::now().to_rfc3339());
        store.save(&state)
    }

    /// ファイルが存在しない写真の参照を外し、対象のIDを返す
    pub fn drop_missing_photos(&mut self) -> Result<Vec<InstanceId>> {
        let missing: Vec<InstanceId> = self
            .sheet
            .instances()
            .filter(|inst| inst.photo.as_ref().is_some_and(|p| !p.exists()))
            .map(|inst| inst.id.clone())
            .collect();

        for id in &missing {
            self.sheet.get_mut(id)?.photo = None;
        }
        Ok(missing)
    }

    /// 見積書を組み立てる（選択なしはエラー）
    pub fn proposal(&self) -> Result<Proposal> {
        let proposal = compose(&self.sheet);
        if proposal.is_empty() {
            return Err(BidWriterError::NoBidsSelected);
        }
        Ok(proposal)
    }
}
