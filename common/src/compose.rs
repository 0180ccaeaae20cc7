//! 見積書の組み立て
//!
//! 選択済み明細を以下の順に並べて 1, 2, 3 ... と通し番号を振る:
//! 1. 同時承認グループ（キー昇順、グループ内は明細名 → 番号 → カテゴリ順）
//! 2. 単独の明細（同じく明細名 → 番号 → カテゴリ順）

use crate::conjunction::{ConjunctionGroups, ConjunctionLabel};
use crate::error::{Error, Result};
use crate::pricing::{format_money, round_cents};
use crate::sheet::BidSheet;
use crate::types::{InstanceId, ItemInstance};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 見積書の1行
#[derive(Debug, Clone, PartialEq)]
pub struct Bid {
    pub number: usize,
    pub id: InstanceId,
    /// ラベル・注記込みの本文
    pub text: String,
    pub total: f64,
    pub photo: Option<PathBuf>,
    /// 同時承認キー（ラベルが付いた場合のみ）
    pub conjunction: Option<String>,
}

/// 組み立て済みの見積書
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proposal {
    pub bids: Vec<Bid>,
    pub grand_total: f64,
}

impl Proposal {
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }

    /// カテゴリ別の件数（カテゴリ名昇順）
    pub fn category_summary(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for bid in &self.bids {
            *counts.entry(bid.id.category.as_str()).or_default() += 1;
        }
        counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    /// 複数カテゴリにまたがるか
    pub fn is_multi_category(&self) -> bool {
        self.category_summary().len() > 1
    }

    /// 画面確認用の一覧（番号付き本文 + 価格行）
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for bid in &self.bids {
            out.push_str(&format!("{}. {}\n", bid.number, bid.text));
            out.push_str(&format!("Price: ${}\n", format_money(bid.total)));
            if let Some(photo) = &bid.photo {
                out.push_str(&format!("[Photo: {}]\n", photo.display()));
            }
        }
        out
    }
}

/// 本文にラベルと注記を付ける
fn decorate(body: &str, label: Option<&ConjunctionLabel>) -> String {
    match label {
        Some(label) => format!("{}{}\n{}", label.prefix(), body, label.suffix())
            .trim()
            .to_string(),
        None => body.trim().to_string(),
    }
}

fn label_for(groups: &ConjunctionGroups, inst: &ItemInstance) -> Option<ConjunctionLabel> {
    if !inst.selected {
        return None;
    }
    groups.label_for(&inst.id, &inst.conjunction_key)
}

/// 明細1件のプレビュー文
pub fn preview(sheet: &BidSheet, id: &InstanceId) -> Result<String> {
    let inst = sheet
        .get(id)
        .ok_or_else(|| Error::UnknownInstance(id.to_string()))?;
    let groups = ConjunctionGroups::from_sheet(sheet);
    Ok(decorate(&inst.body_text(), label_for(&groups, inst).as_ref()))
}

/// 選択済み明細から見積書を組み立てる
pub fn compose(sheet: &BidSheet) -> Proposal {
    let groups = ConjunctionGroups::from_sheet(sheet);

    let mut ordered: Vec<&ItemInstance> = Vec::new();
    for (_, members) in groups.iter() {
        ordered.extend(members.iter().filter_map(|id| sheet.get(id)));
    }
    let mut standalone: Vec<&ItemInstance> = sheet
        .selected()
        .filter(|inst| inst.conjunction().is_none())
        .collect();
    standalone.sort_by(|a, b| a.id.cmp_bid_order(&b.id));
    ordered.extend(standalone);

    let bids: Vec<Bid> = ordered
        .into_iter()
        .enumerate()
        .map(|(i, inst)| {
            let label = label_for(&groups, inst);
            Bid {
                number: i + 1,
                id: inst.id.clone(),
                text: decorate(&inst.body_text(), label.as_ref()),
                total: inst.total(),
                photo: inst.photo.clone(),
                conjunction: label.map(|l| l.key),
            }
        })
        .collect();

    let grand_total = round_cents(bids.iter().map(|b| b.total).sum());

    Proposal { bids, grand_total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::types::{CatalogItem, InstanceUpdate};

    fn sheet_with(items: &[(&str, &str, &str)]) -> BidSheet {
        let mut catalog = Catalog::new();
        for (category, name, _) in items {
            catalog.push(CatalogItem::new(
                *category,
                *name,
                format!("{} x{{quantity}} at {{location}}", name),
                "10.00",
            ));
        }
        let mut sheet = BidSheet::from_catalog(&catalog);
        for (category, name, key) in items {
            sheet
                .update(
                    &InstanceId::new(*category, *name, 1),
                    InstanceUpdate {
                        quantity: Some("2".to_string()),
                        selected: Some(true),
                        conjunction_key: Some(key.to_string()),
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        sheet
    }

    #[test]
    fn test_compose_orders_groups_then_standalone() {
        let sheet = sheet_with(&[
            ("Roof", "Tarp", ""),
            ("Mold", "Kilz", "b"),
            ("Mold", "Antimicrobial", "B"),
            ("Yard", "Mow", "A"),
            ("Yard", "Edge", "a"),
            ("Doors", "Lock", ""),
        ]);

        let proposal = compose(&sheet);
        let order: Vec<&str> = proposal.bids.iter().map(|b| b.id.item_name.as_str()).collect();
        assert_eq!(order, vec!["Edge", "Mow", "Antimicrobial", "Kilz", "Lock", "Tarp"]);

        let numbers: Vec<usize> = proposal.bids.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_cross_category_group_numbers_by_item_name() {
        let sheet = sheet_with(&[("Landscaping", "Zebra", "A"), ("Mold", "Apple", "a")]);
        let proposal = compose(&sheet);

        assert_eq!(
            proposal.bids[0].text,
            "A1: Apple x2 at N/A\n** A1 to A2 must be approved together **"
        );
        assert_eq!(proposal.bids[0].id.category, "Mold");
        assert_eq!(
            proposal.bids[1].text,
            "A2: Zebra x2 at N/A\n** A1 to A2 must be approved together **"
        );
    }

    #[test]
    fn test_standalone_bids_ignore_category_order() {
        let sheet = sheet_with(&[
            ("Doors", "Rekey", ""),
            ("Yard", "Edge", ""),
            ("Attic", "Seal", "K"),
            ("Basement", "Pump", "k"),
            ("Roof", "Edge", ""),
        ]);
        let proposal = compose(&sheet);

        let order: Vec<String> = proposal.bids.iter().map(|b| b.id.to_string()).collect();
        assert_eq!(
            order,
            vec![
                "Basement/Pump#1",
                "Attic/Seal#1",
                "Roof/Edge#1",
                "Yard/Edge#1",
                "Doors/Rekey#1",
            ]
        );
    }

    #[test]
    fn test_compose_labels() {
        let sheet = sheet_with(&[("Yard", "Mow", "A"), ("Yard", "Edge", "a"), ("Roof", "Tarp", "")]);
        let proposal = compose(&sheet);

        assert_eq!(
            proposal.bids[0].text,
            "A1: Edge x2 at N/A\n** A1 to A2 must be approved together **"
        );
        assert_eq!(proposal.bids[1].text, "A2: Mow x2 at N/A\n** A1 to A2 must be approved together **");
        assert_eq!(proposal.bids[0].conjunction.as_deref(), Some("A"));
        assert_eq!(proposal.bids[2].text, "Tarp x2 at N/A");
        assert_eq!(proposal.bids[2].conjunction, None);
    }

    #[test]
    fn test_single_member_group_is_unlabelled_but_grouped_first() {
        let sheet = sheet_with(&[("Roof", "Tarp", ""), ("Yard", "Mow", "z")]);
        let proposal = compose(&sheet);
        assert_eq!(proposal.bids[0].id.item_name, "Mow");
        assert_eq!(proposal.bids[0].text, "Mow x2 at N/A");
        assert_eq!(proposal.bids[0].conjunction, None);
    }

    #[test]
    fn test_compose_totals() {
        let sheet = sheet_with(&[("Yard", "Mow", ""), ("Yard", "Edge", "")]);
        let proposal = compose(&sheet);
        assert_eq!(proposal.bids[0].total, 20.0);
        assert_eq!(proposal.grand_total, 40.0);
        assert_eq!(proposal.category_summary(), vec![("Yard".to_string(), 2)]);
        assert!(!proposal.is_multi_category());
    }

    #[test]
    fn test_compose_empty_selection() {
        let sheet = BidSheet::from_catalog(&Catalog::default_catalog());
        let proposal = compose(&sheet);
        assert!(proposal.is_empty());
        assert_eq!(proposal.grand_total, 0.0);
        assert_eq!(proposal.listing(), "");
    }

    #[test]
    fn test_preview_unselected_has_no_label() {
        let mut sheet = sheet_with(&[("Yard", "Mow", "A"), ("Yard", "Edge", "A"), ("Yard", "Rake", "A")]);
        let rake = InstanceId::new("Yard", "Rake", 1);
        sheet.toggle(&rake).unwrap();

        assert_eq!(preview(&sheet, &rake).unwrap(), "Rake x2 at N/A");
        let edge = preview(&sheet, &InstanceId::new("Yard", "Edge", 1)).unwrap();
        assert!(edge.starts_with("A1: "));
        assert!(edge.ends_with("** A1 to A2 must be approved together **"));
    }

    #[test]
    fn test_preview_unknown_instance() {
        let sheet = BidSheet::new();
        let err = preview(&sheet, &InstanceId::new("Yard", "Mow", 1)).unwrap_err();
        assert!(matches!(err, Error::UnknownInstance(_)));
    }

    #[test]
    fn test_listing_includes_price_lines() {
        let sheet = sheet_with(&[("Yard", "Mow", "")]);
        let listing = compose(&sheet).listing();
        assert_eq!(listing, "1. Mow x2 at N/A\nPrice: $20.00\n");
    }

    #[test]
    fn test_custom_text_keeps_conjunction_label() {
        let mut sheet = sheet_with(&[("Yard", "Mow", "A"), ("Yard", "Edge", "A")]);
        sheet
            .update(
                &InstanceId::new("Yard", "Mow", 1),
                InstanceUpdate {
                    custom_text: Some(Some("Mow the whole lot.".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();
        let proposal = compose(&sheet);
        assert!(proposal.bids[1].text.starts_with("A2: Mow the whole lot."));
    }
}
