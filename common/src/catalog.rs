//! 見積カタログ
//!
//! スプレッドシート（CSV）の `Category` / `Item` / `Template` / `Unit Price`
//! 列からカテゴリ別の明細一覧を作る。カテゴリ・明細の順序は
//! 元データの出現順を保つ。

use crate::error::{Error, Result};
use crate::template::placeholders;
use crate::types::CatalogItem;
use serde::{Deserialize, Serialize};

pub const COL_CATEGORY: &str = "Category";
pub const COL_ITEM: &str = "Item";
pub const COL_TEMPLATE: &str = "Template";
pub const COL_UNIT_PRICE: &str = "Unit Price";

const DEFAULT_UNIT_PRICE: &str = "0.00";

/// 差し込み可能なプレースホルダ名
const KNOWN_PLACEHOLDERS: &[&str] = &["quantity", "location", "info", "cause", "total"];

/// カテゴリ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub items: Vec<CatalogItem>,
}

/// カテゴリ別の明細一覧
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 明細を追加（同じカテゴリ内の同名明細は先勝ち）
    ///
    /// 追加した場合は true
    pub fn push(&mut self, item: CatalogItem) -> bool {
        let index = match self.categories.iter().position(|c| c.name == item.category) {
            Some(i) => i,
            None => {
                self.categories.push(Category {
                    name: item.category.clone(),
                    items: Vec::new(),
                });
                self.categories.len() - 1
            }
        };

        let category = &mut self.categories[index];
        if category.items.iter().any(|i| i.item_name == item.item_name) {
            return false;
        }
        category.items.push(item);
        true
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn find(&self, category: &str, item_name: &str) -> Option<&CatalogItem> {
        self.category(category)?
            .items
            .iter()
            .find(|i| i.item_name == item_name)
    }

    /// カタログ上の初期単価
    pub fn initial_price(&self, category: &str, item_name: &str) -> Option<&str> {
        self.find(category, item_name).map(|i| i.unit_price.as_str())
    }

    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    /// 明細数
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// カテゴリ名・明細名・テンプレートの部分一致検索（大文字小文字無視）
    pub fn search(&self, term: &str) -> Vec<&CatalogItem> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        self.items()
            .filter(|item| {
                item.category.to_lowercase().contains(&term)
                    || item.item_name.to_lowercase().contains(&term)
                    || item.template.to_lowercase().contains(&term)
            })
            .collect()
    }

    /// テンプレートの問題点を列挙（読み込みは止めない）
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for item in self.items() {
            match placeholders(&item.template) {
                Ok(names) => {
                    for name in names {
                        if !KNOWN_PLACEHOLDERS.contains(&name.as_str()) {
                            warnings.push(format!(
                                "{}/{}: unknown placeholder {{{}}}",
                                item.category, item.item_name, name
                            ));
                        }
                    }
                }
                Err(e) => warnings.push(format!("{}/{}: {}", item.category, item.item_name, e)),
            }
        }
        warnings
    }

    /// ヘッダー行とデータ行から読み込み（CSV/Excel共通）
    ///
    /// 必須列が欠けている行・空の行は読み飛ばす。
    pub fn from_rows<I, R>(header: &[String], rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let column = |name: &str| header.iter().position(|h| h.trim() == name);

        let (category_col, item_col, template_col) =
            match (column(COL_CATEGORY), column(COL_ITEM), column(COL_TEMPLATE)) {
                (Some(c), Some(i), Some(t)) => (c, i, t),
                _ => {
                    return Err(Error::Catalog(format!(
                        "missing required columns ({}, {}, {}); found: {}",
                        COL_CATEGORY,
                        COL_ITEM,
                        COL_TEMPLATE,
                        header.join(", ")
                    )))
                }
            };
        let price_col = column(COL_UNIT_PRICE);

        let mut catalog = Self::new();
        for row in rows {
            let row = row.as_ref();
            let cell = |i: usize| row.get(i).map(|s| s.trim()).filter(|s| !s.is_empty());

            let (Some(category), Some(item_name), Some(template)) =
                (cell(category_col), cell(item_col), row.get(template_col))
            else {
                continue;
            };
            if template.trim().is_empty() {
                continue;
            }

            let unit_price = price_col
                .and_then(cell)
                .unwrap_or(DEFAULT_UNIT_PRICE);

            catalog.push(CatalogItem::new(category, item_name, template.as_str(), unit_price));
        }

        Ok(catalog)
    }

    /// CSV文字列から読み込み
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let text = text.trim_start_matches('\u{feff}');
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        Self::from_rows(&header, rows)
    }

    /// 組み込みのデフォルトカタログ（オンラインカタログが読めない場合）
    pub fn default_catalog() -> Self {
        let mut catalog = Self::new();
        let items = [
            (
                "Landscaping",
                "Trim Shrubs",
                "Trim {quantity} LF of shrubs from the {location} of the property. Price includes time, labor and disposal of generated debris. {info}\nPrice: ${total:.2f}",
                "15.00",
            ),
            (
                "Landscaping",
                "Trim Tree",
                "Trim {quantity} LF from the medium tree 30' tall and 18\" in diameter from {location} of the property. Price includes time, labor and disposal of generated debris. {info}\nPrice: ${total:.2f}",
                "125.00",
            ),
            (
                "Mold",
                "Antimicrobial",
                "Clean & wipe {quantity} SF area of moldy walls in the {location}. Price includes time, labor, required materials and the removal of the generated debris. Must be approved with the Kilz bid. {info}\nPrice: ${total:.2f}",
                "0.40",
            ),
            (
                "Mold",
                "Kilz",
                "Paint 1 coat of Kilz to {quantity} SF area of moldy walls in the {location}. Price includes time, labor, required materials and the removal of the generated debris. Source of the mold: roof leakage. Must be approved with the Kilz bid. {info}\nPrice: ${total:.2f}",
                "0.50",
            ),
        ];

        for (category, item_name, template, price) in items {
            catalog.push(CatalogItem::new(category, item_name, template, price));
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Category,Item,Template,Unit Price
Landscaping,Trim Shrubs,\"Trim {quantity} LF in {location}. Price: ${total:.2f}\",15.00
Mold,Kilz,\"Paint {quantity} SF, {location}\",0.50
Landscaping,Haul Debris,Haul {quantity} CY of debris,
Landscaping,Trim Shrubs,Duplicate row,99.00
,Orphan,No category,1.00
";

    #[test]
    fn test_from_csv_preserves_order() {
        let catalog = Catalog::from_csv_str(SAMPLE_CSV).unwrap();
        let names: Vec<&str> = catalog.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Landscaping", "Mold"]);

        let landscaping = catalog.category("Landscaping").unwrap();
        assert_eq!(landscaping.items.len(), 2);
        assert_eq!(landscaping.items[0].item_name, "Trim Shrubs");
        assert_eq!(landscaping.items[1].item_name, "Haul Debris");
    }

    #[test]
    fn test_from_csv_defaults_and_duplicates() {
        let catalog = Catalog::from_csv_str(SAMPLE_CSV).unwrap();
        // 単価が空なら 0.00
        assert_eq!(catalog.initial_price("Landscaping", "Haul Debris"), Some("0.00"));
        // 重複は先勝ち
        assert_eq!(catalog.initial_price("Landscaping", "Trim Shrubs"), Some("15.00"));
        // カテゴリなしの行は読み飛ばす
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_from_csv_quoted_template() {
        let catalog = Catalog::from_csv_str(SAMPLE_CSV).unwrap();
        let kilz = catalog.find("Mold", "Kilz").unwrap();
        assert_eq!(kilz.template, "Paint {quantity} SF, {location}");
    }

    #[test]
    fn test_from_csv_missing_columns() {
        let err = Catalog::from_csv_str("Name,Price\nA,1\n").unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
    }

    #[test]
    fn test_from_csv_without_price_column() {
        let catalog = Catalog::from_csv_str("Category,Item,Template\nMold,Kilz,Paint\n").unwrap();
        assert_eq!(catalog.initial_price("Mold", "Kilz"), Some("0.00"));
    }

    #[test]
    fn test_from_csv_bom() {
        let catalog = Catalog::from_csv_str("\u{feff}Category,Item,Template\nMold,Kilz,Paint\n").unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_default_catalog() {
        let catalog = Catalog::default_catalog();
        assert_eq!(catalog.categories().len(), 2);
        assert_eq!(catalog.len(), 4);
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_search() {
        let catalog = Catalog::default_catalog();
        let hits = catalog.search("KILZ");
        // Kilz本体と、テンプレートに"Kilz"を含むAntimicrobial
        assert_eq!(hits.len(), 2);
        assert!(catalog.search("  ").is_empty());
        assert_eq!(catalog.search("landsc").len(), 2);
    }

    #[test]
    fn test_validate_reports_unknown_placeholder() {
        let mut catalog = Catalog::new();
        catalog.push(CatalogItem::new("Paint", "Walls", "Paint {color} walls", "1.00"));
        catalog.push(CatalogItem::new("Paint", "Trim", "Paint {quantity LF", "1.00"));
        let warnings = catalog.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("{color}"));
    }
}
