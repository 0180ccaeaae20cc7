//! Bid Writer Common Library
//!
//! CLIで使う見積エンジン（カタログ・テンプレート差し込み・金額計算・同時承認グループ・保存形式）

pub mod catalog;
pub mod compose;
pub mod conjunction;
pub mod error;
pub mod estimator;
pub mod export;
pub mod pricing;
pub mod sheet;
pub mod state;
pub mod template;
pub mod types;

pub use catalog::{Catalog, Category};
pub use compose::{compose, preview, Bid, Proposal};
pub use conjunction::{normalize_key, ConjunctionGroups, ConjunctionLabel};
pub use error::{Error, Result};
pub use estimator::{Client, GrassInput, GrassTier, PricingTables, RoofInput, RoofService};
pub use export::ProposalHeader;
pub use pricing::{format_money, line_total, parse_amount, round_cents};
pub use sheet::BidSheet;
pub use state::{BidState, STATE_VERSION};
pub use template::{render, render_or_raw, TemplateError};
pub use types::{CatalogItem, InstanceId, InstanceUpdate, ItemInstance};
