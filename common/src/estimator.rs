//! 現場見積（草刈り・屋根）
//!
//! 草刈り: 草丈で料金帯を選び、管理面積 5000 SF 超過分を 1000 SF 単位で加算する。
//! 屋根: サービス × 階数 × 顧客区分の単価表から 単価 × 面積。

use crate::error::{Error, Result};
use crate::pricing::{parse_amount, round_cents};
use crate::template::{render, Value};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    /// 価格セルから数字と小数点以外を除く
    static ref NON_NUMERIC_RE: Regex = Regex::new(r"[^\d.]").unwrap();
}

/// 基本料金で済む管理面積の上限 (SF)
pub const BASE_LOT_SF: f64 = 5000.0;
/// 加算単位 (SF)
pub const ADDITIONAL_UNIT_SF: f64 = 1000.0;
/// 許容草丈 (inch)
pub const ALLOWABLE_HEIGHT: f64 = 12.0;

const COL_SERVICE_TYPE: &str = "Service Type";

const DEFAULT_GRASS_TEMPLATE: &str = "Perform initial grass cut of [{grass_condition}] grass measuring up to {grass_height} inch on {maintainable_lot} sq ft area. Price includes equipment, labor and removal of generated debris. (Total lot size: {total_lot} SF, Maintainable area: {maintainable_lot} SF) {disclaimer}";

const REPLACE_TEMPLATE: &str = "Remove and replace approximately {roof_area} SF Roof. Includes removal and replacement of {roof_area} SF asphalt shingles, removal and replacement of {roof_area} SF area of felt, removal and replacement of {edge_metal} LF of edge metal, removal and replacement of {ice_shield} SF of ice and water shield, removal and replacement of {flashing} LF of flashing, removal and replacement of {ridge_cap} LF ridge cap, {roof_jack} roof jack. Permit will be pulled an invoiced if needed. If additional damage is found in the roof decking, $175.00 will be needed for each 32 SF of decking* May take 5-6 weeks to complete. Price includes time, labor, materials and the removal of the generated debris.\nPrice: ${price:.2f}";

const TARP_TEMPLATE: &str = "Install heavy duty brown/black {roof_area} SF tarp on a leaking roof. The tarp must be secured with furring strips around the perimeter and slope of the roof. Secure the tarp with an adequate number of furring strips throughout the roof to hold the tarp during heavy wind. *Note: This is a temporary solution only, roof replacement is recommended.\nPrice: ${price:.2f}";

// ============================================
// 草刈り
// ============================================

/// 草丈の料金帯
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrassTier {
    /// 2" 以上 12" 以下
    UpTo12,
    UpTo24,
    UpTo36,
    UpTo48,
    Above48,
}

impl GrassTier {
    pub const ALL: [GrassTier; 5] = [
        GrassTier::UpTo12,
        GrassTier::UpTo24,
        GrassTier::UpTo36,
        GrassTier::UpTo48,
        GrassTier::Above48,
    ];

    /// 草丈から料金帯を判定（2" 未満は対象外）
    pub fn for_height(height: f64) -> Option<Self> {
        if !height.is_finite() || height < 2.0 {
            None
        } else if height <= 12.0 {
            Some(Self::UpTo12)
        } else if height <= 24.0 {
            Some(Self::UpTo24)
        } else if height <= 36.0 {
            Some(Self::UpTo36)
        } else if height <= 48.0 {
            Some(Self::UpTo48)
        } else {
            Some(Self::Above48)
        }
    }

    /// 価格表の "Grass Height" 列の表記
    pub fn label(&self) -> &'static str {
        match self {
            Self::UpTo12 => "2\"-12\"",
            Self::UpTo24 => "12\"-24\"",
            Self::UpTo36 => "24\"-36\"",
            Self::UpTo48 => "36\"-48\"",
            Self::Above48 => "Above 48\"",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for GrassTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 料金帯ごとの単価とテンプレート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrassRate {
    pub base: f64,
    /// 1000 SF あたりの加算額
    pub additional: f64,
    pub template: String,
}

/// 草刈りの入力（数値欄は入力された文字列のまま）
#[derive(Debug, Clone, Default)]
pub struct GrassInput {
    pub grass_height: String,
    pub maintainable_lot: String,
    pub total_lot: String,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrassEstimate {
    pub tier: GrassTier,
    pub price: f64,
    pub text: String,
}

/// 草丈の状態表記
pub fn grass_condition(height: f64) -> &'static str {
    if height > ALLOWABLE_HEIGHT {
        "over the allowable"
    } else if height > 0.0 {
        "allowable"
    } else {
        "[Invalid Height]"
    }
}

/// 草刈り料金
pub fn grass_price(rate: &GrassRate, maintainable_lot: f64) -> f64 {
    if maintainable_lot <= BASE_LOT_SF {
        return round_cents(rate.base);
    }
    let units = ((maintainable_lot - BASE_LOT_SF) / ADDITIONAL_UNIT_SF).ceil();
    round_cents(rate.base + units * rate.additional)
}

// ============================================
// 屋根
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoofService {
    Tarp,
    Replace,
}

impl fmt::Display for RoofService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tarp => f.write_str("Tarp"),
            Self::Replace => f.write_str("Replace"),
        }
    }
}

impl FromStr for RoofService {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tarp" => Ok(Self::Tarp),
            "replace" => Ok(Self::Replace),
            _ => Err(Error::Estimate(format!("unknown roof service: {}", s))),
        }
    }
}

/// 顧客区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Client {
    FlatFee,
    Slfs,
    Scfs,
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlatFee => f.write_str("Flat Fee"),
            Self::Slfs => f.write_str("SLFS"),
            Self::Scfs => f.write_str("SCFS"),
        }
    }
}

impl FromStr for Client {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "flat fee" | "flatfee" | "flat" => Ok(Self::FlatFee),
            "slfs" => Ok(Self::Slfs),
            "scfs" => Ok(Self::Scfs),
            _ => Err(Error::Estimate(format!("unknown client: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoofInput {
    pub roof_area: f64,
    pub edge_metal: f64,
    pub ridge_cap: f64,
    pub roof_jack: f64,
    pub storey: u32,
    pub client: Client,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoofEstimate {
    pub tarp_price: f64,
    pub replace_price: f64,
    /// 葺き替えの見積文
    pub replace_text: String,
    /// ブルーシート養生の見積文
    pub tarp_text: String,
}

impl RoofEstimate {
    /// 葺き替え → 養生の順に空行区切りで連結
    pub fn text(&self) -> String {
        format!("{}\n\n{}", self.replace_text, self.tarp_text)
    }
}

// ============================================
// 価格表
// ============================================

/// 草刈り・屋根の価格表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingTables {
    pub grass: BTreeMap<GrassTier, GrassRate>,
    pub roof: BTreeMap<(RoofService, u32, Client), f64>,
}

impl PricingTables {
    /// 組み込みの価格表
    pub fn default_tables() -> Self {
        let grass_rates = [
            (GrassTier::UpTo12, 79.68, 8.74),
            (GrassTier::UpTo24, 111.55, 15.22),
            (GrassTier::UpTo36, 152.90, 22.63),
            (GrassTier::UpTo48, 204.84, 30.02),
            (GrassTier::Above48, 253.42, 37.07),
        ];
        let grass = grass_rates
            .into_iter()
            .map(|(tier, base, additional)| {
                (
                    tier,
                    GrassRate {
                        base,
                        additional,
                        template: DEFAULT_GRASS_TEMPLATE.to_string(),
                    },
                )
            })
            .collect();

        use Client::*;
        use RoofService::*;
        let roof = [
            ((Tarp, 1, FlatFee), 1.00),
            ((Tarp, 1, Slfs), 1.25),
            ((Tarp, 1, Scfs), 1.30),
            ((Tarp, 2, FlatFee), 1.35),
            ((Tarp, 2, Slfs), 1.68),
            ((Tarp, 2, Scfs), 1.75),
            ((Replace, 1, FlatFee), 8.50),
            ((Replace, 1, Slfs), 9.50),
            ((Replace, 1, Scfs), 10.00),
            ((Replace, 2, FlatFee), 9.00),
            ((Replace, 2, Slfs), 10.00),
            ((Replace, 2, Scfs), 10.50),
        ]
        .into_iter()
        .collect();

        Self { grass, roof }
    }

    /// `Service Type` 列で草刈り行と屋根行を振り分けて読み込む
    ///
    /// 行の値が壊れていればエラー。どちらの表も空ならエラー。
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let text = text.trim_start_matches('\u{feff}');
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());
        let header: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let column = |name: &str| header.iter().position(|h| h == name);

        let service_type_col = column(COL_SERVICE_TYPE)
            .ok_or_else(|| Error::Estimate(format!("missing column: {}", COL_SERVICE_TYPE)))?;

        let mut tables = Self::default();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = index + 2;
            let field = |name: &str| -> Result<&str> {
                column(name)
                    .and_then(|i| record.get(i))
                    .map(str::trim)
                    .ok_or_else(|| Error::Estimate(format!("line {}: missing {}", line, name)))
            };

            match record.get(service_type_col).map(str::trim) {
                Some("Grass Cut") => {
                    let Some(tier) = GrassTier::from_label(field("Grass Height")?) else {
                        continue;
                    };
                    let base = parse_price(field("Base Price")?, line)?;
                    let additional = parse_price(field("Additional Price per 1000 SF")?, line)?;
                    let template = column("Template")
                        .and_then(|i| record.get(i))
                        .unwrap_or_default()
                        .to_string();
                    tables.grass.insert(tier, GrassRate { base, additional, template });
                }
                Some("Roofing") => {
                    let service: RoofService = field("Service")?.parse()?;
                    let storey: u32 = field("Storey")?
                        .parse()
                        .map_err(|_| Error::Estimate(format!("line {}: invalid storey", line)))?;
                    let client: Client = field("Client")?.parse()?;
                    let rate: f64 = field("Rate")?
                        .parse()
                        .map_err(|_| Error::Estimate(format!("line {}: invalid rate", line)))?;
                    tables.roof.insert((service, storey, client), rate);
                }
                _ => {}
            }
        }

        if tables.grass.is_empty() && tables.roof.is_empty() {
            return Err(Error::Estimate("no pricing rows found".to_string()));
        }
        Ok(tables)
    }

    pub fn grass_rate(&self, tier: GrassTier) -> Result<&GrassRate> {
        self.grass
            .get(&tier)
            .ok_or_else(|| Error::Estimate(format!("pricing data missing for {}", tier)))
    }

    pub fn roof_rate(&self, service: RoofService, storey: u32, client: Client) -> Result<f64> {
        self.roof.get(&(service, storey, client)).copied().ok_or_else(|| {
            Error::Estimate(format!(
                "pricing missing for {}, {} storey, {}",
                service, storey, client
            ))
        })
    }

    /// 草刈り見積
    pub fn estimate_grass(&self, input: &GrassInput) -> Result<GrassEstimate> {
        let height = parse_amount(&input.grass_height);
        let tier = GrassTier::for_height(height)
            .ok_or_else(|| Error::Estimate(format!("invalid grass height: {}", input.grass_height)))?;
        let rate = self.grass_rate(tier)?;
        let price = grass_price(rate, parse_amount(&input.maintainable_lot));

        let values = [
            ("grass_condition", Value::Text(grass_condition(height))),
            ("grass_height", Value::Text(input.grass_height.trim())),
            ("maintainable_lot", Value::Text(input.maintainable_lot.trim())),
            ("total_lot", Value::Text(input.total_lot.trim())),
            ("disclaimer", Value::Text(input.disclaimer.trim())),
            ("price", Value::Number(price)),
        ];
        let text = render(&rate.template, &values[..])?.trim().to_string();

        Ok(GrassEstimate { tier, price, text })
    }

    /// 屋根見積（葺き替え・養生の両方）
    pub fn estimate_roof(&self, input: &RoofInput) -> Result<RoofEstimate> {
        let tarp_price = round_cents(self.roof_rate(RoofService::Tarp, input.storey, input.client)? * input.roof_area);
        let replace_price =
            round_cents(self.roof_rate(RoofService::Replace, input.storey, input.client)? * input.roof_area);

        let two = |v: f64| format!("{:.2}", v);
        let roof_area = two(input.roof_area);
        let edge_metal = two(input.edge_metal);
        let ice_shield = two(0.2 * input.roof_area);
        let flashing = two(0.15 * input.roof_area);
        let ridge_cap = two(input.ridge_cap);
        let roof_jack = two(input.roof_jack);

        let replace_values = [
            ("roof_area", Value::Text(&roof_area)),
            ("edge_metal", Value::Text(&edge_metal)),
            ("ice_shield", Value::Text(&ice_shield)),
            ("flashing", Value::Text(&flashing)),
            ("ridge_cap", Value::Text(&ridge_cap)),
            ("roof_jack", Value::Text(&roof_jack)),
            ("price", Value::Number(replace_price)),
        ];
        let tarp_values = [
            ("roof_area", Value::Text(&roof_area)),
            ("price", Value::Number(tarp_price)),
        ];

        Ok(RoofEstimate {
            tarp_price,
            replace_price,
            replace_text: render(REPLACE_TEMPLATE, &replace_values[..])?,
            tarp_text: render(TARP_TEMPLATE, &tarp_values[..])?,
        })
    }
}

fn parse_price(cell: &str, line: usize) -> Result<f64> {
    NON_NUMERIC_RE
        .replace_all(cell, "")
        .parse::<f64>()
        .map_err(|_| Error::Estimate(format!("line {}: invalid price '{}'", line, cell)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass(height: &str, lot: &str) -> GrassInput {
        GrassInput {
            grass_height: height.to_string(),
            maintainable_lot: lot.to_string(),
            total_lot: "9000".to_string(),
            disclaimer: String::new(),
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(GrassTier::for_height(1.9), None);
        assert_eq!(GrassTier::for_height(2.0), Some(GrassTier::UpTo12));
        assert_eq!(GrassTier::for_height(12.0), Some(GrassTier::UpTo12));
        assert_eq!(GrassTier::for_height(12.5), Some(GrassTier::UpTo24));
        assert_eq!(GrassTier::for_height(48.0), Some(GrassTier::UpTo48));
        assert_eq!(GrassTier::for_height(60.0), Some(GrassTier::Above48));
        assert_eq!(GrassTier::for_height(f64::NAN), None);
    }

    #[test]
    fn test_tier_labels_roundtrip() {
        for tier in GrassTier::ALL {
            assert_eq!(GrassTier::from_label(tier.label()), Some(tier));
        }
        assert_eq!(GrassTier::from_label("Above 48\""), Some(GrassTier::Above48));
    }

    #[test]
    fn test_grass_condition() {
        assert_eq!(grass_condition(6.0), "allowable");
        assert_eq!(grass_condition(12.0), "allowable");
        assert_eq!(grass_condition(18.0), "over the allowable");
        assert_eq!(grass_condition(0.0), "[Invalid Height]");
    }

    #[test]
    fn test_grass_price_base_and_additional() {
        let tables = PricingTables::default_tables();
        let rate = tables.grass_rate(GrassTier::UpTo12).unwrap();
        assert_eq!(grass_price(rate, 5000.0), 79.68);
        // 2500 SF 超過 → 3単位
        assert_eq!(grass_price(rate, 7500.0), 105.9);
        // ちょうど1単位
        assert_eq!(grass_price(rate, 6000.0), 88.42);
    }

    #[test]
    fn test_estimate_grass_text() {
        let tables = PricingTables::default_tables();
        let estimate = tables.estimate_grass(&grass("18", "4000")).unwrap();
        assert_eq!(estimate.tier, GrassTier::UpTo24);
        assert_eq!(estimate.price, 111.55);
        assert!(estimate
            .text
            .starts_with("Perform initial grass cut of [over the allowable] grass measuring up to 18 inch on 4000 sq ft area."));
        assert!(estimate.text.ends_with("(Total lot size: 9000 SF, Maintainable area: 4000 SF)"));
    }

    #[test]
    fn test_estimate_grass_invalid_height() {
        let tables = PricingTables::default_tables();
        let err = tables.estimate_grass(&grass("1", "4000")).unwrap_err();
        assert!(matches!(err, Error::Estimate(_)));
        assert!(tables.estimate_grass(&grass("abc", "4000")).is_err());
    }

    #[test]
    fn test_estimate_roof() {
        let tables = PricingTables::default_tables();
        let estimate = tables
            .estimate_roof(&RoofInput {
                roof_area: 1000.0,
                edge_metal: 120.0,
                ridge_cap: 40.0,
                roof_jack: 2.0,
                storey: 2,
                client: Client::Slfs,
            })
            .unwrap();

        assert_eq!(estimate.tarp_price, 1680.0);
        assert_eq!(estimate.replace_price, 10000.0);
        assert!(estimate.replace_text.contains("200.00 SF of ice and water shield"));
        assert!(estimate.replace_text.contains("150.00 LF of flashing"));
        assert!(estimate.replace_text.ends_with("Price: $10000.00"));
        assert!(estimate.tarp_text.starts_with("Install heavy duty brown/black 1000.00 SF tarp"));
        assert!(estimate.text().contains("\n\nInstall heavy duty"));
    }

    #[test]
    fn test_estimate_roof_missing_rate() {
        let tables = PricingTables::default_tables();
        let err = tables
            .estimate_roof(&RoofInput {
                roof_area: 100.0,
                edge_metal: 0.0,
                ridge_cap: 0.0,
                roof_jack: 0.0,
                storey: 3,
                client: Client::FlatFee,
            })
            .unwrap_err();
        assert!(err.to_string().contains("3 storey"));
    }

    #[test]
    fn test_client_parse() {
        assert_eq!("Flat Fee".parse::<Client>().unwrap(), Client::FlatFee);
        assert_eq!("flat-fee".parse::<Client>().unwrap(), Client::FlatFee);
        assert_eq!("scfs".parse::<Client>().unwrap(), Client::Scfs);
        assert!("other".parse::<Client>().is_err());
    }

    #[test]
    fn test_tables_from_csv() {
        let csv = "\
Service Type,Grass Height,Base Price,Additional Price per 1000 SF,Template,Service,Storey,Client,Rate
Grass Cut,\"2\"\"-12\"\"\",$80.00,$9.00,Cut {grass_height} inch grass for ${price:.2f},,,,
Roofing,,,,,Tarp,1,SLFS,1.40
Notes,,,,,,,,
";
        let tables = PricingTables::from_csv_str(csv).unwrap();
        let rate = tables.grass_rate(GrassTier::UpTo12).unwrap();
        assert_eq!(rate.base, 80.0);
        assert_eq!(rate.additional, 9.0);
        assert_eq!(tables.roof_rate(RoofService::Tarp, 1, Client::Slfs).unwrap(), 1.4);
        assert!(tables.grass_rate(GrassTier::UpTo24).is_err());

        let estimate = tables.estimate_grass(&grass("6", "6500")).unwrap();
        assert_eq!(estimate.price, 98.0);
        assert_eq!(estimate.text, "Cut 6 inch grass for $98.00");
    }

    #[test]
    fn test_tables_from_csv_errors() {
        assert!(PricingTables::from_csv_str("Name,Price\n").is_err());
        assert!(PricingTables::from_csv_str("Service Type,Service\nOther,Tarp\n").is_err());

        let bad_rate = "Service Type,Service,Storey,Client,Rate\nRoofing,Tarp,1,SLFS,cheap\n";
        assert!(matches!(PricingTables::from_csv_str(bad_rate), Err(Error::Estimate(_))));
    }
}
