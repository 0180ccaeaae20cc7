//! テキスト形式の見積書

use super::ProposalHeader;
use crate::compose::Proposal;
use crate::pricing::format_money;

const RULE_WIDTH: usize = 50;
const PHOTO_NOTE: &str = "[Photo attached - see Excel version for images]";

/// 見積書をテキストに整形
///
/// 本文にはテンプレート側の価格行が含まれるので、明細ごとの価格行は付けない。
pub fn render_text(proposal: &Proposal, header: &ProposalHeader) -> String {
    let mut out = String::new();

    let heading = match header.work_order.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
        Some(wo) => format!("{} BID PROPOSAL - WO# {}", header.company.to_uppercase(), wo),
        None => format!("{} BID PROPOSAL", header.company.to_uppercase()),
    };
    out.push_str(&heading);
    out.push('\n');
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str(&format!("Date: {}\n\n", header.date));

    for (i, bid) in proposal.bids.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", bid.number, bid.text));
        if bid.photo.is_some() {
            out.push_str(PHOTO_NOTE);
            out.push('\n');
        }
        out.push('\n');
        if i + 1 < proposal.bids.len() {
            out.push_str(&"─".repeat(RULE_WIDTH));
            out.push_str("\n\n");
        }
    }

    out.push_str(&format!("Total: ${}\n", format_money(proposal.grand_total)));
    out.push_str(&format!("\n{}\n", header.footer()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Bid;
    use crate::types::InstanceId;
    use std::path::PathBuf;

    fn header() -> ProposalHeader {
        ProposalHeader {
            company: "Techvengers".to_string(),
            work_order: Some("88".to_string()),
            date: "March 05, 2026".to_string(),
        }
    }

    fn bid(number: usize, text: &str, total: f64, photo: Option<&str>) -> Bid {
        Bid {
            number,
            id: InstanceId::new("Mold", "Kilz", number as u32),
            text: text.to_string(),
            total,
            photo: photo.map(PathBuf::from),
            conjunction: None,
        }
    }

    #[test]
    fn test_render_text_layout() {
        let proposal = Proposal {
            bids: vec![
                bid(1, "Paint walls.\nPrice: $20.00", 20.0, Some("wall.png")),
                bid(2, "Clean walls.\nPrice: $5.50", 5.5, None),
            ],
            grand_total: 25.5,
        };
        let text = render_text(&proposal, &header());
        let rule = "─".repeat(50);
        let expected = format!(
            "TECHVENGERS BID PROPOSAL - WO# 88\n{}\nDate: March 05, 2026\n\n\
1. Paint walls.\nPrice: $20.00\n{}\n\n{}\n\n\
2. Clean walls.\nPrice: $5.50\n\n\
Total: $25.50\n\nGenerated by Techvengers Bid Writer\n",
            "=".repeat(50),
            PHOTO_NOTE,
            rule
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_text_single_bid_has_no_separator() {
        let proposal = Proposal {
            bids: vec![bid(1, "Only bid", 1.0, None)],
            grand_total: 1.0,
        };
        let text = render_text(&proposal, &header());
        assert!(!text.contains('─'));
        assert!(text.contains("1. Only bid\n\nTotal: $1.00"));
    }
}
