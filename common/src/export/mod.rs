//! 見積書出力のコア（CLI側はファイル保存と画像読み込みだけを担当）

pub mod text_core;

#[cfg(feature = "excel")]
pub mod excel_core;

/// 見積書の見出し情報
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalHeader {
    /// 会社名（見出し・フッターに使う）
    pub company: String,
    pub work_order: Option<String>,
    /// 表示用の日付（例: "October 16, 2026"）
    pub date: String,
}

impl ProposalHeader {
    /// "{会社名} Bid Proposal - WO# 1234"
    pub fn title(&self) -> String {
        match self.work_order.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
            Some(wo) => format!("{} Bid Proposal - WO# {}", self.company, wo),
            None => format!("{} Bid Proposal", self.company),
        }
    }

    pub fn footer(&self) -> String {
        format!("Generated by {} Bid Writer", self.company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_with_and_without_work_order() {
        let mut header = ProposalHeader {
            company: "Techvengers".to_string(),
            work_order: Some("1234".to_string()),
            date: "January 02, 2026".to_string(),
        };
        assert_eq!(header.title(), "Techvengers Bid Proposal - WO# 1234");

        header.work_order = Some("  ".to_string());
        assert_eq!(header.title(), "Techvengers Bid Proposal");
        assert_eq!(header.footer(), "Generated by Techvengers Bid Writer");
    }
}
