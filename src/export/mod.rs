pub mod excel;
pub mod text;

use crate::error::Result;
use bid_writer_common::{Proposal, ProposalHeader};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// 出力形式
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ExportFormat {
    Text,
    Excel,
    #[default]
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use text, excel, or both", s)),
        }
    }
}

/// 既定のファイル名の元（"Techvengers_Bids_20260102_030405"）
pub fn default_file_stem(company: &str, now: &DateTime<Local>) -> String {
    let company: String = company
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_Bids_{}", company, now.format("%Y%m%d_%H%M%S"))
}

/// 見出しに載せる日付（"January 02, 2026"）
pub fn display_date(now: &DateTime<Local>) -> String {
    now.format("%B %d, %Y").to_string()
}

fn output_path_for_format(output: &Path, stem: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", stem, extension))
    } else {
        output.to_path_buf()
    }
}

fn output_paths_for_both(output: &Path, stem: &str) -> (PathBuf, PathBuf) {
    if output.is_dir() || output.extension().is_none() {
        let text_path = output.join(format!("{}.txt", stem));
        let excel_path = output.join(format!("{}.xlsx", stem));
        (text_path, excel_path)
    } else {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(stem);
        let text_path = parent.join(format!("{}.txt", stem));
        let excel_path = parent.join(format!("{}.xlsx", stem));
        (text_path, excel_path)
    }
}

/// 見積書を出力し、書き出したファイルのパスを返す
///
/// `output` がディレクトリ（または拡張子なし）なら `stem` からファイル名を作る。
pub fn export_proposal(
    proposal: &Proposal,
    header: &ProposalHeader,
    format: ExportFormat,
    output: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    match format {
        ExportFormat::Text => {
            let output_path = output_path_for_format(output, stem, "txt");
            println!("- テキストを生成中...");
            text::write_text(proposal, header, &output_path)?;
            println!("✔ テキスト出力: {}", output_path.display());
            written.push(output_path);
        }
        ExportFormat::Excel => {
            let output_path = output_path_for_format(output, stem, "xlsx");
            println!("- Excelを生成中...");
            excel::generate_excel(proposal, header, &output_path)?;
            println!("✔ Excel出力: {}", output_path.display());
            written.push(output_path);
        }
        ExportFormat::Both => {
            let (text_path, excel_path) = output_paths_for_both(output, stem);

            println!("- テキストを生成中...");
            text::write_text(proposal, header, &text_path)?;
            println!("✔ テキスト出力: {}", text_path.display());

            println!("- Excelを生成中...");
            excel::generate_excel(proposal, header, &excel_path)?;
            println!("✔ Excel出力: {}", excel_path.display());

            written.push(text_path);
            written.push(excel_path);
        }
    }

    Ok(written)
}
