//! テキスト形式の見積書出力

use crate::error::Result;
use bid_writer_common::export::text_core::render_text;
use bid_writer_common::{Proposal, ProposalHeader};
use std::path::Path;

pub fn write_text(proposal: &Proposal, header: &ProposalHeader, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, render_text(proposal, header))?;
    Ok(())
}
