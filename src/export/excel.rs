//! Excel生成（CLI版）
//!
//! 写真はサムネイル化してから埋め込む。

use crate::error::{BidWriterError, Result};
use bid_writer_common::export::excel_core::{generate_excel_buffer, ImageData};
use bid_writer_common::{Proposal, ProposalHeader};
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;

/// サムネイルの最大サイズ (px)
pub const THUMBNAIL_MAX_WIDTH: u32 = 400;
pub const THUMBNAIL_MAX_HEIGHT: u32 = 300;

/// 写真を読み込んでPNGのサムネイルにする
pub fn load_thumbnail(path: &Path) -> Result<ImageData> {
    let image = image::open(path)
        .map_err(|e| BidWriterError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    let thumb = image.thumbnail(THUMBNAIL_MAX_WIDTH, THUMBNAIL_MAX_HEIGHT);

    let mut buffer = Cursor::new(Vec::new());
    thumb
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| BidWriterError::ImageLoad(format!("{}: {}", path.display(), e)))?;

    Ok(ImageData {
        data: buffer.into_inner(),
        extension: "png".to_string(),
    })
}

pub fn generate_excel(proposal: &Proposal, header: &ProposalHeader, output_path: &Path) -> Result<()> {
    let buffer = generate_excel_buffer(proposal, header, |path| match load_thumbnail(path) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!("写真を埋め込めません: {}", e);
            None
        }
    })
    .map_err(BidWriterError::ExcelGeneration)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, buffer)?;
    Ok(())
}
