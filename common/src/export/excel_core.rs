//! Excel生成（共通ライブラリ）
//!
//! 見積書を1シートの表（SL No. / Bids / Price / Photos）として生成する。

use super::ProposalHeader;
use crate::compose::Proposal;
use rust_xlsxwriter::*;
use std::path::Path;

/// 見出しの背景色
pub const BRAND_COLOR: u32 = 0x1E3A5F;

const COL_NUMBER: u16 = 0;
const COL_BID: u16 = 1;
const COL_PRICE: u16 = 2;
const COL_PHOTO: u16 = 3;

const NUMBER_COL_WIDTH: f64 = 8.0;
const BID_COL_WIDTH: f64 = 70.0;
const PRICE_COL_WIDTH: f64 = 14.0;
const PHOTO_COL_WIDTH: f64 = 30.0;

/// Bids列の1行あたりの目安文字数
const CHARS_PER_LINE: usize = 80;
const LINE_HEIGHT_PT: f64 = 15.0;
const MIN_ROW_HEIGHT_PT: f64 = 30.0;
const PHOTO_ROW_HEIGHT_PT: f64 = 120.0;
/// サムネイル（最大400×300px）を写真列に収める倍率
const PHOTO_SCALE: f64 = 0.5;

const MONEY_FORMAT: &str = "$#,##0.00";

/// 画像データ（バイト配列）
pub struct ImageData {
    pub data: Vec<u8>,
    pub extension: String, // "png", "jpeg", "gif"
}

/// 本文の行数から行の高さを見積もる
fn row_height_for(text: &str, has_photo: bool) -> f64 {
    let lines: usize = text
        .lines()
        .map(|line| line.chars().count().div_ceil(CHARS_PER_LINE).max(1))
        .sum();
    let text_height = (lines as f64 * LINE_HEIGHT_PT).max(MIN_ROW_HEIGHT_PT);
    if has_photo {
        text_height.max(PHOTO_ROW_HEIGHT_PT)
    } else {
        text_height
    }
}

/// Excelをバッファに生成
///
/// # Arguments
/// * `proposal` - 組み立て済みの見積書
/// * `header` - 見出し（会社名・作業指示番号・日付）
/// * `image_loader` - 画像データを取得するクロージャ (photo path -> Option<ImageData>)
pub fn generate_excel_buffer<F>(
    proposal: &Proposal,
    header: &ProposalHeader,
    image_loader: F,
) -> Result<Vec<u8>, String>
where
    F: Fn(&Path) -> Option<ImageData>,
{
    let mut workbook = Workbook::new();

    // フォーマット定義
    let title_format = Format::new()
        .set_bold()
        .set_font_size(16.0)
        .set_font_color(Color::RGB(BRAND_COLOR))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    let date_format = Format::new()
        .set_font_size(10.0)
        .set_align(FormatAlign::Center);

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(BRAND_COLOR))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);

    let number_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::Top)
        .set_border(FormatBorder::Thin);

    let bid_format = Format::new()
        .set_font_size(10.0)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::Top)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);

    let price_format = Format::new()
        .set_num_format(MONEY_FORMAT)
        .set_align(FormatAlign::Top)
        .set_border(FormatBorder::Thin);

    let photo_cell_format = Format::new().set_border(FormatBorder::Thin);

    let total_label_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Right)
        .set_border(FormatBorder::Thin);

    let total_format = Format::new()
        .set_bold()
        .set_num_format(MONEY_FORMAT)
        .set_border(FormatBorder::Thin);

    let footer_format = Format::new()
        .set_italic()
        .set_font_color(Color::RGB(0x6C757D))
        .set_align(FormatAlign::Center);

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Bids")
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    // 列幅設定
    for (col, width) in [
        (COL_NUMBER, NUMBER_COL_WIDTH),
        (COL_BID, BID_COL_WIDTH),
        (COL_PRICE, PRICE_COL_WIDTH),
        (COL_PHOTO, PHOTO_COL_WIDTH),
    ] {
        worksheet
            .set_column_width(col, width)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
    }

    // タイトル・日付
    worksheet
        .merge_range(0, COL_NUMBER, 0, COL_PHOTO, &header.title(), &title_format)
        .map_err(|e| format!("タイトル書き込みエラー: {}", e))?;
    worksheet
        .set_row_height(0, 28.0)
        .map_err(|e| format!("行高さ設定エラー: {}", e))?;
    worksheet
        .merge_range(1, COL_NUMBER, 1, COL_PHOTO, &format!("Date: {}", header.date), &date_format)
        .map_err(|e| format!("日付書き込みエラー: {}", e))?;

    // 表ヘッダー
    let header_row: u32 = 3;
    for (col, label) in [
        (COL_NUMBER, "SL No."),
        (COL_BID, "Bids"),
        (COL_PRICE, "Price"),
        (COL_PHOTO, "Photos"),
    ] {
        worksheet
            .write_string_with_format(header_row, col, label, &header_format)
            .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
    }

    let mut row = header_row + 1;
    for bid in &proposal.bids {
        let image = bid.photo.as_deref().and_then(|path| image_loader(path));

        worksheet
            .set_row_height(row, row_height_for(&bid.text, image.is_some()))
            .map_err(|e| format!("行高さ設定エラー: {}", e))?;
        worksheet
            .write_number_with_format(row, COL_NUMBER, bid.number as f64, &number_format)
            .map_err(|e| format!("番号書き込みエラー: {}", e))?;
        worksheet
            .write_string_with_format(row, COL_BID, &bid.text, &bid_format)
            .map_err(|e| format!("本文書き込みエラー: {}", e))?;
        worksheet
            .write_number_with_format(row, COL_PRICE, bid.total, &price_format)
            .map_err(|e| format!("価格書き込みエラー: {}", e))?;
        worksheet
            .write_blank(row, COL_PHOTO, &photo_cell_format)
            .map_err(|e| format!("写真セル書き込みエラー: {}", e))?;

        // 画像埋め込み
        if let Some(image_data) = image {
            let image = Image::new_from_buffer(&image_data.data)
                .map_err(|e| format!("画像読み込みエラー: {}", e))?
                .set_scale_width(PHOTO_SCALE)
                .set_scale_height(PHOTO_SCALE)
                .set_object_movement(ObjectMovement::MoveAndSizeWithCells);

            worksheet
                .insert_image_with_offset(row, COL_PHOTO, &image, 4, 4)
                .map_err(|e| format!("画像埋め込みエラー: {}", e))?;
        }

        row += 1;
    }

    // 合計行
    worksheet
        .merge_range(row, COL_NUMBER, row, COL_BID, "Total", &total_label_format)
        .map_err(|e| format!("合計書き込みエラー: {}", e))?;
    worksheet
        .write_number_with_format(row, COL_PRICE, proposal.grand_total, &total_format)
        .map_err(|e| format!("合計書き込みエラー: {}", e))?;

    worksheet
        .merge_range(row + 2, COL_NUMBER, row + 2, COL_PHOTO, &header.footer(), &footer_format)
        .map_err(|e| format!("フッター書き込みエラー: {}", e))?;

    // バッファに書き出し
    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}
