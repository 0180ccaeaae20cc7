//! 対話式の明細入力
//!
//! 明細ごとに 数量 → 場所 → 備考 → 同時承認キー → 選択 の順に尋ねる。
//! 空Enterで現在の値のまま、"-" で空にする、"q" で保存して終了。

use crate::error::{BidWriterError, Result};
use crate::session::Session;
use bid_writer_common::{compose::preview, format_money, InstanceId, InstanceUpdate, ItemInstance};
use dialoguer::Input;

/// 1項目への入力
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAction {
    /// 現在の値のまま
    Keep,
    Set(String),
    /// 空にする
    Clear,
    /// 残りを飛ばして保存
    Quit,
}

impl FieldAction {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "" => FieldAction::Keep,
            "-" => FieldAction::Clear,
            "q" | "Q" => FieldAction::Quit,
            other => FieldAction::Set(other.to_string()),
        }
    }
}

/// 選択の入力を解釈（y/n 以外は現在のまま）
pub fn parse_selected(input: &str, current: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(current),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        "q" => None,
        _ => Some(current),
    }
}

/// 対象の明細を列挙（カテゴリ指定なしなら全件）
pub fn targets(session: &Session, category: Option<&str>, selected_only: bool) -> Vec<InstanceId> {
    session
        .sheet
        .instances()
        .filter(|inst| category.map_or(true, |c| inst.id.category.eq_ignore_ascii_case(c)))
        .filter(|inst| !selected_only || inst.selected)
        .map(|inst| inst.id.clone())
        .collect()
}

fn prompt(label: &str, current: &str) -> Result<String> {
    let shown = if current.is_empty() { "-" } else { current };
    Input::new()
        .with_prompt(format!("  {} [{}]", label, shown))
        .allow_empty(true)
        .interact_text()
        .map_err(|e| BidWriterError::CliExecution(e.to_string()))
}

/// 1項目を尋ねて更新値を決める（Quit なら None）
fn ask_field(label: &str, current: &str) -> Result<Option<Option<String>>> {
    Ok(match FieldAction::parse(&prompt(label, current)?) {
        FieldAction::Keep => Some(None),
        FieldAction::Set(value) => Some(Some(value)),
        FieldAction::Clear => Some(Some(String::new())),
        FieldAction::Quit => None,
    })
}

fn print_instance(index: usize, total: usize, inst: &ItemInstance) {
    println!(
        "[{}/{}] {} ({})  単価 ${}  合計 ${}",
        index + 1,
        total,
        inst.id.display_name(),
        inst.id.category,
        inst.unit_price,
        format_money(inst.total())
    );
}

/// 対話式で明細を入力し、更新した件数を返す
pub fn run_interactive_fill(session: &mut Session, category: Option<&str>, selected_only: bool) -> Result<usize> {
    let ids = targets(session, category, selected_only);
    if ids.is_empty() {
        println!("✓ 対象の明細がありません");
        return Ok(0);
    }

    println!("📝 入力対象: {}件", ids.len());
    println!("---");
    println!("操作: [Enter]そのまま [-]空にする [q]保存して終了");
    println!("---\n");

    let mut updated = 0;
    'items: for (index, id) in ids.iter().enumerate() {
        let Some(inst) = session.sheet.get(id).cloned() else {
            continue;
        };
        print_instance(index, ids.len(), &inst);

        let mut update = InstanceUpdate::default();
        let fields: [(&str, &str, &mut Option<String>); 4] = [
            ("数量", inst.quantity.as_str(), &mut update.quantity),
            ("場所", inst.location.as_str(), &mut update.location),
            ("備考", inst.info.as_str(), &mut update.info),
            ("同時承認キー", inst.conjunction_key.as_str(), &mut update.conjunction_key),
        ];
        for (label, current, slot) in fields {
            match ask_field(label, current)? {
                Some(value) => *slot = value,
                None => {
                    println!("保存して終了します...");
                    break 'items;
                }
            }
        }

        let answer = prompt("選択 (y/n)", if inst.selected { "y" } else { "n" })?;
        match parse_selected(&answer, inst.selected) {
            Some(selected) => update.selected = Some(selected),
            None => {
                println!("保存して終了します...");
                break 'items;
            }
        }

        if !update.is_empty() {
            session.sheet.update(id, update)?;
            updated += 1;
        }

        let text = preview(&session.sheet, id)?;
        println!("  → {}\n", text.replace('\n', "\n    "));
    }

    Ok(updated)
}
