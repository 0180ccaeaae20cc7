//! 金額計算
//!
//! 入力欄の文字列（"1,200" や "$15.00"）を数値化し、
//! 数量 × 単価をセント単位で丸める。

/// 入力文字列を金額/数量として解釈する
///
/// 空文字・解釈不能な値は 0.0 として扱う。
pub fn parse_amount(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return 0.0;
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// セント単位で丸める
///
/// f64 が表す値そのものを基準に、ちょうど半セントなら偶数側へ丸める
/// （Python の `round(x, 2)` と同じ結果）。
pub fn round_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scaled = value * 100.0;
    // 積の丸め誤差（value * 100 - scaled を正確に求める）
    let error = value.mul_add(100.0, -scaled);
    let floor = scaled.floor();
    let fraction = scaled - floor;

    let cents = if fraction > 0.5 || (fraction == 0.5 && error > 0.0) {
        floor + 1.0
    } else if fraction < 0.5 || error < 0.0 {
        floor
    } else if floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    };
    cents / 100.0
}

/// 行合計 = round(数量 × 単価, 2)
pub fn line_total(quantity: f64, unit_price: f64) -> f64 {
    round_cents(quantity * unit_price)
}

/// 小数2桁の金額表記
pub fn format_money(value: f64) -> String {
    format!("{:.2}", round_cents(value))
}
