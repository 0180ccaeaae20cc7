//! 見積テンプレートの差し込み
//!
//! カタログのテンプレート文字列に含まれる `{quantity}` `{location}` `{info}`
//! `{total:.2f}` などのプレースホルダを入力値で置換する。
//!
//! 書式:
//! - `{name}`      値をそのまま出力
//! - `{name:.Nf}`  数値を小数N桁で出力（文字列値に指定するとエラー）
//! - `{{` / `}}`   波括弧そのもの

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?::\.(\d+)f)?$").unwrap();
}

/// テンプレートエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("invalid placeholder {{{0}}}")]
    InvalidPlaceholder(String),

    #[error("numeric format applied to text placeholder {{{0}}}")]
    FormatOnText(String),

    #[error("unclosed '{{' at byte {0}")]
    UnclosedBrace(usize),

    #[error("single '}}' at byte {0}")]
    StrayClosingBrace(usize),
}

/// 差し込む値
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Text(&'a str),
    Number(f64),
}

/// 名前から値を引く
pub trait Lookup {
    fn lookup(&self, name: &str) -> Option<Value<'_>>;
}

impl<'a> Lookup for [(&'a str, Value<'a>)] {
    fn lookup(&self, name: &str) -> Option<Value<'_>> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

/// 見積明細の差し込み値
#[derive(Debug, Clone, Copy)]
pub struct BidVars<'a> {
    pub quantity: &'a str,
    pub location: &'a str,
    pub info: &'a str,
    pub total: f64,
}

impl Lookup for BidVars<'_> {
    fn lookup(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "quantity" => Some(Value::Text(self.quantity)),
            "location" => Some(Value::Text(self.location)),
            // cause は info の別名
            "info" | "cause" => Some(Value::Text(self.info)),
            "total" => Some(Value::Number(self.total)),
            _ => None,
        }
    }
}

enum Token<'t> {
    Literal(&'t str),
    Brace(char),
    Placeholder { name: &'t str, precision: Option<usize>, raw: &'t str },
}

fn tokenize(template: &str) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut tokens = Vec::new();
    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                tokens.push(Token::Literal(&template[literal_start..i]));
                tokens.push(Token::Brace('{'));
                i += 2;
                literal_start = i;
            }
            b'{' => {
                tokens.push(Token::Literal(&template[literal_start..i]));
                let close = template[i + 1..]
                    .find('}')
                    .map(|offset| i + 1 + offset)
                    .ok_or(TemplateError::UnclosedBrace(i))?;
                let raw = &template[i + 1..close];
                let caps = PLACEHOLDER_RE
                    .captures(raw)
                    .ok_or_else(|| TemplateError::InvalidPlaceholder(raw.to_string()))?;
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let precision = caps
                    .get(2)
                    .map(|m| m.as_str().parse::<usize>())
                    .transpose()
                    .map_err(|_| TemplateError::InvalidPlaceholder(raw.to_string()))?;
                tokens.push(Token::Placeholder { name, precision, raw });
                i = close + 1;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                tokens.push(Token::Literal(&template[literal_start..i]));
                tokens.push(Token::Brace('}'));
                i += 2;
                literal_start = i;
            }
            b'}' => return Err(TemplateError::StrayClosingBrace(i)),
            _ => i += 1,
        }
    }
    tokens.push(Token::Literal(&template[literal_start..]));

    Ok(tokens)
}

/// 書式指定なしの数値表記（15.0 → "15.0", 12.5 → "12.5"）
fn format_plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// テンプレートに値を差し込む
pub fn render<L: Lookup + ?Sized>(template: &str, vars: &L) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 32);

    for token in tokenize(template)? {
        match token {
            Token::Literal(s) => out.push_str(s),
            Token::Brace(c) => out.push(c),
            Token::Placeholder { name, precision, raw } => {
                let value = vars
                    .lookup(name)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
                match (value, precision) {
                    (Value::Text(s), None) => out.push_str(s),
                    (Value::Text(_), Some(_)) => {
                        return Err(TemplateError::FormatOnText(raw.to_string()))
                    }
                    (Value::Number(n), None) => out.push_str(&format_plain_number(n)),
                    (Value::Number(n), Some(p)) => out.push_str(&format!("{:.*}", p, n)),
                }
            }
        }
    }

    Ok(out)
}

/// 差し込みに失敗したら元のテンプレートをそのまま返す
pub fn render_or_raw<L: Lookup + ?Sized>(template: &str, vars: &L) -> String {
    render(template, vars).unwrap_or_else(|_| template.to_string())
}

/// テンプレートで使われているプレースホルダ名（出現順、重複なし）
pub fn placeholders(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names: Vec<String> = Vec::new();
    for token in tokenize(template)? {
        if let Token::Placeholder { name, .. } = token {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
