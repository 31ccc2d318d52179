//! Value Extraction Module
//!
//! 解決済みの行・列からセル値を読み取り、数値に変換するモジュール。
//! ロケール書式の文字列（`1.234,56`、`1,234.56`など）も正規化してから解析します。
//!
//! 空セルや解析できない値は決して0に置き換えません。0は有効な財務値であり、
//! 「値がない」ことと区別する必要があるためです。

use crate::grid::Grid;
use crate::types::{CellValue, HeaderLocation};

/// セル読み取りの結果
#[derive(Debug, Clone, PartialEq)]
pub enum CellReading {
    /// 数値
    Value(f64),

    /// 空セル
    Missing,

    /// 数値として解釈できない内容（元のテキスト）
    Unparseable(String),
}

impl CellReading {
    /// 数値（存在する場合）
    pub fn value(&self) -> Option<f64> {
        match self {
            CellReading::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// 数値が得られなかったかどうか
    pub fn is_missing(&self) -> bool {
        !matches!(self, CellReading::Value(_))
    }
}

/// 指定座標のセルを数値として読み取る
///
/// # 引数
///
/// * `grid` - シートのグリッド
/// * `row` - 行インデックス（0始まり）
/// * `col` - 列インデックス（0始まり）
///
/// # 戻り値
///
/// * `CellReading::Value` - 数値セル、または数値を表す文字列
/// * `CellReading::Missing` - 空セル（範囲外を含む）
/// * `CellReading::Unparseable` - 数値として解釈できない文字列
///
/// # 使用例
///
/// ```rust
/// use cematch::{extract_value, CellReading, Grid};
///
/// let grid = Grid::from_strings(&[&["Totale ricavi", "1.234,56", ""]]);
/// assert_eq!(extract_value(&grid, 0, 1), CellReading::Value(1234.56));
/// assert_eq!(extract_value(&grid, 0, 2), CellReading::Missing);
/// ```
pub fn extract_value(grid: &Grid, row: usize, col: usize) -> CellReading {
    match grid.cell(row, col) {
        CellValue::Number(n) if n.is_finite() => CellReading::Value(*n),
        CellValue::Number(n) => CellReading::Unparseable(n.to_string()),
        CellValue::Empty => CellReading::Missing,
        CellValue::String(s) if s.trim().is_empty() => CellReading::Missing,
        CellValue::String(s) => match parse_locale_number(s) {
            Some(v) => CellReading::Value(v),
            None => CellReading::Unparseable(s.trim().to_string()),
        },
    }
}

/// ヘッダーが受け持つ列範囲から値を読み取る
///
/// 範囲内を左から走査し、最初に値のあるセルを`extract_value`で読みます。
/// 範囲内がすべて空の場合はヘッダー列の`Missing`を返します。
///
/// # 戻り値
///
/// 読み取った列と結果の組
///
/// # 使用例
///
/// ```rust
/// use cematch::{extract_under_header, CellReading, Grid, RowMatcher, MatcherConfig};
///
/// let grid = Grid::from_strings(&[
///     &["", "", "2025 YTD"],
///     &["TOTALE RICAVI", "", "", "", "", "39215"],
/// ]);
/// let matcher = RowMatcher::new(MatcherConfig::default());
/// let header = matcher.locate_header_column(&grid, "ytd").unwrap();
/// assert_eq!(extract_under_header(&grid, 1, &header), (5, CellReading::Value(39215.0)));
/// ```
pub fn extract_under_header(
    grid: &Grid,
    row: usize,
    header: &HeaderLocation,
) -> (usize, CellReading) {
    header
        .columns(grid.row(row).len())
        .find(|&col| !grid.cell(row, col).is_empty())
        .map(|col| (col, extract_value(grid, row, col)))
        .unwrap_or((header.col, CellReading::Missing))
}

/// ロケール書式の数値文字列を解析する
///
/// # 規則
///
/// - 空白（NBSPを含む）と`€`記号は無視
/// - 先頭の`-`/`+`、会計表記の括弧`(1.234)`（負数）を受け付ける
/// - `.`と`,`の両方がある場合、右側にある方が小数点、もう一方が桁区切り
/// - 片方のみが複数回現れる場合は桁区切り
/// - 片方のみが1回現れ、直後がちょうど3桁、整数部が1〜3桁かつ0でない場合は
///   桁区切り、それ以外は小数点（`1.234` → 1234、`1234.567` → 1234.567）
/// - 桁区切りのグループは「先頭1〜3桁、以降はちょうど3桁」でなければならない
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€')
        .collect();

    let (negative_paren, body) = match compact
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, compact.as_str()),
    };

    let (negative_sign, body) = if let Some(rest) = body.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = body.strip_prefix('+') {
        (false, rest)
    } else {
        (false, body)
    };

    if body.is_empty()
        || !body.chars().any(|c| c.is_ascii_digit())
        || !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return None;
    }

    let normalized = match (body.rfind('.'), body.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (decimal, thousands) = if dot > comma { ('.', ',') } else { (',', '.') };
            let (int_part, frac_part) = body.rsplit_once(decimal)?;
            if frac_part.contains(thousands) {
                return None;
            }
            format!("{}.{}", strip_thousands(int_part, thousands)?, frac_part)
        }
        (Some(_), None) => normalize_single_separator(body, '.')?,
        (None, Some(_)) => normalize_single_separator(body, ',')?,
        (None, None) => body.to_string(),
    };

    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    if negative_paren != negative_sign {
        Some(-value)
    } else {
        Some(value)
    }
}

/// 区切り文字が1種類だけの場合の正規化
fn normalize_single_separator(body: &str, sep: char) -> Option<String> {
    if body.matches(sep).count() > 1 {
        return strip_thousands(body, sep);
    }

    let (int_part, frac_part) = body.split_once(sep)?;
    let is_thousands = frac_part.len() == 3
        && !int_part.is_empty()
        && int_part.len() <= 3
        && int_part.chars().any(|c| c != '0');

    if is_thousands {
        strip_thousands(body, sep)
    } else if frac_part.is_empty() {
        // "12." のような末尾の区切りは整数として扱う
        Some(int_part.to_string())
    } else {
        Some(format!("{}.{}", if int_part.is_empty() { "0" } else { int_part }, frac_part))
    }
}

/// 桁区切りを取り除く（グループの形式を検証）
fn strip_thousands(int_part: &str, sep: char) -> Option<String> {
    let mut groups = int_part.split(sep);
    let first = groups.next()?;
    if first.is_empty() || (first.len() > 3 && int_part.contains(sep)) {
        return None;
    }

    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}
