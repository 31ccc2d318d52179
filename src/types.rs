//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::api::Classification;
use crate::grid::Grid;

/// セルの値を表す列挙型
///
/// 照合処理が扱うのは空・文字列・数値の3種類のみです。
/// 論理値やエラー値はロード時に表示文字列へ変換されます。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 空セル
    #[default]
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    ///
    /// 空白のみの文字列も空として扱います。
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 値を前後の空白を除いた文字列として取得
    ///
    /// 整数値の数値は小数点なしで表現します（例: `2025.0` → `"2025"`）。
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::String(s) => s.trim().to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// 照合用に正規化したテキスト（小文字・前後空白除去）
    pub fn normalized_text(&self) -> String {
        self.as_text().to_lowercase()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(value)
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// `usize`のインデックスから座標を生成
    pub(crate) fn from_indices(row: usize, col: usize) -> Self {
        Self::new(row as u32, col as u32)
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        format!("{}{}", col_index_to_letter(self.col), self.row + 1)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_notation())
    }
}

/// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
pub(crate) fn col_index_to_letter(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        let remainder = col % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// 分類を決定したルール
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MatchRule {
    /// 候補列のセルがトークンと完全一致した
    ExactCell { col: usize, token: String },

    /// 正規化ラベルがフレーズを部分文字列として含んでいた
    Phrase { phrase: String },
}

/// 分類済みの行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledRow {
    /// 行インデックス（0始まり）
    pub row: usize,

    /// 付与された分類
    pub classification: Classification,

    /// 先頭セルを連結した正規化ラベル
    pub label: String,

    /// 完全一致判定で調べた候補列のテキスト（列順）
    pub candidates: Vec<String>,

    /// 分類を決定したルール
    pub rule: MatchRule,
}

/// 期間ラベル（月名・YTDなど）が見つかった位置
///
/// ヘッダーセルは自身の列から、同じヘッダー行で次に値のあるセルの
/// 直前の列までを受け持ちます。結合セルの見出しの下で値が右にずれて
/// 入力されているシートでも、この範囲内で値を探します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderLocation {
    /// ヘッダー行のインデックス（フォールバック列の場合は`None`）
    pub row: Option<usize>,

    /// 列インデックス
    pub col: usize,

    /// 受け持つ列範囲の終端（この列を含まない）。`None`は行末まで
    pub span_end: Option<usize>,

    /// 一致したセルのテキスト（フォールバック列の場合は空）
    pub text: String,
}

impl HeaderLocation {
    /// 固定列（フォールバック）の位置を生成
    ///
    /// 受け持つ範囲はその1列のみです。
    pub fn fallback(col: usize) -> Self {
        Self {
            row: None,
            col,
            span_end: Some(col + 1),
            text: String::new(),
        }
    }

    /// ヘッダー検出ではなく固定列から得た位置かどうか
    pub fn is_fallback(&self) -> bool {
        self.row.is_none()
    }

    /// 長さ`row_len`のデータ行で、このヘッダーが受け持つ列範囲
    ///
    /// 範囲は常にヘッダー自身の列を含みます。
    pub fn columns(&self, row_len: usize) -> Range<usize> {
        let end = self.span_end.unwrap_or(row_len).max(self.col + 1);
        self.col..end
    }
}

/// 抽出結果の1件
///
/// 必ず1つの分類済み行（`row`）と1つのヘッダー位置（`header`）に対応します。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedFact {
    /// シート名
    pub sheet: String,

    /// 行の分類
    pub label: Classification,

    /// 期間名（例: `ytd`, `gennaio`）
    pub period: String,

    /// 数値
    pub value: f64,

    /// 値を読んだ行
    pub row: usize,

    /// 値を読んだ列（ヘッダーの受け持ち範囲内）
    pub col: usize,

    /// 値を読んだ列の根拠
    pub header: HeaderLocation,
}

impl ExtractedFact {
    /// 値を読んだセルのA1座標
    pub fn cell(&self) -> String {
        CellCoord::from_indices(self.row, self.col).to_a1_notation()
    }
}

/// ワークブック内の1シート
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// シート名
    pub name: String,

    /// セルグリッド
    pub grid: Grid,
}

/// メモリ上に完全に読み込まれたワークブック
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// シートの一覧からワークブックを生成
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// シート名の一覧（ワークブック内の順序）
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// 名前でシートを取得
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// インデックスでシートを取得
    pub fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// すべてのシート
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }
}
