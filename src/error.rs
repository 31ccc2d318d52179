//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。
//!
//! 実行全体を中断する致命的なエラー（[`CeMatchError`]）と、シート・行・セル単位で
//! 報告してスキップする非致命的な問題（[`ExtractionIssue`]）を区別します。

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::api::Classification;

/// cematchクレート全体で使用するエラー型
///
/// 実行を継続できない失敗のみを表します。シートやヘッダーが見つからない場合は
/// エラーではなく[`ExtractionIssue`]としてレポートに記録されます。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー
/// - `Parse`: ワークブックの解析中に発生したエラー（calamine由来）
/// - `FileNotFound`: 入力ファイルが存在しない（実行中断）
/// - `Config`: 設定の検証に失敗したエラー
/// - `Template`: テンプレートファイル（TOML）の解析エラー
/// - `SecurityViolation`: 入力サイズ制限などの違反
/// - `Output`: レポートのシリアライズ（JSON / CSV）に失敗したエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use cematch::{CeMatchError, ExtractorBuilder};
///
/// # fn main() -> Result<(), CeMatchError> {
/// let extractor = ExtractorBuilder::new().build()?;
/// match extractor.extract_path("CE_2025.xlsx") {
///     Err(CeMatchError::FileNotFound { path }) => eprintln!("missing: {}", path.display()),
///     Err(e) => return Err(e),
///     Ok(report) => println!("{} facts", report.facts().len()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum CeMatchError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ワークブックの解析中に発生したエラー
    ///
    /// ファイル形式が不正、破損したファイル、サポートされていない形式などが
    /// 原因となります。
    #[error("Failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// 入力ファイルが存在しない
    ///
    /// トップレベルでのみ発生し、実行全体を中断します。
    #[error("Source file not found: {}", path.display())]
    FileNotFound {
        /// 指定されたパス
        path: PathBuf,
    },

    /// 設定の検証に失敗したエラー
    ///
    /// `ExtractorBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// テンプレートファイルの解析エラー
    #[error("Invalid template: {0}")]
    Template(#[from] toml::de::Error),

    /// セキュリティ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// 出力のシリアライズ中に発生したエラー
    #[error("Failed to write output: {0}")]
    Output(String),
}

impl From<serde_json::Error> for CeMatchError {
    fn from(err: serde_json::Error) -> Self {
        CeMatchError::Output(format!("JSON serialization error: {}", err))
    }
}

impl From<csv::Error> for CeMatchError {
    fn from(err: csv::Error) -> Self {
        CeMatchError::Output(format!("CSV serialization error: {}", err))
    }
}

/// 抽出処理中に検出された非致命的な問題
///
/// 各問題はシート名と、該当する場合は行インデックスまたはA1形式のセル座標を持ち、
/// 上流のスプレッドシートを人間が修正できるようにします。
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionIssue {
    /// 指定されたシートがワークブックに存在しない
    #[error("sheet '{sheet}' not found")]
    SheetNotFound { sheet: String },

    /// ヘッダー行の範囲内で期間トークンが見つからない
    #[error("sheet '{sheet}': header for period '{period}' not found in the first {window} rows")]
    HeaderNotFound {
        sheet: String,
        period: String,
        window: usize,
    },

    /// 分類に一致する行が見つからない
    #[error("sheet '{sheet}': no row classified as {label}")]
    RowNotFound { sheet: String, label: Classification },

    /// セルが空（0では置き換えない）
    #[error("sheet '{sheet}', cell {cell}: value for {label}/{period} is missing")]
    ValueMissing {
        sheet: String,
        cell: String,
        label: Classification,
        period: String,
    },

    /// セルの内容を数値として解釈できない
    #[error("sheet '{sheet}', cell {cell}: cannot parse '{raw}' as a number for {label}/{period}")]
    ValueUnparseable {
        sheet: String,
        cell: String,
        label: Classification,
        period: String,
        raw: String,
    },
}

impl ExtractionIssue {
    /// 問題が発生したシート名
    pub fn sheet(&self) -> &str {
        match self {
            ExtractionIssue::SheetNotFound { sheet }
            | ExtractionIssue::HeaderNotFound { sheet, .. }
            | ExtractionIssue::RowNotFound { sheet, .. }
            | ExtractionIssue::ValueMissing { sheet, .. }
            | ExtractionIssue::ValueUnparseable { sheet, .. } => sheet,
        }
    }

    /// A1形式のセル座標（セル単位の問題のみ）
    pub fn cell(&self) -> Option<&str> {
        match self {
            ExtractionIssue::ValueMissing { cell, .. }
            | ExtractionIssue::ValueUnparseable { cell, .. } => Some(cell),
            _ => None,
        }
    }
}
