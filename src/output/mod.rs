//! Output Format Module
//!
//! Strategy Patternによる出力フォーマットの抽象化を提供するモジュール。

mod formatters;

use std::io::Write;

use crate::api::OutputFormat;
use crate::error::CeMatchError;
use crate::report::ExtractionReport;

pub use formatters::*;

/// 出力フォーマッター（Strategy Pattern）
///
/// 各出力フォーマット（JSON, CSV, テキスト表）をenumとして表現します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatter {
    Json,
    Csv,
    Text,
}

impl OutputFormatter {
    /// 出力フォーマットからフォーマッターを生成
    pub fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => OutputFormatter::Json,
            OutputFormat::Csv => OutputFormatter::Csv,
            OutputFormat::Text => OutputFormatter::Text,
        }
    }

    /// レポートを指定されたフォーマットで出力する
    ///
    /// # 引数
    ///
    /// * `report` - 出力する抽出レポート
    /// * `writer` - 出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(CeMatchError)` - 書き込みまたはシリアライズに失敗した場合
    pub fn render<W: Write>(
        &self,
        report: &ExtractionReport,
        writer: &mut W,
    ) -> Result<(), CeMatchError> {
        match self {
            OutputFormatter::Json => JsonFormatter.render(report, writer),
            OutputFormatter::Csv => CsvFormatter.render(report, writer),
            OutputFormatter::Text => TextFormatter.render(report, writer),
        }
    }

    /// レポートを文字列として出力する
    pub fn render_to_string(&self, report: &ExtractionReport) -> Result<String, CeMatchError> {
        let mut buffer = Vec::new();
        self.render(report, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| CeMatchError::Output(format!("UTF-8 conversion error: {}", e)))
    }
}
