//! Output Formatters Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。

use std::io::Write;

use serde_json::json;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::error::CeMatchError;
use crate::grid::Grid;
use crate::matcher::{normalized_label, RowMatcher};
use crate::report::ExtractionReport;

/// ダンプ出力でラベルを切り詰める表示幅
const DUMP_LABEL_WIDTH: usize = 60;

/// JSON形式のフォーマッター
///
/// `sheets`（シート → 期間 → ラベル → 値）、`facts`、`issues`の3キーを出力します。
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn render<W: Write>(
        &self,
        report: &ExtractionReport,
        writer: &mut W,
    ) -> Result<(), CeMatchError> {
        let json_output = json!({
            "sheets": report.by_sheet(),
            "facts": report.facts(),
            "issues": report.issues(),
        });

        serde_json::to_writer_pretty(&mut *writer, &json_output)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(())
    }
}

/// CSV形式のフォーマッター
///
/// 1ファクト1行で`sheet,label,period,value,cell`を出力します。問題は含みません。
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn render<W: Write>(
        &self,
        report: &ExtractionReport,
        writer: &mut W,
    ) -> Result<(), CeMatchError> {
        let mut csv_writer = csv::Writer::from_writer(&mut *writer);
        csv_writer.write_record(["sheet", "label", "period", "value", "cell"])?;

        for fact in report.facts() {
            let value = fact.value.to_string();
            let cell = fact.cell();
            csv_writer.write_record([
                fact.sheet.as_str(),
                fact.label.as_str(),
                fact.period.as_str(),
                value.as_str(),
                cell.as_str(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// テキスト表形式のフォーマッター
///
/// 端末での確認用に、表示幅を揃えた表と問題の一覧を出力します。
pub struct TextFormatter;

impl TextFormatter {
    pub fn render<W: Write>(
        &self,
        report: &ExtractionReport,
        writer: &mut W,
    ) -> Result<(), CeMatchError> {
        if report.facts().is_empty() {
            writeln!(writer, "No values extracted")?;
        } else {
            let header = ["Sheet", "Label", "Period", "Value", "Cell"];
            let rows: Vec<[String; 5]> = report
                .facts()
                .iter()
                .map(|fact| {
                    [
                        fact.sheet.clone(),
                        fact.label.to_string(),
                        fact.period.clone(),
                        format!("{:.2}", fact.value),
                        fact.cell(),
                    ]
                })
                .collect();

            let mut widths = header.map(|h| h.width());
            for row in &rows {
                for (width, cell) in widths.iter_mut().zip(row) {
                    *width = (*width).max(cell.width());
                }
            }

            write_table_row(writer, &header.map(|h| h.to_string()), &widths)?;
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            writeln!(writer, "{}", rule.join("  "))?;
            for row in &rows {
                write_table_row(writer, row, &widths)?;
            }
        }

        if !report.is_clean() {
            writeln!(writer)?;
            writeln!(writer, "Issues ({}):", report.issues().len())?;
            for issue in report.issues() {
                writeln!(writer, "  - {}", issue)?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

/// 表の1行を出力する（値の列のみ右寄せ）
fn write_table_row<W: Write>(
    writer: &mut W,
    cells: &[String; 5],
    widths: &[usize; 5],
) -> Result<(), CeMatchError> {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            let fill = " ".repeat(width.saturating_sub(cell.width()));
            if i == 3 {
                format!("{}{}", fill, cell)
            } else {
                format!("{}{}", cell, fill)
            }
        })
        .collect();
    writeln!(writer, "{}", padded.join("  ").trim_end())?;
    Ok(())
}

/// 表示幅が`max`を超える文字列を切り詰める
fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// シート先頭の行ごとに、正規化ラベルと分類結果、期間ヘッダーの検出結果を出力する
///
/// テンプレートを調整する際に、照合器がシートをどう見ているかを確認するための出力です。
///
/// # 引数
///
/// * `grid` - 対象シートのグリッド
/// * `matcher` - 行照合器
/// * `sheet` - シート名（見出しに使用）
/// * `limit` - 出力する最大行数
/// * `writer` - 出力先のライター
pub fn render_dump<W: Write>(
    grid: &Grid,
    matcher: &RowMatcher,
    sheet: &str,
    limit: usize,
    writer: &mut W,
) -> Result<(), CeMatchError> {
    let config = matcher.config();
    writeln!(writer, "== {} ({} rows) ==", sheet, grid.row_count())?;

    for period in &config.periods {
        match matcher.resolve_period(grid, period) {
            Some(header) => match header.row {
                Some(row) => writeln!(
                    writer,
                    "header {}: col {} (row {}, {:?})",
                    period.name, header.col, row, header.text
                )?,
                None => writeln!(
                    writer,
                    "header {}: col {} (fallback)",
                    period.name, header.col
                )?,
            },
            None => writeln!(
                writer,
                "header {}: not found in first {} rows",
                period.name, config.header_rows
            )?,
        }
    }

    for row in 0..grid.row_count().min(limit) {
        let label = normalized_label(grid.row(row), config.label_width);
        if label.is_empty() {
            continue;
        }
        let class = matcher
            .classify_row(grid, row)
            .map(|labeled| labeled.classification.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            writer,
            "{:>5}  {:<12}  {}",
            row,
            class,
            truncate_to_width(&label, DUMP_LABEL_WIDTH)
        )?;
    }

    writer.flush()?;
    Ok(())
}
