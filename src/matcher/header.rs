//! Header Location
//!
//! 先頭のヘッダー行から期間ラベル（月名、YTDなど）の列を探す。

use tracing::{debug, warn};

use super::RowMatcher;
use crate::config::PeriodSpec;
use crate::grid::Grid;
use crate::types::HeaderLocation;

impl RowMatcher {
    /// ヘッダートークンを含む列を探す
    ///
    /// 先頭`header_rows`行（既定5行）を上から、各行を左から走査し、
    /// トークンまたはその別名（誤記を含む）を大文字小文字を区別せずに
    /// 含む最初のセルの位置を返します。受け持つ列範囲は、同じ行で次に
    /// 値のあるセルの直前までです。
    ///
    /// # 戻り値
    ///
    /// * `Some(HeaderLocation)` - 見つかった場合
    /// * `None` - ヘッダー範囲内に一致がない場合（エラーではない）
    pub fn locate_header_column(&self, grid: &Grid, token: &str) -> Option<HeaderLocation> {
        let family = self.config().header_family(token);
        if family.iter().all(String::is_empty) {
            return None;
        }

        let window = self.config().header_rows.min(grid.row_count());
        for row in 0..window {
            for (col, cell) in grid.row(row).iter().enumerate() {
                let text = cell.normalized_text();
                if text.is_empty() {
                    continue;
                }
                if family
                    .iter()
                    .any(|alias| !alias.is_empty() && text.contains(alias.as_str()))
                {
                    let span_end = next_non_empty(grid, row, col);
                    debug!(token, row, col, ?span_end, header = %text, "header located");
                    return Some(HeaderLocation {
                        row: Some(row),
                        col,
                        span_end,
                        text: cell.as_text(),
                    });
                }
            }
        }

        None
    }

    /// 期間の列を解決する
    ///
    /// ヘッダー検出を優先し、失敗した場合のみ期間のフォールバック列を使います。
    pub fn resolve_period(&self, grid: &Grid, period: &PeriodSpec) -> Option<HeaderLocation> {
        if let Some(location) = self.locate_header_column(grid, &period.name) {
            return Some(location);
        }

        let col = period.fallback_column?;
        warn!(
            period = %period.name,
            col,
            "header not detected; using fallback column"
        );
        Some(HeaderLocation::fallback(col))
    }
}

/// `col`より右で最初に値のあるセルの列
fn next_non_empty(grid: &Grid, row: usize, col: usize) -> Option<usize> {
    grid.row(row)
        .iter()
        .enumerate()
        .skip(col + 1)
        .find(|(_, cell)| !cell.is_empty())
        .map(|(c, _)| c)
}
