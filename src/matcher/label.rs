//! Label Normalization
//!
//! 行の先頭セルを連結した正規化ラベルの生成と、見出し行（バナー）の判定。

use crate::config::ITALIAN_MONTHS;
use crate::types::CellValue;

/// 行の先頭`width`セルから正規化ラベルを生成する
///
/// 各セルを小文字・前後空白除去したテキストに変換し、空でないものを
/// 半角スペース1つで連結します。ラベルが複数の列に分割・重複している
/// スプレッドシートにも対応できます。
pub(crate) fn normalized_label(row: &[CellValue], width: usize) -> String {
    row.iter()
        .take(width)
        .map(CellValue::normalized_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 月名で始まるセルを含むかどうか（列見出し行の判定）
///
/// 先頭の語（英字以外で区切る）が月名と一致するセルを見出しとみなします。
/// `Gennaio`、`Gennaio 2025`、`gennaio-25`はいずれも一致し、
/// `Ricavi di gennaio`は一致しません。
pub(crate) fn has_month_header(row: &[CellValue]) -> bool {
    row.iter().any(|cell| {
        let text = cell.normalized_text();
        text.split(|c: char| !c.is_alphabetic())
            .next()
            .is_some_and(|word| ITALIAN_MONTHS.contains(&word))
    })
}

/// 見出し・メタデータ行かどうか
///
/// * `label` - 正規化ラベル
/// * `exclusions` - 小文字化済みの除外語句
/// * `exclude_month_headers` - 月名セルを含む行を除外するか
pub(crate) fn is_banner_row(
    row: &[CellValue],
    label: &str,
    exclusions: &[String],
    exclude_month_headers: bool,
) -> bool {
    exclusions.iter().any(|phrase| label.contains(phrase.as_str()))
        || (exclude_month_headers && has_month_header(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn test_normalized_label_joins_leading_cells() {
        let grid = Grid::from_strings(&[&["  TOTALE ", "", "Ricavi", "", "", "", "ignored"]]);
        assert_eq!(normalized_label(grid.row(0), 6), "totale ricavi");
    }

    #[test]
    fn test_normalized_label_respects_width() {
        let grid = Grid::from_strings(&[&["a", "b", "c", "d"]]);
        assert_eq!(normalized_label(grid.row(0), 2), "a b");
        assert_eq!(normalized_label(&[], 6), "");
    }

    #[test]
    fn test_normalized_label_includes_numbers() {
        let row = vec![CellValue::from("Ricavi"), CellValue::Number(2025.0)];
        assert_eq!(normalized_label(&row, 6), "ricavi 2025");
    }

    #[test]
    fn test_month_header_detection() {
        let header = Grid::from_strings(&[&["", "Gennaio", "Febbraio"]]);
        let data = Grid::from_strings(&[&["Ricavi di gennaio", "100"]]);
        assert!(has_month_header(header.row(0)));
        assert!(!has_month_header(data.row(0)));
    }

    #[test]
    fn test_month_header_with_year_suffix() {
        let header = Grid::from_strings(&[&["Totale costi", "Gennaio 2025", "Febbraio 2025"]]);
        assert!(has_month_header(header.row(0)));
        assert!(has_month_header(Grid::from_strings(&[&["", "MARZO-25"]]).row(0)));
        // 月名を含むが先頭語ではない
        assert!(!has_month_header(Grid::from_strings(&[&["Gennaiolo", "Saldo aprile"]]).row(0)));
    }

    #[test]
    fn test_banner_row() {
        let exclusions = vec!["conto economico".to_string(), "progressivo".to_string()];
        let banner = Grid::from_strings(&[&["CONTO ECONOMICO 2025", "totale costi"]]);
        let label = normalized_label(banner.row(0), 6);
        assert!(is_banner_row(banner.row(0), &label, &exclusions, true));

        let months = Grid::from_strings(&[&["Totale costi", "GENNAIO"]]);
        let label = normalized_label(months.row(0), 6);
        assert!(is_banner_row(months.row(0), &label, &exclusions, true));
        assert!(!is_banner_row(months.row(0), &label, &exclusions, false));

        let data = Grid::from_strings(&[&["Totale costi", "", "", "", "", "100"]]);
        let label = normalized_label(data.row(0), 6);
        assert!(!is_banner_row(data.row(0), &label, &exclusions, true));
    }
}
