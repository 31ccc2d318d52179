//! Row Matcher Module
//!
//! 書式の揃っていないスプレッドシートから、意味のある行（「Totale Ricavi」
//! 「Totale Costi」「Differenza」など）を分類するヒューリスティック照合器。
//!
//! # 分類アルゴリズム
//!
//! 1. 先頭N列（既定6列）を小文字・空白除去して連結し、正規化ラベルを作る
//! 2. 候補列（既定: 列0と列3）のセルを既知トークンと完全一致で比較する
//! 3. 一致しなければ、正規化ラベルをフレーズと部分一致で比較する
//!    （長いフレーズから順に評価し、汎用的な語が具体的な語を隠さないようにする）
//! 4. 見出し・メタデータ行（「CONTO ECONOMICO」「PROGRESSIVO」、月名の列見出し）は除外する
//! 5. 分類ごとの走査方向に従い、最初に一致した行を採用する

mod header;
mod label;

use tracing::{debug, trace};

use crate::api::{Classification, ScanDirection};
use crate::config::{MatcherConfig, PhraseRule, TokenRule};
use crate::grid::Grid;
use crate::types::{LabeledRow, MatchRule};

pub(crate) use label::normalized_label;

/// 行分類・ヘッダー探索を行う照合器
///
/// 設定は構築時に小文字化・優先順位付けされ、以降は不変です。
///
/// # 使用例
///
/// ```rust
/// use cematch::{Classification, Grid, MatcherConfig, RowMatcher};
///
/// let matcher = RowMatcher::new(MatcherConfig::default());
/// let grid = Grid::from_strings(&[
///     &["", "", "2025 YTD"],
///     &["TOTALE RICAVI", "", "", "", "", "39215"],
/// ]);
///
/// let row = matcher.find_row(&grid, &Classification::Ricavi).unwrap();
/// assert_eq!(row.row, 1);
/// assert_eq!(matcher.locate_header_column(&grid, "ytd").unwrap().col, 2);
/// ```
#[derive(Debug, Clone)]
pub struct RowMatcher {
    /// 元の設定
    config: MatcherConfig,

    /// 小文字化済みのトークン
    tokens: Vec<TokenRule>,

    /// 小文字化済み、長い順に並べたフレーズ
    phrases: Vec<PhraseRule>,

    /// 小文字化済みの除外語句
    exclusions: Vec<String>,
}

impl RowMatcher {
    /// 設定から照合器を生成
    pub fn new(config: MatcherConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|t| TokenRule {
                text: t.text.trim().to_lowercase(),
                label: t.label.clone(),
            })
            .collect();

        let mut phrases: Vec<PhraseRule> = config
            .phrases
            .iter()
            .map(|p| PhraseRule {
                text: p.text.trim().to_lowercase(),
                label: p.label.clone(),
            })
            .collect();
        // 安定ソート: 同じ長さなら設定順を維持
        phrases.sort_by_key(|p| std::cmp::Reverse(p.text.chars().count()));

        let exclusions = config
            .exclusions
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            config,
            tokens,
            phrases,
            exclusions,
        }
    }

    /// 照合器の設定
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// 1行を分類する
    ///
    /// # 戻り値
    ///
    /// * `Some(LabeledRow)` - 分類できた場合
    /// * `None` - どのルールにも一致しない、または見出し行として除外された場合
    pub fn classify_row(&self, grid: &Grid, row: usize) -> Option<LabeledRow> {
        let cells = grid.row(row);
        let label = normalized_label(cells, self.config.label_width);
        if label.is_empty() {
            return None;
        }

        if label::is_banner_row(
            cells,
            &label,
            &self.exclusions,
            self.config.exclude_month_headers,
        ) {
            trace!(row, label = %label, "skipping banner row");
            return None;
        }

        let candidates: Vec<String> = self
            .config
            .candidate_columns
            .iter()
            .map(|&col| grid.cell(row, col).normalized_text())
            .collect();

        // 1. 候補列の完全一致（部分一致より優先）
        let exact = self
            .config
            .candidate_columns
            .iter()
            .zip(&candidates)
            .filter(|(_, text)| !text.is_empty())
            .find_map(|(&col, text)| {
                self.tokens
                    .iter()
                    .find(|t| t.text == *text)
                    .map(|token| (col, token))
            });

        if let Some((col, token)) = exact {
            return Some(LabeledRow {
                row,
                classification: token.label.clone(),
                label,
                candidates,
                rule: MatchRule::ExactCell {
                    col,
                    token: token.text.clone(),
                },
            });
        }

        // 2. 正規化ラベルの部分一致（具体的なフレーズから）
        let phrase = self
            .phrases
            .iter()
            .find(|p| label.contains(p.text.as_str()))?;

        Some(LabeledRow {
            row,
            classification: phrase.label.clone(),
            rule: MatchRule::Phrase {
                phrase: phrase.text.clone(),
            },
            label,
            candidates,
        })
    }

    /// すべての行を先頭から分類する
    ///
    /// 分類できなかった行は結果に含まれません。
    pub fn classify_rows(&self, grid: &Grid) -> Vec<LabeledRow> {
        (0..grid.row_count())
            .filter_map(|row| self.classify_row(grid, row))
            .collect()
    }

    /// 指定した分類に一致する行を、分類ごとの走査方向で探す
    ///
    /// `ScanDirection::Reverse`の分類（既定ではDIFFERENZA）は最終行から走査し、
    /// 最初の一致で停止します。シート下方の再計算済みの合計が、上方の古い値より
    /// 優先されます。
    pub fn find_row(&self, grid: &Grid, target: &Classification) -> Option<LabeledRow> {
        let direction = self.config.scan_direction(target);
        let matches_target = |row: usize| {
            self.classify_row(grid, row)
                .filter(|labeled| labeled.classification == *target)
        };

        let found = match direction {
            ScanDirection::Forward => (0..grid.row_count()).find_map(matches_target),
            ScanDirection::Reverse => (0..grid.row_count()).rev().find_map(matches_target),
        };

        if let Some(ref labeled) = found {
            debug!(
                label = %target,
                row = labeled.row,
                ?direction,
                matched = %labeled.label,
                "row matched"
            );
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhraseRule;

    fn matcher() -> RowMatcher {
        RowMatcher::new(MatcherConfig::default())
    }

    #[test]
    fn test_exact_token_in_column_zero() {
        let grid = Grid::from_strings(&[&["  RICAVI ", "vendite", "", "", "", "100"]]);
        let row = matcher().classify_row(&grid, 0).unwrap();
        assert_eq!(row.classification, Classification::Ricavi);
        assert_eq!(
            row.rule,
            MatchRule::ExactCell {
                col: 0,
                token: "ricavi".to_string()
            }
        );
    }

    #[test]
    fn test_exact_token_in_column_three() {
        let grid = Grid::from_strings(&[&["A.1", "Vendite Italia", "", "Costi", "", "100"]]);
        let row = matcher().classify_row(&grid, 0).unwrap();
        assert_eq!(row.classification, Classification::Costi);
        assert_eq!(row.candidates, vec!["a.1".to_string(), "costi".to_string()]);
        assert!(matches!(row.rule, MatchRule::ExactCell { col: 3, .. }));
    }

    #[test]
    fn test_exact_match_beats_phrase() {
        // 列0は「ricavi」と完全一致、ラベルは「totale costi」も含む
        let grid = Grid::from_strings(&[&["Ricavi", "al netto del totale costi"]]);
        let row = matcher().classify_row(&grid, 0).unwrap();
        assert_eq!(row.classification, Classification::Ricavi);
    }

    #[test]
    fn test_specific_phrase_wins_over_loose_token() {
        let grid = Grid::from_strings(&[&["Totale costi", "", "", "", "ricavi correlati", "500"]]);
        let row = matcher().classify_row(&grid, 0).unwrap();
        assert_eq!(row.classification, Classification::Costi);
        assert_eq!(
            row.rule,
            MatchRule::Phrase {
                phrase: "totale costi".to_string()
            }
        );
    }

    #[test]
    fn test_longer_phrase_is_evaluated_first() {
        let mut config = MatcherConfig::default();
        config.phrases = vec![
            PhraseRule {
                text: "costi".to_string(),
                label: Classification::Custom("GENERICO".to_string()),
            },
            PhraseRule {
                text: "totale costi".to_string(),
                label: Classification::Costi,
            },
        ];
        let matcher = RowMatcher::new(config);

        let grid = Grid::from_strings(&[&["Totale costi operativi"], &["Altri costi"]]);
        assert_eq!(
            matcher.classify_row(&grid, 0).unwrap().classification,
            Classification::Costi
        );
        assert_eq!(
            matcher.classify_row(&grid, 1).unwrap().classification,
            Classification::Custom("GENERICO".to_string())
        );
    }

    #[test]
    fn test_split_label_across_columns() {
        let grid = Grid::from_strings(&[&["Costi", "della", "produzione"]]);
        // 列0は「costi」と完全一致するため完全一致が優先される
        assert!(matches!(
            matcher().classify_row(&grid, 0).unwrap().rule,
            MatchRule::ExactCell { .. }
        ));

        let grid = Grid::from_strings(&[&["B)", "Costi della", "produzione"]]);
        let row = matcher().classify_row(&grid, 0).unwrap();
        assert_eq!(row.classification, Classification::Costi);
        assert_eq!(row.label, "b) costi della produzione");
    }

    #[test]
    fn test_banner_rows_are_excluded() {
        let grid = Grid::from_strings(&[
            &["CONTO ECONOMICO - totale ricavi"],
            &["Ricavi", "", "PROGRESSIVO"],
            &["Totale costi", "Gennaio", "Febbraio"],
        ]);
        let matcher = matcher();
        assert!(matcher.classify_row(&grid, 0).is_none());
        assert!(matcher.classify_row(&grid, 1).is_none());
        assert!(matcher.classify_row(&grid, 2).is_none());
        assert!(matcher.classify_rows(&grid).is_empty());
    }

    #[test]
    fn test_month_header_with_year_is_excluded() {
        let grid = Grid::from_strings(&[
            &["Totale costi", "Gennaio 2025", "Febbraio 2025"],
            &["Totale costi", "", "100"],
        ]);
        assert!(matcher().classify_row(&grid, 0).is_none());
        assert_eq!(
            matcher().find_row(&grid, &Classification::Costi).unwrap().row,
            1
        );
    }

    #[test]
    fn test_unmatched_and_empty_rows() {
        let grid = Grid::from_strings(&[&[], &["Ammortamenti", "", "", "", "", "12"]]);
        assert!(matcher().classify_row(&grid, 0).is_none());
        assert!(matcher().classify_row(&grid, 1).is_none());
        assert!(matcher().classify_row(&grid, 99).is_none());
    }

    #[test]
    fn test_classify_rows_in_order() {
        let grid = Grid::from_strings(&[
            &["Conto economico 2025"],
            &["Totale ricavi", "", "", "", "", "100"],
            &["Ammortamenti"],
            &["Totale costi", "", "", "", "", "80"],
            &["Differenza", "", "", "", "", "20"],
        ]);
        let rows = matcher().classify_rows(&grid);
        let summary: Vec<(usize, Classification)> =
            rows.into_iter().map(|r| (r.row, r.classification)).collect();
        assert_eq!(
            summary,
            vec![
                (1, Classification::Ricavi),
                (3, Classification::Costi),
                (4, Classification::Differenza),
            ]
        );
    }

    #[test]
    fn test_reverse_scan_prefers_last_differenza() {
        let grid = Grid::from_strings(&[
            &["Differenza", "", "", "", "", "10"],
            &["Totale ricavi", "", "", "", "", "100"],
            &["Differenza", "", "", "", "", "20"],
        ]);
        let row = matcher().find_row(&grid, &Classification::Differenza).unwrap();
        assert_eq!(row.row, 2);
    }

    #[test]
    fn test_forward_scan_prefers_first_occurrence() {
        let grid = Grid::from_strings(&[
            &["Totale ricavi", "", "", "", "", "100"],
            &["Totale ricavi", "", "", "", "", "999"],
        ]);
        let row = matcher().find_row(&grid, &Classification::Ricavi).unwrap();
        assert_eq!(row.row, 0);
    }

    #[test]
    fn test_find_row_missing() {
        let grid = Grid::from_strings(&[&["Totale ricavi", "", "", "", "", "100"]]);
        assert!(matcher().find_row(&grid, &Classification::Costi).is_none());
        assert!(matcher().find_row(&Grid::default(), &Classification::Ricavi).is_none());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn padding() -> impl Strategy<Value = String> {
            prop::sample::select(vec!["", " ", "  ", "\t"]).prop_map(str::to_string)
        }

        fn casing(word: &'static str) -> impl Strategy<Value = String> {
            prop::collection::vec(any::<bool>(), word.len()).prop_map(move |upper| {
                word.chars()
                    .zip(upper)
                    .map(|(c, u)| if u { c.to_ascii_uppercase() } else { c })
                    .collect()
            })
        }

        proptest! {
            // 列0または列3が「ricavi」と完全一致する行は常にRICAVI
            #[test]
            fn test_exact_ricavi_always_classifies(
                word in casing("ricavi"),
                left in padding(),
                right in padding(),
                in_col_three in any::<bool>(),
            ) {
                let cell = format!("{}{}{}", left, word, right);
                let row: Vec<&str> = if in_col_three {
                    vec!["", "voce", "", cell.as_str(), "", "123"]
                } else {
                    vec![cell.as_str(), "", "", "", "", "123"]
                };
                let grid = Grid::from_strings(&[row.as_slice()]);
                let labeled = matcher().classify_row(&grid, 0).unwrap();
                prop_assert_eq!(labeled.classification, Classification::Ricavi);
            }

            // 「totale costi」を含むラベルは、他の列に「ricavi」を含んでもCOSTI
            #[test]
            fn test_totale_costi_is_costi(
                word in casing("totale costi"),
                noise in "[b-z]{0,8}",
            ) {
                let label = format!("{} {}", word, noise);
                let tail = format!("{} ricavi", noise);
                let row = [label.as_str(), "", "", "", tail.as_str(), "1"];
                let grid = Grid::from_strings(&[&row[..]]);
                let labeled = matcher().classify_row(&grid, 0).unwrap();
                prop_assert_eq!(labeled.classification, Classification::Costi);
            }

            // 複数の「differenza」行では常に最後の行が選ばれる
            #[test]
            fn test_reverse_scan_picks_last(positions in prop::collection::btree_set(0usize..30, 1..5)) {
                let rows: Vec<Vec<&str>> = (0..30)
                    .map(|i| if positions.contains(&i) { vec!["Differenza", "1"] } else { vec!["voce"] })
                    .collect();
                let slices: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
                let grid = Grid::from_strings(&slices);
                let found = matcher().find_row(&grid, &Classification::Differenza).unwrap();
                prop_assert_eq!(Some(found.row), positions.iter().next_back().copied());
            }
        }
    }
}
