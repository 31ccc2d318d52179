//! Configuration Module
//!
//! 照合処理のパラメータ（候補列、既知トークン、フレーズ、除外語、走査方向、
//! ヘッダー探索範囲、期間）と、ワークブックテンプレート（TOML）の読み込みを提供する。
//!
//! テンプレートの例:
//!
//! ```toml
//! sheets = ["CE dettaglio", "CE sintetico"]
//! candidate_columns = [0, 3]
//! header_rows = 5
//!
//! [[periods]]
//! name = "ytd"
//! fallback_column = 17
//!
//! # 既定のフレーズに追加される
//! [[phrases]]
//! text = "utile netto"
//! label = "UTILE"
//!
//! [scan]
//! differenza = "reverse"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Month;
use serde::{Deserialize, Serialize};

use crate::api::{Classification, ScanDirection};
use crate::error::CeMatchError;

/// イタリア語の月名（1月 → 12月）
pub(crate) const ITALIAN_MONTHS: [&str; 12] = [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre",
];

/// `chrono::Month`のイタリア語名
pub fn italian_month_name(month: Month) -> &'static str {
    ITALIAN_MONTHS[month.number_from_month() as usize - 1]
}

/// 候補列のセルと完全一致させるトークン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRule {
    /// トークン（大文字小文字は区別しない）
    pub text: String,

    /// 一致した場合の分類
    pub label: Classification,
}

/// 正規化ラベルに部分一致させるフレーズ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseRule {
    /// フレーズ（大文字小文字は区別しない）
    pub text: String,

    /// 一致した場合の分類
    pub label: Classification,
}

/// 抽出対象の期間
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSpec {
    /// 期間名（ヘッダートークンとしても使用）
    pub name: String,

    /// ヘッダー検出に失敗した場合に使う固定列
    #[serde(default)]
    pub fallback_column: Option<usize>,
}

impl PeriodSpec {
    /// 期間を生成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fallback_column: None,
        }
    }

    /// 年初来累計（YTD）の期間
    pub fn ytd() -> Self {
        Self::new("ytd")
    }

    /// 月の期間（イタリア語の月名）
    pub fn month(month: Month) -> Self {
        Self::new(italian_month_name(month))
    }

    /// フォールバック列を設定
    pub fn with_fallback_column(mut self, col: usize) -> Self {
        self.fallback_column = Some(col);
        self
    }
}

/// 行照合・ヘッダー探索の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// 正規化ラベルに連結する先頭セル数
    pub label_width: usize,

    /// 完全一致を調べる列（調べる順）
    pub candidate_columns: Vec<usize>,

    /// 候補列の完全一致トークン
    pub tokens: Vec<TokenRule>,

    /// 正規化ラベルの部分一致フレーズ
    ///
    /// 評価時には長い（より具体的な）フレーズから順に調べます。
    pub phrases: Vec<PhraseRule>,

    /// 見出し・メタデータ行とみなす語句（正規化ラベルへの部分一致）
    pub exclusions: Vec<String>,

    /// 月名で始まるセルを含む行を見出し行として除外するか
    pub exclude_month_headers: bool,

    /// 分類ごとの走査方向（未指定は`Forward`）
    pub scan: BTreeMap<Classification, ScanDirection>,

    /// ヘッダーを探索する先頭行数
    pub header_rows: usize,

    /// ヘッダートークンの別名（誤記を含む）
    pub header_aliases: BTreeMap<String, Vec<String>>,

    /// 抽出する分類
    pub targets: Vec<Classification>,

    /// 抽出する期間
    pub periods: Vec<PeriodSpec>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        let phrase = |text: &str, label: Classification| PhraseRule {
            text: text.to_string(),
            label,
        };
        let token = |text: &str, label: Classification| TokenRule {
            text: text.to_string(),
            label,
        };

        Self {
            label_width: 6,
            candidate_columns: vec![0, 3],
            tokens: vec![
                token("costi", Classification::Costi),
                token("ricavi", Classification::Ricavi),
            ],
            phrases: vec![
                phrase("totale costi", Classification::Costi),
                phrase("costi della produzione", Classification::Costi),
                phrase("totale ricavi", Classification::Ricavi),
                phrase("differenza", Classification::Differenza),
            ],
            exclusions: vec!["conto economico".to_string(), "progressivo".to_string()],
            exclude_month_headers: true,
            scan: BTreeMap::from([(Classification::Differenza, ScanDirection::Reverse)]),
            header_rows: 5,
            header_aliases: BTreeMap::from([
                (
                    "ytd".to_string(),
                    vec!["ytd".to_string(), "progressivo".to_string()],
                ),
                (
                    "sintetico".to_string(),
                    vec!["sintetico".to_string(), "sintentico".to_string()],
                ),
            ]),
            targets: vec![
                Classification::Ricavi,
                Classification::Costi,
                Classification::Differenza,
            ],
            periods: vec![PeriodSpec::ytd()],
        }
    }
}

impl MatcherConfig {
    /// 分類の走査方向
    pub fn scan_direction(&self, label: &Classification) -> ScanDirection {
        self.scan.get(label).copied().unwrap_or(ScanDirection::Forward)
    }

    /// ヘッダートークンと、その別名をすべて小文字で返す
    ///
    /// トークン自身は常に先頭に含まれます。
    pub fn header_family(&self, token: &str) -> Vec<String> {
        let token = token.trim().to_lowercase();
        let mut family = vec![token.clone()];
        if let Some(aliases) = self.header_aliases.get(&token) {
            for alias in aliases {
                let alias = alias.trim().to_lowercase();
                if !alias.is_empty() && !family.contains(&alias) {
                    family.push(alias);
                }
            }
        }
        family
    }

    /// 設定を検証する
    pub(crate) fn validate(&self) -> Result<(), CeMatchError> {
        if self.label_width == 0 || self.label_width > 64 {
            return Err(CeMatchError::Config(format!(
                "Invalid label width: {} (expected 1..=64)",
                self.label_width
            )));
        }

        if self.candidate_columns.is_empty() {
            return Err(CeMatchError::Config(
                "At least one candidate column is required".to_string(),
            ));
        }

        if self.header_rows == 0 {
            return Err(CeMatchError::Config(
                "Header window must cover at least one row".to_string(),
            ));
        }

        if let Some(rule) = self.tokens.iter().find(|t| t.text.trim().is_empty()) {
            return Err(CeMatchError::Config(format!(
                "Empty token for label {}",
                rule.label
            )));
        }

        if let Some(rule) = self.phrases.iter().find(|p| p.text.trim().is_empty()) {
            return Err(CeMatchError::Config(format!(
                "Empty phrase for label {}",
                rule.label
            )));
        }

        if self.targets.is_empty() {
            return Err(CeMatchError::Config(
                "At least one target classification is required".to_string(),
            ));
        }

        if self.periods.is_empty() {
            return Err(CeMatchError::Config(
                "At least one period is required".to_string(),
            ));
        }

        for (i, period) in self.periods.iter().enumerate() {
            if period.name.trim().is_empty() {
                return Err(CeMatchError::Config("Empty period name".to_string()));
            }
            let duplicate = self.periods[..i]
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&period.name));
            if duplicate {
                return Err(CeMatchError::Config(format!(
                    "Duplicate period: '{}'",
                    period.name
                )));
            }
        }

        Ok(())
    }
}

/// ワークブックテンプレート
///
/// 1種類のワークブック（社内フォーマットの版）をどう読むかを記述します。
/// 未指定の項目は`MatcherConfig::default()`の値になります。
///
/// 照合ルール（`tokens`、`phrases`、`exclusions`、`scan`、`header_aliases`）は
/// `ExtractorBuilder::with_phrase`などと同じく既定値に追加されます。
/// 既定のルールを捨てて置き換えるには`replace_defaults = true`を指定します。
/// `targets`と`periods`は選択であり、指定すると常に置き換えます。
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "TemplateFile")]
pub struct Template {
    /// 抽出対象のシート名（空の場合はすべてのシート）
    pub sheets: Vec<String>,

    /// 照合設定（既定値とマージ済み）
    pub matcher: MatcherConfig,
}

/// TOML上のテンプレート表現
///
/// 照合ルールは指定の有無を区別するため`Option`で受け取ります。
#[derive(Deserialize)]
struct TemplateFile {
    #[serde(default)]
    sheets: Vec<String>,

    #[serde(default)]
    replace_defaults: bool,

    tokens: Option<Vec<TokenRule>>,
    phrases: Option<Vec<PhraseRule>>,
    exclusions: Option<Vec<String>>,
    scan: Option<BTreeMap<Classification, ScanDirection>>,
    header_aliases: Option<BTreeMap<String, Vec<String>>>,

    #[serde(flatten)]
    matcher: MatcherConfig,
}

impl From<TemplateFile> for Template {
    fn from(file: TemplateFile) -> Self {
        let mut matcher = file.matcher;

        if file.replace_defaults {
            if let Some(tokens) = file.tokens {
                matcher.tokens = tokens;
            }
            if let Some(phrases) = file.phrases {
                matcher.phrases = phrases;
            }
            if let Some(exclusions) = file.exclusions {
                matcher.exclusions = exclusions;
            }
            if let Some(scan) = file.scan {
                matcher.scan = scan;
            }
            if let Some(aliases) = file.header_aliases {
                matcher.header_aliases = aliases;
            }
        } else {
            extend_unique(&mut matcher.tokens, file.tokens);
            extend_unique(&mut matcher.phrases, file.phrases);
            extend_unique(&mut matcher.exclusions, file.exclusions);
            matcher.scan.extend(file.scan.unwrap_or_default());
            for (token, aliases) in file.header_aliases.unwrap_or_default() {
                let entry = matcher
                    .header_aliases
                    .entry(token.trim().to_lowercase())
                    .or_default();
                extend_unique(entry, Some(aliases));
            }
        }

        Self {
            sheets: file.sheets,
            matcher,
        }
    }
}

/// 重複を除いて末尾に追加する
fn extend_unique<T: PartialEq>(base: &mut Vec<T>, extra: Option<Vec<T>>) {
    for item in extra.unwrap_or_default() {
        if !base.contains(&item) {
            base.push(item);
        }
    }
}

impl Template {
    /// TOML文字列からテンプレートを読み込む
    pub fn from_toml_str(source: &str) -> Result<Self, CeMatchError> {
        Ok(toml::from_str(source)?)
    }

    /// TOMLファイルからテンプレートを読み込む
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CeMatchError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CeMatchError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_italian_month_names() {
        assert_eq!(italian_month_name(Month::January), "gennaio");
        assert_eq!(italian_month_name(Month::June), "giugno");
        assert_eq!(italian_month_name(Month::December), "dicembre");
        assert_eq!(PeriodSpec::month(Month::March).name, "marzo");
    }

    #[test]
    fn test_default_scan_directions() {
        let config = MatcherConfig::default();
        assert_eq!(
            config.scan_direction(&Classification::Differenza),
            ScanDirection::Reverse
        );
        assert_eq!(
            config.scan_direction(&Classification::Ricavi),
            ScanDirection::Forward
        );
        assert_eq!(
            config.scan_direction(&Classification::Custom("EBITDA".to_string())),
            ScanDirection::Forward
        );
    }

    #[test]
    fn test_header_family_includes_typo_variant() {
        let config = MatcherConfig::default();
        assert_eq!(
            config.header_family("Sintetico"),
            vec!["sintetico".to_string(), "sintentico".to_string()]
        );
        assert_eq!(config.header_family("gennaio"), vec!["gennaio".to_string()]);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(MatcherConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = MatcherConfig {
            label_width: 0,
            ..MatcherConfig::default()
        };
        assert!(matches!(config.validate(), Err(CeMatchError::Config(msg)) if msg.contains("label width")));

        let config = MatcherConfig {
            candidate_columns: vec![],
            ..MatcherConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MatcherConfig {
            header_rows: 0,
            ..MatcherConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MatcherConfig {
            periods: vec![PeriodSpec::ytd(), PeriodSpec::new("YTD")],
            ..MatcherConfig::default()
        };
        assert!(matches!(config.validate(), Err(CeMatchError::Config(msg)) if msg.contains("Duplicate period")));

        let mut config = MatcherConfig::default();
        config.phrases.push(PhraseRule {
            text: "  ".to_string(),
            label: Classification::Costi,
        });
        assert!(matches!(config.validate(), Err(CeMatchError::Config(msg)) if msg.contains("Empty phrase")));
    }

    #[test]
    fn test_template_from_toml_keeps_defaults() {
        let template = Template::from_toml_str(
            r#"
            sheets = ["CE dettaglio"]

            [[periods]]
            name = "ytd"
            fallback_column = 17

            [[periods]]
            name = "gennaio"
            "#,
        )
        .unwrap();

        assert_eq!(template.sheets, vec!["CE dettaglio".to_string()]);
        assert_eq!(template.matcher.periods.len(), 2);
        assert_eq!(template.matcher.periods[0].fallback_column, Some(17));
        assert_eq!(template.matcher.periods[1].fallback_column, None);
        // 未指定の項目はデフォルト値
        assert_eq!(template.matcher.candidate_columns, vec![0, 3]);
        assert_eq!(template.matcher.label_width, 6);
        assert_eq!(template.matcher.phrases.len(), 4);
    }

    #[test]
    fn test_template_custom_rules_and_scan() {
        let template = Template::from_toml_str(
            r#"
            targets = ["ricavi", "UTILE"]

            [[phrases]]
            text = "utile netto"
            label = "UTILE"

            [scan]
            UTILE = "reverse"
            differenza = "forward"
            "#,
        )
        .unwrap();

        let utile = Classification::Custom("UTILE".to_string());
        assert_eq!(template.matcher.targets, vec![Classification::Ricavi, utile.clone()]);
        // 既定の4フレーズに追加される
        assert_eq!(template.matcher.phrases.len(), 5);
        assert_eq!(template.matcher.phrases[4].label, utile);
        assert_eq!(template.matcher.scan_direction(&utile), ScanDirection::Reverse);
        assert_eq!(
            template.matcher.scan_direction(&Classification::Differenza),
            ScanDirection::Forward
        );
    }

    #[test]
    fn test_template_rules_extend_defaults() {
        let template = Template::from_toml_str(
            r#"
            exclusions = ["bilancio", "conto economico"]

            [[tokens]]
            text = "ricavi"
            label = "RICAVI"

            [header_aliases]
            YTD = ["cumulato"]
            "#,
        )
        .unwrap();

        let defaults = MatcherConfig::default();
        // 既定と同じトークンは重複させない
        assert_eq!(template.matcher.tokens, defaults.tokens);
        assert_eq!(
            template.matcher.exclusions,
            vec![
                "conto economico".to_string(),
                "progressivo".to_string(),
                "bilancio".to_string()
            ]
        );
        assert_eq!(
            template.matcher.header_family("ytd"),
            vec!["ytd".to_string(), "progressivo".to_string(), "cumulato".to_string()]
        );
        assert_eq!(
            template.matcher.scan_direction(&Classification::Differenza),
            ScanDirection::Reverse
        );
    }

    #[test]
    fn test_template_replace_defaults() {
        let template = Template::from_toml_str(
            r#"
            replace_defaults = true

            [[phrases]]
            text = "valore della produzione"
            label = "RICAVI"
            "#,
        )
        .unwrap();

        assert_eq!(
            template.matcher.phrases,
            vec![PhraseRule {
                text: "valore della produzione".to_string(),
                label: Classification::Ricavi,
            }]
        );
        // 指定していないルールは既定値のまま
        assert_eq!(template.matcher.tokens, MatcherConfig::default().tokens);
    }

    #[test]
    fn test_template_invalid_toml() {
        let result = Template::from_toml_str("header_rows = \"five\"");
        assert!(matches!(result, Err(CeMatchError::Template(_))));
    }

    #[test]
    fn test_template_missing_file() {
        let result = Template::from_path("/nonexistent/ce_template.toml");
        assert!(matches!(result, Err(CeMatchError::FileNotFound { .. })));
    }
}
