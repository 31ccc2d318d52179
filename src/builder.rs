//! Builder Module
//!
//! Fluent Builder APIを提供し、`Extractor`インスタンスを段階的に構築する。

use std::io::{Read, Seek, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::api::{Classification, OutputFormat, ScanDirection, SheetSelector};
use crate::config::{MatcherConfig, PeriodSpec, PhraseRule, Template, TokenRule};
use crate::error::{CeMatchError, ExtractionIssue};
use crate::matcher::RowMatcher;
use crate::output::{render_dump, OutputFormatter};
use crate::parser::{load_workbook, load_workbook_path};
use crate::report::{ExtractionReport, SheetClassification};
use crate::types::{CellCoord, ExtractedFact, LabeledRow, Sheet, Workbook};
use crate::value::{extract_under_header, CellReading};

/// 抽出処理の設定を保持する内部構造体
#[derive(Debug, Clone, Default)]
pub(crate) struct ExtractionConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// 照合設定
    pub matcher: MatcherConfig,
}

/// Fluent Builder APIを提供する構造体
///
/// `Extractor`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use cematch::{ExtractorBuilder, PeriodSpec, SheetSelector};
///
/// # fn main() -> Result<(), cematch::CeMatchError> {
/// let extractor = ExtractorBuilder::new()
///     .with_sheet_selector(SheetSelector::Name("CE dettaglio".to_string()))
///     .with_period(PeriodSpec::ytd().with_fallback_column(17))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExtractorBuilder {
    /// 内部設定（構築中）
    config: ExtractionConfig,

    /// 期間が明示的に追加されたか（最初の追加で既定の期間を置き換える）
    periods_overridden: bool,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: すべてのシート
    /// - 候補列: 列0と列3
    /// - 正規化ラベル: 先頭6列
    /// - ヘッダー探索: 先頭5行
    /// - 抽出対象: RICAVI、COSTI、DIFFERENZA
    /// - 期間: YTD
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
            periods_overridden: false,
        }
    }

    /// 照合設定をまとめて置き換える
    pub fn with_matcher_config(mut self, matcher: MatcherConfig) -> Self {
        self.config.matcher = matcher;
        self.periods_overridden = true;
        self
    }

    /// テンプレートを適用する
    ///
    /// テンプレートにシート名が列挙されている場合は`SheetSelector::Names`になります。
    pub fn with_template(mut self, template: Template) -> Self {
        if !template.sheets.is_empty() {
            self.config.sheet_selector = SheetSelector::Names(template.sheets);
        }
        self.with_matcher_config(template.matcher)
    }

    /// TOMLテンプレートファイルを読み込んで適用する
    ///
    /// # 発生し得るエラー
    ///
    /// * `CeMatchError::FileNotFound` - ファイルが存在しない
    /// * `CeMatchError::Template` - TOMLとして不正
    pub fn with_template_file<P: AsRef<Path>>(self, path: P) -> Result<Self, CeMatchError> {
        let template = Template::from_path(path)?;
        Ok(self.with_template(template))
    }

    /// 抽出対象のシートを選択する
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// 正規化ラベルに連結する先頭セル数を指定する
    pub fn with_label_width(mut self, width: usize) -> Self {
        self.config.matcher.label_width = width;
        self
    }

    /// 完全一致を調べる候補列を指定する
    pub fn with_candidate_columns(mut self, columns: Vec<usize>) -> Self {
        self.config.matcher.candidate_columns = columns;
        self
    }

    /// ヘッダーを探索する先頭行数を指定する
    pub fn with_header_rows(mut self, rows: usize) -> Self {
        self.config.matcher.header_rows = rows;
        self
    }

    /// 候補列の完全一致トークンを追加する
    ///
    /// 既定のトークンは残ります（テンプレートの`[[tokens]]`と同じ扱い）。
    pub fn with_token(mut self, text: impl Into<String>, label: Classification) -> Self {
        self.config.matcher.tokens.push(TokenRule {
            text: text.into(),
            label,
        });
        self
    }

    /// 正規化ラベルの部分一致フレーズを追加する
    ///
    /// 既定のフレーズは残ります（テンプレートの`[[phrases]]`と同じ扱い）。
    pub fn with_phrase(mut self, text: impl Into<String>, label: Classification) -> Self {
        self.config.matcher.phrases.push(PhraseRule {
            text: text.into(),
            label,
        });
        self
    }

    /// 見出し行として除外する語句を追加する
    pub fn with_exclusion(mut self, phrase: impl Into<String>) -> Self {
        self.config.matcher.exclusions.push(phrase.into());
        self
    }

    /// ヘッダートークンの別名を追加する
    pub fn with_header_alias(mut self, token: &str, alias: impl Into<String>) -> Self {
        self.config
            .matcher
            .header_aliases
            .entry(token.trim().to_lowercase())
            .or_default()
            .push(alias.into());
        self
    }

    /// 分類の走査方向を指定する
    pub fn with_scan_direction(
        mut self,
        label: Classification,
        direction: ScanDirection,
    ) -> Self {
        self.config.matcher.scan.insert(label, direction);
        self
    }

    /// 抽出する分類を指定する
    pub fn with_targets(mut self, targets: Vec<Classification>) -> Self {
        self.config.matcher.targets = targets;
        self
    }

    /// 抽出する期間を追加する
    ///
    /// 最初の呼び出しで既定の期間（YTD）を置き換えます。
    pub fn with_period(mut self, period: PeriodSpec) -> Self {
        if !self.periods_overridden {
            self.config.matcher.periods.clear();
            self.periods_overridden = true;
        }
        self.config.matcher.periods.push(period);
        self
    }

    /// 既存の期間にフォールバック列を設定する（なければ追加する）
    pub fn with_fallback_column(mut self, period: &str, col: usize) -> Self {
        match self
            .config
            .matcher
            .periods
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(period))
        {
            Some(spec) => spec.fallback_column = Some(col),
            None => self
                .config
                .matcher
                .periods
                .push(PeriodSpec::new(period).with_fallback_column(col)),
        }
        self
    }

    /// 設定を検証し、`Extractor`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `CeMatchError::Config(String)` - 設定の検証に失敗した場合
    ///   * 候補列が空、ラベル幅・ヘッダー行数が不正
    ///   * 空のトークン・フレーズ、抽出対象・期間が空、期間名の重複
    pub fn build(self) -> Result<Extractor, CeMatchError> {
        self.config.matcher.validate()?;
        Ok(Extractor::new(self.config))
    }
}

/// 抽出処理のファサード
///
/// ワークブックの読み込み、シート選択、行分類、ヘッダー探索、値の読み取りを
/// まとめて実行します。処理は同期的・単一スレッドで、状態を持ちません。
///
/// # 使用例
///
/// ```rust,no_run
/// use cematch::{Classification, ExtractorBuilder};
///
/// # fn main() -> Result<(), cematch::CeMatchError> {
/// let extractor = ExtractorBuilder::new().build()?;
/// let report = extractor.extract_path("CE_2025.xlsx")?;
/// for fact in report.facts() {
///     println!("{} {} {} = {}", fact.sheet, fact.label, fact.period, fact.value);
/// }
/// for issue in report.issues() {
///     eprintln!("{}", issue);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Extractor {
    /// 抽出設定
    config: ExtractionConfig,

    /// 行照合器
    matcher: RowMatcher,
}

impl Extractor {
    pub(crate) fn new(config: ExtractionConfig) -> Self {
        Self {
            matcher: RowMatcher::new(config.matcher.clone()),
            config,
        }
    }

    /// 行照合器
    pub fn matcher(&self) -> &RowMatcher {
        &self.matcher
    }

    /// ファイルパスから抽出する
    ///
    /// # 戻り値
    ///
    /// * `Ok(ExtractionReport)` - シート・行・セル単位の問題はレポート内に記録
    /// * `Err(CeMatchError::FileNotFound)` - ファイルが存在しない（実行中断）
    /// * `Err(CeMatchError)` - ワークブックを読み込めない場合
    pub fn extract_path<P: AsRef<Path>>(&self, path: P) -> Result<ExtractionReport, CeMatchError> {
        let workbook = load_workbook_path(path)?;
        Ok(self.extract_workbook(&workbook))
    }

    /// リーダーから抽出する
    pub fn extract<R: Read + Seek>(&self, input: R) -> Result<ExtractionReport, CeMatchError> {
        let workbook = load_workbook(input)?;
        Ok(self.extract_workbook(&workbook))
    }

    /// 抽出して指定形式で書き出す
    pub fn extract_to_writer<R: Read + Seek, W: Write>(
        &self,
        input: R,
        mut output: W,
        format: OutputFormat,
    ) -> Result<ExtractionReport, CeMatchError> {
        let report = self.extract(input)?;
        OutputFormatter::from_format(format).render(&report, &mut output)?;
        Ok(report)
    }

    /// 読み込み済みのワークブックから抽出する
    ///
    /// この処理は失敗しません。シートが存在しない、ヘッダーや行が見つからない、
    /// 値を解析できないといった問題はすべてレポートに記録され、
    /// 他のシートの処理は継続されます。
    pub fn extract_workbook(&self, workbook: &Workbook) -> ExtractionReport {
        let mut report = ExtractionReport::new();

        for (requested, sheet) in self.select_sheets(workbook) {
            match sheet {
                Some(sheet) => report.merge(self.extract_sheet(sheet)),
                None => report.push_issue(ExtractionIssue::SheetNotFound { sheet: requested }),
            }
        }

        info!(
            facts = report.facts().len(),
            issues = report.issues().len(),
            "extraction finished"
        );
        report
    }

    /// 名前を指定して1シートの行を分類する
    ///
    /// シートが存在しない場合は空の結果と`SheetNotFound`を返します。
    pub fn classify_sheet(&self, workbook: &Workbook, sheet: &str) -> SheetClassification {
        match workbook.sheet(sheet) {
            Some(found) => SheetClassification {
                rows: self.matcher.classify_rows(&found.grid),
                issues: Vec::new(),
            },
            None => {
                let mut report = ExtractionReport::new();
                report.push_issue(ExtractionIssue::SheetNotFound {
                    sheet: sheet.to_string(),
                });
                SheetClassification {
                    rows: Vec::new(),
                    issues: report.issues().to_vec(),
                }
            }
        }
    }

    /// 1シートの先頭行をダンプ出力する
    ///
    /// シートが存在しない場合は`false`を返し、何も出力しません。
    pub fn dump<W: Write>(
        &self,
        workbook: &Workbook,
        sheet: &str,
        limit: usize,
        writer: &mut W,
    ) -> Result<bool, CeMatchError> {
        match workbook.sheet(sheet) {
            Some(found) => {
                render_dump(&found.grid, &self.matcher, &found.name, limit, writer)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 複数シートを順にダンプ出力する
    ///
    /// 存在しないシートは読み飛ばして処理を続け、`SheetNotFound`として返します。
    pub fn dump_sheets<W: Write>(
        &self,
        workbook: &Workbook,
        sheets: &[String],
        limit: usize,
        writer: &mut W,
    ) -> Result<Vec<ExtractionIssue>, CeMatchError> {
        let mut missing = Vec::new();
        for (index, name) in sheets.iter().enumerate() {
            if index > 0 {
                writeln!(writer)?;
            }
            if !self.dump(workbook, name, limit, writer)? {
                missing.push(ExtractionIssue::SheetNotFound {
                    sheet: name.clone(),
                });
            }
        }
        Ok(missing)
    }

    /// 選択方式に従ってシートを解決する（要求名とシートの組）
    fn select_sheets<'a>(&self, workbook: &'a Workbook) -> Vec<(String, Option<&'a Sheet>)> {
        let by_index = |index: usize| {
            let sheet = workbook.sheet_at(index);
            let name = sheet
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("#{}", index));
            (name, sheet)
        };
        let by_name = |name: &String| (name.clone(), workbook.sheet(name));

        match &self.config.sheet_selector {
            SheetSelector::All => workbook
                .sheets()
                .iter()
                .map(|s| (s.name.clone(), Some(s)))
                .collect(),
            SheetSelector::Index(index) => vec![by_index(*index)],
            SheetSelector::Name(name) => vec![by_name(name)],
            SheetSelector::Indices(indices) => indices.iter().copied().map(by_index).collect(),
            SheetSelector::Names(names) => names.iter().map(by_name).collect(),
        }
    }

    /// 1シートから全期間・全分類のファクトを抽出する
    fn extract_sheet(&self, sheet: &Sheet) -> ExtractionReport {
        let mut report = ExtractionReport::new();
        let matcher_config = self.matcher.config();
        let grid = &sheet.grid;

        // 行は期間に依存しないため、シートごとに1回だけ解決する
        let mut rows: Vec<(Classification, LabeledRow)> = Vec::new();
        for target in &matcher_config.targets {
            match self.matcher.find_row(grid, target) {
                Some(row) => rows.push((target.clone(), row)),
                None => report.push_issue(ExtractionIssue::RowNotFound {
                    sheet: sheet.name.clone(),
                    label: target.clone(),
                }),
            }
        }

        for period in &matcher_config.periods {
            let header = match self.matcher.resolve_period(grid, period) {
                Some(header) => header,
                None => {
                    report.push_issue(ExtractionIssue::HeaderNotFound {
                        sheet: sheet.name.clone(),
                        period: period.name.clone(),
                        window: matcher_config.header_rows,
                    });
                    continue;
                }
            };

            for (label, labeled) in &rows {
                // ヘッダーの受け持ち範囲内で最初に値のあるセルを読む
                let (col, reading) = extract_under_header(grid, labeled.row, &header);
                let cell = CellCoord::from_indices(labeled.row, col).to_a1_notation();
                match reading {
                    CellReading::Value(value) => {
                        debug!(sheet = %sheet.name, %label, period = %period.name, %cell, value, "fact extracted");
                        report.push_fact(ExtractedFact {
                            sheet: sheet.name.clone(),
                            label: label.clone(),
                            period: period.name.clone(),
                            value,
                            row: labeled.row,
                            col,
                            header: header.clone(),
                        });
                    }
                    CellReading::Missing => report.push_issue(ExtractionIssue::ValueMissing {
                        sheet: sheet.name.clone(),
                        cell,
                        label: label.clone(),
                        period: period.name.clone(),
                    }),
                    CellReading::Unparseable(raw) => {
                        report.push_issue(ExtractionIssue::ValueUnparseable {
                            sheet: sheet.name.clone(),
                            cell,
                            label: label.clone(),
                            period: period.name.clone(),
                            raw,
                        })
                    }
                }
            }
        }

        report
    }
}
