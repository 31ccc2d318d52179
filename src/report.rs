//! Report Module
//!
//! 抽出結果（ファクト）と非致命的な問題をまとめるレポート型。

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::api::Classification;
use crate::error::ExtractionIssue;
use crate::types::{ExtractedFact, LabeledRow};

/// シート → 期間 → ラベル → 値 のマッピング
pub type SheetValues = BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>;

/// 1回の抽出処理の結果
///
/// ファクトは「シートの選択順 → 期間の設定順 → 分類の設定順」に並びます。
/// 同じ入力からは常に同じレポートが得られます。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExtractionReport {
    facts: Vec<ExtractedFact>,
    issues: Vec<ExtractionIssue>,
}

impl ExtractionReport {
    /// 空のレポートを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// 抽出されたファクト
    pub fn facts(&self) -> &[ExtractedFact] {
        &self.facts
    }

    /// 報告された問題
    pub fn issues(&self) -> &[ExtractionIssue] {
        &self.issues
    }

    /// 問題が1件もないかどうか
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// 指定したシート・分類・期間の値
    pub fn value(&self, sheet: &str, label: &Classification, period: &str) -> Option<f64> {
        self.facts
            .iter()
            .find(|f| f.sheet == sheet && f.label == *label && f.period.eq_ignore_ascii_case(period))
            .map(|f| f.value)
    }

    /// シート → 期間 → ラベル → 値 のマッピング
    pub fn by_sheet(&self) -> SheetValues {
        let mut map = SheetValues::new();
        for fact in &self.facts {
            map.entry(fact.sheet.clone())
                .or_default()
                .entry(fact.period.clone())
                .or_default()
                .insert(fact.label.to_string(), fact.value);
        }
        map
    }

    pub(crate) fn push_fact(&mut self, fact: ExtractedFact) {
        self.facts.push(fact);
    }

    /// 問題を記録し、座標付きで警告ログに出力する
    pub(crate) fn push_issue(&mut self, issue: ExtractionIssue) {
        warn!(sheet = %issue.sheet(), cell = issue.cell().unwrap_or("-"), "{}", issue);
        self.issues.push(issue);
    }

    pub(crate) fn merge(&mut self, other: ExtractionReport) {
        self.facts.extend(other.facts);
        self.issues.extend(other.issues);
    }
}

/// 1シートの行分類の結果
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SheetClassification {
    /// 分類できた行（先頭から順）
    pub rows: Vec<LabeledRow>,

    /// 報告された問題（シートが存在しない場合など）
    pub issues: Vec<ExtractionIssue>,
}
