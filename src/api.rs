//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 行の分類タグ
///
/// 損益計算書（Conto Economico）の行に付与される分類です。
/// 既知の分類のほかに、テンプレートで任意のラベルを定義できます。
///
/// 文字列との相互変換は大文字小文字を区別しません。
/// `"ricavi"`、`"RICAVI"`はどちらも`Classification::Ricavi`になります。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Classification {
    /// 費用（COSTI）
    Costi,

    /// 収益（RICAVI）
    Ricavi,

    /// 差額（DIFFERENZA = 収益 − 費用）
    Differenza,

    /// テンプレートで定義された任意のラベル
    Custom(String),
}

impl Classification {
    /// 表示用のラベル
    pub fn as_str(&self) -> &str {
        match self {
            Classification::Costi => "COSTI",
            Classification::Ricavi => "RICAVI",
            Classification::Differenza => "DIFFERENZA",
            Classification::Custom(label) => label,
        }
    }
}

impl From<String> for Classification {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "costi" => Classification::Costi,
            "ricavi" => Classification::Ricavi,
            "differenza" => Classification::Differenza,
            _ => Classification::Custom(value.trim().to_string()),
        }
    }
}

impl From<&str> for Classification {
    fn from(value: &str) -> Self {
        Classification::from(value.to_string())
    }
}

impl From<Classification> for String {
    fn from(value: Classification) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 行の走査方向
///
/// 同じ分類に一致する行が複数ある場合の優先順位を決めます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDirection {
    /// 先頭行から走査し、最初の一致を採用
    Forward,

    /// 最終行から走査し、最初の一致を採用
    ///
    /// 再計算・訂正された合計はシートの下方に現れる傾向があるため、
    /// 古い値より後ろの値を優先します。
    Reverse,
}

/// シート選択方式
///
/// 抽出対象のシートを選択する方法を指定します。
/// 存在しないシートはエラーではなく`SheetNotFound`としてレポートされます。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SheetSelector {
    /// すべてのシート（デフォルト）
    #[default]
    All,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("CE dettaglio".to_string())`
    Name(String),

    /// 複数のインデックス指定
    Indices(Vec<usize>),

    /// 複数のシート名指定
    Names(Vec<String>),
}

/// 出力フォーマット
///
/// 抽出結果（`ExtractionReport`）を書き出す形式を指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum OutputFormat {
    /// JSON形式（デフォルト）
    ///
    /// シート → 期間 → ラベル → 値 のマッピングに加え、ファクトと問題の一覧を出力します。
    ///
    /// ```json
    /// {
    ///   "sheets": { "CE": { "ytd": { "RICAVI": 39215.0 } } },
    ///   "facts": [ ... ],
    ///   "issues": [ ... ]
    /// }
    /// ```
    #[default]
    Json,

    /// CSV形式
    ///
    /// ファクト1件につき1行を出力します。
    ///
    /// ```csv
    /// sheet,label,period,value,cell
    /// CE,RICAVI,ytd,39215,C6
    /// ```
    Csv,

    /// 幅揃えされたテキスト表（コンソール表示用）
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_from_string_is_case_insensitive() {
        assert_eq!(Classification::from("ricavi"), Classification::Ricavi);
        assert_eq!(Classification::from(" COSTI "), Classification::Costi);
        assert_eq!(Classification::from("Differenza"), Classification::Differenza);
        assert_eq!(
            Classification::from("Utile netto"),
            Classification::Custom("Utile netto".to_string())
        );
    }

    #[test]
    fn test_classification_display() {
        assert_eq!(Classification::Costi.to_string(), "COSTI");
        assert_eq!(Classification::Differenza.to_string(), "DIFFERENZA");
        assert_eq!(Classification::Custom("EBITDA".to_string()).to_string(), "EBITDA");
    }

    #[test]
    fn test_classification_serde_round_trip() {
        let json = serde_json::to_string(&Classification::Ricavi).unwrap();
        assert_eq!(json, "\"RICAVI\"");
        let parsed: Classification = serde_json::from_str("\"differenza\"").unwrap();
        assert_eq!(parsed, Classification::Differenza);
    }

    #[test]
    fn test_scan_direction_deserialize() {
        let parsed: ScanDirection = serde_json::from_str("\"reverse\"").unwrap();
        assert_eq!(parsed, ScanDirection::Reverse);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(SheetSelector::default(), SheetSelector::All);
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
    }
}
