//! Grid Module
//!
//! シートのセルを行 × 列の2次元グリッドとして保持するモジュール。
//! 行ごとの長さは揃っていない（ragged）ため、範囲外の参照は空セルとして扱います。

use crate::types::CellValue;

static EMPTY: CellValue = CellValue::Empty;

/// シートのセルグリッド
///
/// 行0がシートの最上行、列0が最左列です。
/// 各行は末尾の空セルを持たない可能性があります。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    /// グリッドデータ（行 × 列）
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    /// 行の一覧からグリッドを構築
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// 文字列の2次元配列からグリッドを構築
    ///
    /// 空文字列は空セルになります。テストや診断ツールでの利用を想定しています。
    ///
    /// ```rust
    /// use cematch::{CellValue, Grid};
    ///
    /// let grid = Grid::from_strings(&[&["", "", "2025 YTD"], &["TOTALE RICAVI"]]);
    /// assert_eq!(grid.row_count(), 2);
    /// assert_eq!(grid.cell(1, 5), &CellValue::Empty);
    /// ```
    pub fn from_strings(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|s| CellValue::from(*s)).collect())
                .collect(),
        }
    }

    /// 行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 最大列数（最も長い行の長さ）
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// グリッドが空かどうか
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(CellValue::is_empty))
    }

    /// 指定行のセル（範囲外の場合は空スライス）
    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 指定座標のセル（範囲外の場合は空セル）
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// 全行のイテレーター
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[CellValue]> + ExactSizeIterator {
        self.rows.iter().map(Vec::as_slice)
    }
}
