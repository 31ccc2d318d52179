//! Workbook Loader
//!
//! calamineを使用してワークブック全体をメモリに読み込み、
//! 各シートを照合処理用の[`Grid`]に変換します。

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use tracing::{debug, info};

use crate::error::CeMatchError;
use crate::grid::Grid;
use crate::security::SecurityConfig;
use crate::types::{CellValue, Sheet, Workbook};

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::String(s) => CellValue::from(s.as_str()),
            Data::Empty => CellValue::Empty,
            // 論理値・ISO日付・エラー値は表示文字列として保持
            other => CellValue::String(other.to_string()),
        }
    }
}

/// ワークブックパーサー
///
/// calamineのラッパーとして、ワークブックの読み込みを提供します。
/// 形式（XLSX / XLS / XLSB / ODS）は内容から自動判別されます。
pub(crate) struct WorkbookParser {
    /// calamineのワークブック
    workbook: Sheets<Cursor<Vec<u8>>>,
}

impl WorkbookParser {
    /// ワークブックを開く
    ///
    /// 入力全体をメモリに読み込んでから解析します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - 読み込みに成功した場合
    /// * `Err(CeMatchError::SecurityViolation)` - 入力サイズが上限を超えた場合
    /// * `Err(CeMatchError::Parse)` - ワークブックとして解析できない場合
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self, CeMatchError> {
        Self::open_with_config(reader, &SecurityConfig::default())
    }

    /// サイズ上限を指定してワークブックを開く
    pub fn open_with_config<R: Read + Seek>(
        reader: R,
        security_config: &SecurityConfig,
    ) -> Result<Self, CeMatchError> {
        let buffer = security_config.read_input(reader)?;

        let workbook = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        Ok(Self { workbook })
    }

    /// すべてのシート名を取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// すべてのシートを読み込み、[`Workbook`]に変換する
    ///
    /// いずれかのシートの解析に失敗した場合、部分的な結果は返しません。
    pub fn into_workbook(mut self) -> Result<Workbook, CeMatchError> {
        let mut sheets = Vec::new();
        for name in self.sheet_names() {
            let range = self.workbook.worksheet_range(&name)?;
            let grid = range_to_grid(&range);
            debug!(
                sheet = %name,
                rows = grid.row_count(),
                cols = grid.col_count(),
                "sheet loaded"
            );
            sheets.push(Sheet { name, grid });
        }

        info!(sheets = sheets.len(), "workbook loaded");
        Ok(Workbook::new(sheets))
    }
}

/// calamineの範囲をグリッドに変換する
///
/// calamineの範囲は最初の使用セルから始まるため、先頭の空行・空列を補い、
/// シート上の絶対座標を保ちます。各行の末尾の空セルは除去します。
fn range_to_grid(range: &Range<Data>) -> Grid {
    let (start_row, start_col) = match range.start() {
        Some(start) => start,
        None => return Grid::default(),
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(CellValue::from));
        while cells.last().is_some_and(CellValue::is_empty) {
            cells.pop();
        }
        rows.push(cells);
    }

    Grid::from_rows(rows)
}

/// 任意のリーダーからワークブックを読み込む
///
/// ```rust,no_run
/// use std::fs::File;
///
/// # fn main() -> Result<(), cematch::CeMatchError> {
/// let workbook = cematch::load_workbook(File::open("CE_2025.xlsx")?)?;
/// println!("{:?}", workbook.sheet_names());
/// # Ok(())
/// # }
/// ```
pub fn load_workbook<R: Read + Seek>(reader: R) -> Result<Workbook, CeMatchError> {
    WorkbookParser::open(reader)?.into_workbook()
}

/// ファイルパスからワークブックを読み込む
///
/// ファイルが存在しない場合は`CeMatchError::FileNotFound`を返します。
pub fn load_workbook_path<P: AsRef<Path>>(path: P) -> Result<Workbook, CeMatchError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CeMatchError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    info!(path = %path.display(), "opening workbook");
    load_workbook(File::open(path)?)
}
