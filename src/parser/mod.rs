//! Parser Module
//!
//! calamineを使用したワークブック読み込みの実装。
//! ワークブックは1回の読み込みで完全にメモリへ展開されます。

mod workbook;

pub use workbook::{load_workbook, load_workbook_path};
