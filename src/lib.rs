//! cematch - Heuristic extraction of Conto Economico figures from Excel workbooks
//!
//! This crate locates summary rows (RICAVI, COSTI, DIFFERENZA) and period
//! columns (YTD, monthly) in loosely structured Italian income-statement
//! workbooks, and reads their values as a structured report. Sheets that do
//! not match are reported as issues instead of aborting the run.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cematch::{Classification, ExtractorBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Default settings: all sheets, YTD column, RICAVI / COSTI / DIFFERENZA
//!     let extractor = ExtractorBuilder::new().build()?;
//!
//!     let report = extractor.extract_path("CE_2025.xlsx")?;
//!     if let Some(ricavi) = report.value("CE", &Classification::Ricavi, "ytd") {
//!         println!("RICAVI YTD = {}", ricavi);
//!     }
//!     for issue in report.issues() {
//!         eprintln!("warning: {}", issue);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use chrono::Month;
//! use cematch::{ExtractorBuilder, OutputFormat, PeriodSpec, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = ExtractorBuilder::new()
//!         .with_sheet_selector(SheetSelector::Names(vec!["CE dettaglio".to_string()]))
//!         .with_period(PeriodSpec::ytd().with_fallback_column(17))
//!         .with_period(PeriodSpec::month(Month::January))
//!         .with_header_alias("ytd", "cumulato")
//!         .build()?;
//!
//!     let input = std::fs::File::open("CE_2025.xlsx")?;
//!     extractor.extract_to_writer(input, std::io::stdout(), OutputFormat::Csv)?;
//!     Ok(())
//! }
//! ```
//!
//! # Templates
//!
//! Matching rules can be kept in a TOML template per workbook family. Rule
//! lists such as `[[phrases]]` are added to the built-in rules, so the
//! default COSTI phrases still apply below; set `replace_defaults = true`
//! to drop them instead.
//!
//! ```rust
//! use cematch::{Classification, ExtractorBuilder, Template};
//!
//! # fn main() -> Result<(), cematch::CeMatchError> {
//! let template = Template::from_toml_str(r#"
//!     sheets = ["CE sintetico"]
//!     header_rows = 8
//!     targets = ["RICAVI", "COSTI"]
//!
//!     [[phrases]]
//!     text = "valore della produzione"
//!     label = "RICAVI"
//! "#)?;
//! assert_eq!(template.matcher.targets, vec![Classification::Ricavi, Classification::Costi]);
//! assert!(template.matcher.phrases.iter().any(|p| p.text == "totale costi"));
//!
//! let extractor = ExtractorBuilder::new().with_template(template).build()?;
//! # let _ = extractor;
//! # Ok(())
//! # }
//! ```
//!
//! # Lower-level API
//!
//! [`RowMatcher`] classifies rows and locates header columns on an in-memory
//! [`Grid`], and [`extract_value`] reads one cell with Italian number
//! formatting support.

mod api;
mod builder;
mod config;
mod error;
mod grid;
mod matcher;
mod output;
mod parser;
mod report;
mod security;
mod types;
mod value;

// 公開API
pub use api::{Classification, OutputFormat, ScanDirection, SheetSelector};
pub use builder::{Extractor, ExtractorBuilder};
pub use config::{
    italian_month_name, MatcherConfig, PeriodSpec, PhraseRule, Template, TokenRule,
};
pub use error::{CeMatchError, ExtractionIssue};
pub use grid::Grid;
pub use matcher::RowMatcher;
pub use output::{render_dump, OutputFormatter};
pub use parser::{load_workbook, load_workbook_path};
pub use report::{ExtractionReport, SheetClassification, SheetValues};
pub use types::{
    CellCoord, CellValue, ExtractedFact, HeaderLocation, LabeledRow, MatchRule, Sheet, Workbook,
};
pub use value::{extract_under_header, extract_value, parse_locale_number, CellReading};
