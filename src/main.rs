//! cematch CLI
//!
//! Conto Economicoワークブックから値を抽出するコマンドラインツール。

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::Level;

use cematch::{
    load_workbook_path, CeMatchError, ExtractorBuilder, OutputFormat, OutputFormatter,
    SheetSelector,
};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
/// `--strict`指定時に問題が報告された場合
const EXIT_ISSUES: u8 = 3;

#[derive(Parser)]
#[command(name = "cematch")]
#[command(about = "Extract RICAVI / COSTI / DIFFERENZA figures from Conto Economico workbooks")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract labeled values for each selected sheet and period
    #[command(after_help = "\
Examples:
  cematch extract CE_2025.xlsx
  cematch extract CE_2025.xlsx --sheet 'CE dettaglio' --format text
  cematch extract CE_2025.xlsx --template ce_sintetico.toml -f csv -o out.csv
  cematch extract CE_2025.xlsx --ytd-column 17 --strict")]
    Extract {
        /// Workbook to read (xlsx, xlsm, xls, xlsb, ods)
        file: PathBuf,

        /// TOML template with matching rules
        #[arg(long, short = 't')]
        template: Option<PathBuf>,

        /// Sheet to extract. Repeatable; defaults to all sheets
        #[arg(long, short = 's')]
        sheet: Vec<String>,

        /// Output format
        #[arg(long, short = 'f', value_enum, default_value = "json")]
        format: Format,

        /// Column index (0-based) used when no YTD header is found
        #[arg(long, value_name = "N")]
        ytd_column: Option<usize>,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Exit with a non-zero status when any issue is reported
        #[arg(long)]
        strict: bool,
    },

    /// Show how each row is normalized and classified
    Dump {
        /// Workbook to read
        file: PathBuf,

        /// Sheet to dump; repeat for several (defaults to all sheets)
        #[arg(long, short = 's')]
        sheet: Vec<String>,

        /// Maximum number of rows per sheet
        #[arg(long, short = 'n', default_value_t = 60)]
        rows: usize,

        /// TOML template with matching rules
        #[arg(long, short = 't')]
        template: Option<PathBuf>,
    },

    /// List sheet names
    Sheets {
        /// Workbook to read
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
    Text,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Csv => OutputFormat::Csv,
            Format::Text => OutputFormat::Text,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Extract {
            file,
            template,
            sheet,
            format,
            ytd_column,
            output,
            strict,
        } => run_extract(
            &file,
            template.as_deref(),
            sheet,
            format.into(),
            ytd_column,
            output.as_deref(),
            strict,
        ),
        Commands::Dump {
            file,
            sheet,
            rows,
            template,
        } => run_dump(&file, &sheet, rows, template.as_deref()),
        Commands::Sheets { file } => run_sheets(&file),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            handle_error(e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// ログは標準エラー出力へ（標準出力はレポート用）
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn builder_for(template: Option<&Path>) -> Result<ExtractorBuilder, CeMatchError> {
    let builder = ExtractorBuilder::new();
    match template {
        Some(path) => builder.with_template_file(path),
        None => Ok(builder),
    }
}

fn run_extract(
    file: &Path,
    template: Option<&Path>,
    sheets: Vec<String>,
    format: OutputFormat,
    ytd_column: Option<usize>,
    output: Option<&Path>,
    strict: bool,
) -> Result<u8, CeMatchError> {
    let mut builder = builder_for(template)?;
    if !sheets.is_empty() {
        builder = builder.with_sheet_selector(SheetSelector::Names(sheets));
    }
    if let Some(col) = ytd_column {
        builder = builder.with_fallback_column("ytd", col);
    }
    let extractor = builder.build()?;

    let report = extractor.extract_path(file)?;
    let formatter = OutputFormatter::from_format(format);
    match output {
        Some(path) => {
            let mut out = File::create(path)?;
            formatter.render(&report, &mut out)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            formatter.render(&report, &mut handle)?;
            handle.flush()?;
        }
    }

    if strict && !report.is_clean() {
        eprintln!("{} issue(s) reported", report.issues().len());
        return Ok(EXIT_ISSUES);
    }
    Ok(EXIT_SUCCESS)
}

fn run_dump(
    file: &Path,
    sheets: &[String],
    rows: usize,
    template: Option<&Path>,
) -> Result<u8, CeMatchError> {
    let extractor = builder_for(template)?.build()?;
    let workbook = load_workbook_path(file)?;

    let names: Vec<String> = if sheets.is_empty() {
        workbook.sheet_names().into_iter().map(str::to_string).collect()
    } else {
        sheets.to_vec()
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let missing = extractor.dump_sheets(&workbook, &names, rows, &mut handle)?;
    handle.flush()?;

    for issue in &missing {
        eprintln!("{}", issue);
    }
    if missing.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_ERROR)
    }
}

fn run_sheets(file: &Path) -> Result<u8, CeMatchError> {
    let workbook = load_workbook_path(file)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for (i, sheet) in workbook.sheets().iter().enumerate() {
        writeln!(handle, "{}\t{}\t{} rows", i, sheet.name, sheet.grid.row_count())?;
    }
    handle.flush()?;
    Ok(EXIT_SUCCESS)
}

fn handle_error(error: CeMatchError) {
    match error {
        CeMatchError::FileNotFound { path } => {
            eprintln!("File not found: {}", path.display());
            eprintln!("Please check the path and try again.");
        }
        CeMatchError::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that you have permission to access the file.");
        }
        CeMatchError::Parse(parse_err) => {
            eprintln!("Parse Error: {}", parse_err);
            eprintln!("The file may not be a valid workbook or may be corrupted.");
        }
        CeMatchError::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
        }
        CeMatchError::Template(toml_err) => {
            eprintln!("Template Error: {}", toml_err);
            eprintln!("Please check the TOML syntax and field names of the template.");
        }
        CeMatchError::SecurityViolation(msg) => {
            eprintln!("Security Violation: {}", msg);
        }
        CeMatchError::Output(msg) => {
            eprintln!("Output Error: {}", msg);
        }
    }
}
