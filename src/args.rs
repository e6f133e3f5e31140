use clap::Parser;
use std::path::PathBuf;

/// Descriptive statistics for a lawyer registry spreadsheet.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The registry export: .csv, .xlsx, .xlsm, .xls or .ods.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// (file path, optional) JSON settings file. Flags below override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// (default Tous) Restrict statistics and charts to one bar association.
    #[arg(short, long)]
    pub barreau: Option<String>,

    /// (default first sheet) Worksheet to read when the input is a workbook.
    #[arg(long)]
    pub sheet: Option<String>,

    /// (file path, optional) Extra `name,gender` first-name dictionary.
    #[arg(long)]
    pub names: Option<PathBuf>,

    /// (file path, optional) `nam_dict.txt` first-name database, as shipped
    /// with gender-guesser. Merged before `--names`.
    #[arg(long)]
    pub name_dict: Option<PathBuf>,

    /// (directory, optional) Write statistics, charts and cross-tabs as JSON and CSV.
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Rows shown per table in the terminal.
    #[arg(long, default_value_t = 8)]
    pub preview_rows: usize,

    /// Reference date (YYYY-MM-DD) for experience and age. Defaults to today.
    #[arg(long)]
    pub reference_date: Option<chrono::NaiveDate>,

    /// Numbered menu: load, pick a bar association, generate reports.
    #[arg(long)]
    pub interactive: bool,

    /// Turn on debug logging.
    #[arg(long)]
    pub verbose: bool,
}
