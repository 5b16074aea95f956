use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "ecganncmp",
    version,
    about = "Compare ECG conclusion annotations against a reference"
)]
pub struct Cli {
    /// File or folder with reference annotations
    pub ref_path: PathBuf,

    /// Files or folders with test annotations
    #[arg(required = true)]
    pub test_paths: Vec<PathBuf>,

    /// Path to the conclusion thesaurus
    #[arg(short = 't', long)]
    pub thesaurus: PathBuf,

    /// List matched and mismatched conclusions of every record
    #[arg(short = 'f', long, default_value_t = false)]
    pub full: bool,

    /// Normalization factor for the normalized F-score
    #[arg(long)]
    pub knorm: Option<f64>,

    /// Add the corpus summary
    #[arg(short = 's', long, default_value_t = false)]
    pub summary: bool,

    /// Add per-group statistics
    #[arg(short = 'g', long, default_value_t = false)]
    pub groups: bool,

    /// Add per-statement statistics
    #[arg(long, default_value_t = false)]
    pub statements: bool,

    /// Language of the text report labels
    #[arg(short = 'l', long = "lang", value_enum, default_value_t = Language::En)]
    pub language: Language,

    /// File declaring unions of thesaurus groups
    #[arg(short = 'u', long = "group-unions")]
    pub group_unions: Option<PathBuf>,

    /// Only groups named in group unions make statements equivalent
    #[arg(long, default_value_t = false)]
    pub unions_only: bool,

    /// Emit the report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Write the JSON report to a file instead of stdout
    #[arg(short = 'o', long, requires = "json")]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Language {
    En,
    Ru,
}
