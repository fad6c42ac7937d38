// ⚙️ Configuration - command line + environment
// Everything has a default; a bare `duck-legends` reads ./ducks.csv

use crate::legends::DEFAULT_SOURCE;
use crate::loader::LoadOptions;
use crate::output::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Rank duck-sighting authors by how many living species they found.
#[derive(Parser, Debug)]
#[command(name = "duck-legends", version)]
pub struct CliArgs {
    /// CSV file with author, name, year and extinct columns.
    #[arg(value_name = "SOURCE", env = "DUCK_LEGENDS_SOURCE", default_value = DEFAULT_SOURCE)]
    pub source: PathBuf,

    /// Output format.
    #[arg(long, value_enum, env = "DUCK_LEGENDS_FORMAT", default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Field delimiter (a single ASCII character, or `tab`).
    #[arg(long, value_parser = parse_delimiter, default_value = ",")]
    pub delimiter: u8,

    /// Print what was loaded (columns, types, row count) to stderr.
    #[arg(long)]
    pub summary: bool,

    /// Debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match raw.as_bytes() {
            [b] if b.is_ascii() && *b != b'"' && *b != b'\n' => Ok(*b),
            _ => Err(format!("delimiter must be one ASCII character, got `{}`", raw)),
        },
    }
}

/// Resolved settings for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub source: PathBuf,
    pub format: OutputFormat,
    pub load: LoadOptions,
    pub show_summary: bool,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: PathBuf::from(DEFAULT_SOURCE),
            format: OutputFormat::default(),
            load: LoadOptions::default(),
            show_summary: false,
            verbose: false,
        }
    }
}

impl From<CliArgs> for Config {
    fn from(args: CliArgs) -> Self {
        Config {
            source: args.source,
            format: args.format,
            load: LoadOptions {
                delimiter: args.delimiter,
            },
            show_summary: args.summary,
            verbose: args.verbose,
        }
    }
}

impl Config {
    /// Default tracing filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "duck_legends=debug,info"
        } else {
            "info"
        }
    }
}
