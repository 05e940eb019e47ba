use std::error::Error;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::sheets::{DEFAULT_CACHE_TTL, SheetsClient};
use crate::storage::{Backend, CsvFile};

/// Which storage backend holds the metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Local CSV file on disk (full 7-column layout).
    Csv,
    /// Remote spreadsheet service over HTTP (core 5-column layout).
    Sheets,
}

/// Weekly follow-up metrics dashboard for the VSX outreach program.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Storage backend holding the metrics table.
    #[arg(long, value_enum, default_value_t = BackendKind::Csv)]
    pub backend: BackendKind,

    /// Path of the local CSV database (csv backend).
    #[arg(long, default_value = "data_vsx_suivi.csv")]
    pub data_file: String,

    /// URL of the remote spreadsheet service (required by the sheets
    /// backend). GET must return the table as CSV, POST replaces it.
    #[arg(long)]
    pub sheet_url: Option<String>,

    /// Read-cache time-to-live for the sheets backend, in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL.as_secs())]
    pub cache_ttl: u64,

    /// Address the web server listens on.
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub bind: String,

    /// Turn on verbose logging to the standard output.
    #[arg(long)]
    pub verbose: bool,
}

impl Args {
    /// Build the storage backend these arguments select.
    ///
    /// # Errors
    /// Fails when the sheets backend is selected without `--sheet-url`.
    pub fn build_backend(&self) -> Result<Backend, Box<dyn Error>> {
        match self.backend {
            BackendKind::Csv => Ok(Backend::Csv(CsvFile::new(&self.data_file))),
            BackendKind::Sheets => {
                let url = self
                    .sheet_url
                    .as_deref()
                    .ok_or("--sheet-url is required with --backend sheets")?;
                Ok(Backend::Sheets(SheetsClient::new(
                    url,
                    Duration::from_secs(self.cache_ttl),
                )))
            }
        }
    }
}
