use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::{info, warn};
use thiserror::Error;

use crate::downloader::to_csv;
use crate::loader::from_csv_text;
use crate::metrics::{MetricsTable, Schema};
use crate::sheets::SheetsClient;

/// Failure of a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium cannot be reached (remote service down, DNS
    /// failure, non-2xx response). Surfaced to the user, never retried.
    #[error("STORAGE_UNAVAILABLE: {0}")]
    Unavailable(String),

    /// Local file I/O failed.
    #[error("IO_FAILURE: {0}")]
    Io(String),

    /// The stored data does not match the expected column layout.
    #[error("MALFORMED_TABLE: {0}")]
    Malformed(String),
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Local CSV-file persistence (the original "flat file database").
///
/// Reads are immediate: every load re-reads the file, every save rewrites it
/// whole. A missing file is not an error; it loads as an empty table and is
/// created on the first save.
#[derive(Debug)]
pub struct CsvFile {
    path: PathBuf,
    schema: Schema,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: Schema::Full,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StorageResult<MetricsTable> {
        if !self.path.exists() {
            info!("no data file at {}, starting empty", self.path.display());
            return Ok(MetricsTable::new());
        }
        let text = fs::read_to_string(&self.path)?;
        from_csv_text(&text, self.schema).map_err(|e| StorageError::Malformed(e.to_string()))
    }

    fn save(&self, table: &MetricsTable) -> StorageResult<()> {
        let mut file = fs::File::create(&self.path)?;
        file.write_all(to_csv(table, self.schema).as_bytes())?;
        Ok(())
    }
}

/// In-memory table store.
///
/// The substitute backend for tests, holding the table behind a lock so the
/// same submit flow runs against it without touching disk or network.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<MetricsTable>,
    schema: Schema,
}

impl MemoryStore {
    pub fn new(schema: Schema) -> Self {
        Self {
            table: RwLock::new(MetricsTable::new()),
            schema,
        }
    }

    fn load(&self) -> MetricsTable {
        self.table.read().expect("store lock poisoned").clone()
    }

    fn save(&self, table: &MetricsTable) {
        *self.table.write().expect("store lock poisoned") = table.clone();
    }
}

/// The storage adapter: one load/save contract, three implementations.
///
/// Every page view loads the full table through this enum, and every form
/// submission writes the full table back. There is no locking across
/// sessions: two concurrent submissions race at `save` and the last writer
/// wins, which matches the single-operator usage this tool is built for.
#[derive(Debug)]
pub enum Backend {
    /// Local CSV file, full 7-column layout.
    Csv(CsvFile),
    /// Remote spreadsheet service, core 5-column layout, TTL-cached reads.
    Sheets(SheetsClient),
    /// In-memory store, for tests.
    Memory(MemoryStore),
}

impl Backend {
    /// Column layout this backend persists.
    pub fn schema(&self) -> Schema {
        match self {
            Self::Csv(_) => Schema::Full,
            Self::Sheets(_) => Schema::Core,
            Self::Memory(store) => store.schema,
        }
    }

    /// Human-readable description, shown in the page footer and the logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Csv(file) => format!("fichier local {}", file.path().display()),
            Self::Sheets(client) => format!("feuille distante {}", client.url()),
            Self::Memory(_) => "stockage en mémoire".to_string(),
        }
    }

    /// Load the whole table.
    ///
    /// Missing local data loads as an empty table. Remote reads may be up to
    /// one cache window stale relative to a write from another session.
    pub async fn load(&self) -> StorageResult<MetricsTable> {
        match self {
            Self::Csv(file) => file.load(),
            Self::Sheets(client) => client.read().await,
            Self::Memory(store) => Ok(store.load()),
        }
    }

    /// Replace the whole backing dataset with `table`.
    ///
    /// No partial-write guarantee: a failure mid-write leaves storage in an
    /// undefined state. Concurrent sessions race here; last writer wins.
    pub async fn save(&self, table: &MetricsTable) -> StorageResult<()> {
        let result = match self {
            Self::Csv(file) => file.save(table),
            Self::Sheets(client) => client.update(table).await,
            Self::Memory(store) => {
                store.save(table);
                Ok(())
            }
        };
        if let Err(e) = &result {
            warn!("save to {} failed: {}", self.describe(), e);
        }
        result
    }
}
