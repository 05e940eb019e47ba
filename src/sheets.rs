use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use log::{debug, info};

use crate::downloader::to_csv;
use crate::loader::from_csv_text;
use crate::metrics::{MetricsTable, Schema};
use crate::storage::{StorageError, StorageResult};

/// How long a remote read may be served from cache before a fresh fetch.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Client for a remote spreadsheet service exposing the table as CSV.
///
/// `GET url` returns the current table body; `POST url` replaces it. Reads
/// go through a cache bounded by the TTL, so a page view may observe data up
/// to one cache window stale relative to a very recent write from another
/// session. Writes invalidate the local cache immediately.
///
/// Unreachable service is surfaced as [`StorageError::Unavailable`]; there
/// is no retry or backoff here.
#[derive(Debug)]
pub struct SheetsClient {
    url: String,
    ttl: Duration,
    client: reqwest::Client,
    cache: RwLock<Option<CachedRead>>,
}

#[derive(Debug, Clone)]
struct CachedRead {
    fetched_at: SystemTime,
    table: MetricsTable,
}

impl SheetsClient {
    pub fn new(url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            url: url.into(),
            ttl,
            client: reqwest::Client::new(),
            cache: RwLock::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Load the table, serving from cache when it is still fresh.
    pub async fn read(&self) -> StorageResult<MetricsTable> {
        {
            let guard = self.cache.read().expect("cache lock poisoned");
            if let Some(cached) = guard.as_ref() {
                if is_fresh(cached.fetched_at, self.ttl, SystemTime::now()) {
                    debug!("serving remote table from cache");
                    return Ok(cached.table.clone());
                }
            }
        }

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StorageError::Unavailable(format!(
                "remote sheet answered {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let table =
            from_csv_text(&body, Schema::Core).map_err(|e| StorageError::Malformed(e.to_string()))?;

        let mut guard = self.cache.write().expect("cache lock poisoned");
        *guard = Some(CachedRead {
            fetched_at: SystemTime::now(),
            table: table.clone(),
        });
        info!("fetched {} rows from remote sheet", table.len());

        Ok(table)
    }

    /// Replace the remote table with `table` and drop the local cache.
    pub async fn update(&self, table: &MetricsTable) -> StorageResult<()> {
        let body = to_csv(table, Schema::Core);
        let response = self
            .client
            .post(&self.url)
            .header("content-type", "text/csv; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StorageError::Unavailable(format!(
                "remote sheet refused the update: {}",
                response.status()
            )));
        }

        // The next read must not observe the pre-write snapshot.
        let mut guard = self.cache.write().expect("cache lock poisoned");
        *guard = None;

        Ok(())
    }
}

/// Whether a cached read taken at `fetched_at` is still usable at `now`.
fn is_fresh(fetched_at: SystemTime, ttl: Duration, now: SystemTime) -> bool {
    match now.duration_since(fetched_at) {
        Ok(age) => age < ttl,
        // Clock went backwards; treat the entry as fresh rather than refetch.
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_entry_is_fresh_within_the_window() {
        let fetched = SystemTime::UNIX_EPOCH;
        let ttl = Duration::from_secs(600);
        assert!(is_fresh(fetched, ttl, fetched + Duration::from_secs(599)));
        assert!(!is_fresh(fetched, ttl, fetched + Duration::from_secs(600)));
        assert!(!is_fresh(fetched, ttl, fetched + Duration::from_secs(3600)));
    }

    #[test]
    fn clock_skew_does_not_force_a_refetch() {
        let fetched = SystemTime::UNIX_EPOCH + Duration::from_secs(1000);
        let earlier = SystemTime::UNIX_EPOCH + Duration::from_secs(500);
        assert!(is_fresh(fetched, Duration::from_secs(600), earlier));
    }
}
