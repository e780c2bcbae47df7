use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::AreaSource;
use crate::error::{AreasError, AreasResult};
use crate::models::area::Dataset;

#[derive(Clone)]
pub struct CacheEntry {
    pub data: Arc<Dataset>,
    pub timestamp: DateTime<Utc>,
    refreshed: Instant,
}

impl CacheEntry {
    fn new(data: Dataset) -> Self {
        Self {
            data: Arc::new(data),
            timestamp: Utc::now(),
            refreshed: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.refreshed.elapsed() <= ttl
    }
}

/// Snapshot of the cache for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub areas: usize,
    pub fetched_at: DateTime<Utc>,
    pub age_secs: u64,
}

/// Holds the last fetched dataset and refetches it once it is older than `ttl`.
///
/// The staleness check and the refetch happen under one lock, so a burst of
/// requests against a stale entry produces a single upstream call. `latest`
/// mirrors the entry outside that lock for readers that must not wait on a
/// fetch.
pub struct DatasetCache {
    source: Arc<dyn AreaSource>,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
    latest: RwLock<Option<CacheEntry>>,
}

impl DatasetCache {
    pub fn new(source: Arc<dyn AreaSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: Mutex::new(None),
            latest: RwLock::new(None),
        }
    }

    fn store(&self, slot: &mut Option<CacheEntry>, dataset: Dataset) -> Arc<Dataset> {
        let fresh = CacheEntry::new(dataset);
        let data = fresh.data.clone();
        if let Ok(mut latest) = self.latest.write() {
            *latest = Some(fresh.clone());
        }
        *slot = Some(fresh);
        data
    }

    /// Returns the cached dataset, refreshing it first if it is stale.
    pub async fn get(&self) -> AreasResult<Arc<Dataset>> {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.is_fresh(self.ttl) {
                debug!("Cache hit ({} areas)", cached.data.len());
                return Ok(cached.data.clone());
            }
        }

        debug!("Cache miss, fetching areas");
        match self.source.fetch_areas().await {
            Ok(dataset) => {
                info!("Refreshed areas dataset ({} areas)", dataset.len());
                Ok(self.store(&mut entry, dataset))
            }
            Err(AreasError::RateLimited) => match entry.as_ref() {
                Some(stale) => {
                    warn!("Rate limit hit, serving stale areas from {}", stale.timestamp);
                    Ok(stale.data.clone())
                }
                None => Err(AreasError::RateLimited),
            },
            Err(e) => Err(e),
        }
    }

    /// Unconditionally refetches the dataset.
    pub async fn refresh(&self) -> AreasResult<Arc<Dataset>> {
        let mut entry = self.entry.lock().await;
        let dataset = self.source.fetch_areas().await?;
        info!("Loaded areas dataset ({} areas)", dataset.len());
        Ok(self.store(&mut entry, dataset))
    }

    /// Reads the last stored entry without waiting for an in-flight fetch.
    pub fn status(&self) -> Option<CacheStatus> {
        let latest = self.latest.read().ok()?;
        latest.as_ref().map(|cached| CacheStatus {
            areas: cached.data.len(),
            fetched_at: cached.timestamp,
            age_secs: cached.refreshed.elapsed().as_secs(),
        })
    }
}
