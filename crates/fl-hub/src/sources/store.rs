//! # Record Store
//!
//! Holds the currently loaded record set. Readers take an `Arc` snapshot and
//! release the lock immediately; a reload builds the new set off to the side
//! and swaps it in, so in-flight queries finish against the set they started
//! with.

use super::{LogSource, SourceError, SourceInfo};
use chrono::{DateTime, Utc};
use fl_core::LogRecord;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Loaded {
    records: Arc<Vec<LogRecord>>,
    at: Option<DateTime<Utc>>,
}

pub struct RecordStore {
    source: Arc<dyn LogSource>,
    loaded: RwLock<Loaded>,
}

impl RecordStore {
    /// An empty store. Call [`RecordStore::reload`] to populate it.
    pub fn new(source: Arc<dyn LogSource>) -> Self {
        Self {
            source,
            loaded: RwLock::new(Loaded {
                records: Arc::new(Vec::new()),
                at: None,
            }),
        }
    }

    pub fn source(&self) -> SourceInfo {
        self.source.info()
    }

    /// The current record set.
    pub async fn snapshot(&self) -> Arc<Vec<LogRecord>> {
        self.loaded.read().await.records.clone()
    }

    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded.read().await.at
    }

    /// Loads from the source and swaps the result in. On failure the
    /// previous records stay in place.
    pub async fn reload(&self) -> Result<usize, SourceError> {
        let info = self.source.info();
        let records = match self.source.load().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Failed to load records from {}: {}", info.description, e);
                return Err(e);
            }
        };
        let count = records.len();

        let mut loaded = self.loaded.write().await;
        loaded.records = Arc::new(records);
        loaded.at = Some(Utc::now());
        tracing::info!("Loaded {} records from {} source ({})", count, info.kind, info.description);
        Ok(count)
    }
}
