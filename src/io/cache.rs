use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::model::Workbook;

/// Cache key: the source identifier and the sheet selector/header mode that
/// shaped the parsed result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: String,
    pub selector: String,
}

impl CacheKey {
    pub fn new(source: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            selector: selector.into(),
        }
    }
}

struct Entry {
    stored_at: Instant,
    workbook: Arc<Workbook>,
}

/// Time-bounded memo of parsed workbooks. Only successful loads are stored.
pub struct WorkbookCache {
    ttl: Duration,
    entries: HashMap<CacheKey, Entry>,
}

impl WorkbookCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a live entry; expired entries are evicted on access.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<Workbook>> {
        let fresh = self
            .entries
            .get(key)
            .map(|entry| entry.stored_at.elapsed() < self.ttl)?;
        if fresh {
            debug!(source = %key.source, selector = %key.selector, "cache hit");
            self.entries.get(key).map(|entry| Arc::clone(&entry.workbook))
        } else {
            debug!(source = %key.source, selector = %key.selector, "cache entry expired");
            self.entries.remove(key);
            None
        }
    }

    pub fn insert(&mut self, key: CacheKey, workbook: Arc<Workbook>) {
        self.entries.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                workbook,
            },
        );
    }

    /// Returns the cached workbook or runs `load` and stores its success.
    pub fn get_or_try_insert<E, F>(&mut self, key: CacheKey, load: F) -> Result<Arc<Workbook>, E>
    where
        F: FnOnce() -> Result<Workbook, E>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let workbook = Arc::new(load()?);
        self.insert(key, Arc::clone(&workbook));
        Ok(workbook)
    }

    /// Drops every entry loaded from `source`, whatever the selector.
    pub fn invalidate_source(&mut self, source: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.source != source);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
