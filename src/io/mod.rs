//! Workbook ingestion: locating the source, fetching bytes, parsing sheets and
//! memoising the parsed result.

pub mod cache;
pub mod excel_read;
pub mod excel_write;
pub mod header;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::error::LoadError;
use crate::model::{Sheet, Table, Workbook};

pub use cache::{CacheKey, WorkbookCache};
pub use excel_read::SheetSelector;
pub use source::{DataSource, LastUpdate, RemoteFetcher, ResolvedSource};

/// Loads workbooks from local or remote sources through a [`WorkbookCache`].
pub struct WorkbookLoader {
    fetcher: RemoteFetcher,
    cache: WorkbookCache,
}

impl WorkbookLoader {
    pub fn new(fetch_timeout: Duration, cache_ttl: Duration) -> Self {
        Self::with_parts(RemoteFetcher::new(fetch_timeout), WorkbookCache::new(cache_ttl))
    }

    pub fn with_parts(fetcher: RemoteFetcher, cache: WorkbookCache) -> Self {
        Self { fetcher, cache }
    }

    pub fn fetcher(&self) -> &RemoteFetcher {
        &self.fetcher
    }

    pub fn cache(&self) -> &WorkbookCache {
        &self.cache
    }

    /// Loads one sheet with its header on the first row.
    #[instrument(level = "info", skip(self, source, selector), fields(selector = %selector))]
    pub fn load_sheet(
        &mut self,
        source: &DataSource,
        selector: &SheetSelector,
    ) -> Result<Table, LoadError> {
        let resolved = source.resolve()?;
        let key = CacheKey::new(resolved.identifier(), format!("sheet:{selector}"));
        let fetcher = &self.fetcher;
        let workbook = self.cache.get_or_try_insert(key, || {
            let bytes = source::read_bytes(&resolved, fetcher)?;
            let table = excel_read::read_sheet(&bytes, selector)?;
            info!(
                source = %resolved.identifier(),
                rows = table.len(),
                columns = table.columns.len(),
                "sheet loaded"
            );
            Ok::<_, LoadError>(Workbook {
                sheets: vec![Sheet {
                    name: selector.to_string(),
                    table,
                }],
            })
        })?;
        Ok(workbook.first().cloned().unwrap_or_default())
    }

    /// Loads every sheet of the workbook from a single read of the source.
    #[instrument(level = "info", skip_all)]
    pub fn load_all_sheets(&mut self, source: &DataSource) -> Result<Arc<Workbook>, LoadError> {
        let resolved = source.resolve()?;
        let key = CacheKey::new(resolved.identifier(), "all");
        let fetcher = &self.fetcher;
        self.cache.get_or_try_insert(key, || {
            let bytes = source::read_bytes(&resolved, fetcher)?;
            let workbook = excel_read::read_all_sheets(&bytes)?;
            info!(
                source = %resolved.identifier(),
                sheets = workbook.sheets.len(),
                "workbook loaded"
            );
            Ok::<_, LoadError>(workbook)
        })
    }

    /// Forgets everything cached for either location of `source`.
    pub fn invalidate(&mut self, source: &DataSource) -> usize {
        let mut removed = 0;
        if let Some(path) = &source.local_path {
            removed += self.cache.invalidate_source(&path.display().to_string());
        }
        if let Some(url) = &source.remote_url {
            removed += self.cache.invalidate_source(url);
        }
        removed
    }

    pub fn last_update(&self, source: &DataSource) -> LastUpdate {
        source::last_update(source, &self.fetcher)
    }
}
