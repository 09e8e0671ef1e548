//! Capped, cursor-following collection of customer records.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::assemble::{assemble, RawEntry};
use crate::model::{CollectionResult, PaginationInfo};

/// Largest page the Admin API accepts.
pub const MAX_PAGE_SIZE: usize = 250;
pub const DEFAULT_CAP: usize = 1000;
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const PAGE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawPage {
    pub entries: Vec<RawEntry>,
    pub has_more: bool,
    pub end_cursor: Option<String>,
    pub total_count: Option<u64>,
}

/// A cursor-paginated remote collection.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<RawPage>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    /// `None` collects until the remote runs out of pages.
    pub cap: Option<usize>,
    pub page_size: usize,
    pub page_delay: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            cap: Some(DEFAULT_CAP),
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: PAGE_DELAY,
        }
    }
}

/// Fetch pages until the remote reports no more pages or the cap is reached.
///
/// Any page failure aborts the run: everything collected so far is discarded
/// and the failure is returned in [`CollectionResult::error`]. Requests have no
/// timeout and are never retried.
#[instrument(skip_all, fields(cap = ?settings.cap, page_size = settings.page_size))]
pub async fn collect<S>(source: &S, settings: &CollectorSettings) -> CollectionResult
where
    S: PageSource + ?Sized,
{
    let cap = settings.cap.unwrap_or(usize::MAX);
    let page_size = settings.page_size.min(MAX_PAGE_SIZE);
    if page_size != settings.page_size {
        debug!(requested = settings.page_size, page_size, "clamped page size");
    }

    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut fetched = 0usize;
    let mut has_next = true;
    let mut page_no = 0usize;

    while has_next && fetched < cap {
        let size = page_size.min(cap - fetched);
        if size == 0 {
            break;
        }
        page_no += 1;

        let request = PageRequest {
            size,
            cursor: cursor.clone(),
        };
        let mut page = match source.fetch_page(request).await {
            Ok(page) => page,
            Err(err) => {
                warn!(?err, page = page_no, fetched, "page fetch failed; aborting collection");
                return CollectionResult::failed(format!("{:#}", err), settings.cap);
            }
        };

        // entries are only dropped where the run ends, at the cap
        let room = cap - fetched;
        if page.entries.len() > room {
            debug!(received = page.entries.len(), room, "truncating page at cap");
            page.entries.truncate(room);
        }
        let count = page.entries.len();
        records.extend(page.entries.iter().map(assemble));
        fetched += count;
        has_next = page.has_more;
        debug!(
            page = page_no,
            count,
            fetched,
            has_next,
            remote_total = ?page.total_count,
            "collected page"
        );

        match page.end_cursor {
            Some(next) => cursor = Some(next),
            None if has_next => {
                warn!(page = page_no, "remote reported more pages without a cursor; stopping");
                break;
            }
            None => {}
        }

        if has_next && fetched < cap {
            tokio::time::sleep(settings.page_delay).await;
        }
    }

    info!(fetched, has_more = has_next, pages = page_no, "collection finished");
    CollectionResult {
        records,
        total_count: fetched,
        error: None,
        pagination_info: PaginationInfo {
            has_more: has_next,
            total_fetched: fetched,
            cap: settings.cap,
        },
    }
}
