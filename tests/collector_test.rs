use anyhow::{anyhow, Result};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use pet_profiles::aggregate::aggregate;
use pet_profiles::assemble::RawEntry;
use pet_profiles::collector::{collect, CollectorSettings, PageRequest, PageSource, RawPage};
use pet_profiles::completeness::{is_complete, score};
use pet_profiles::model::ProfileField;

fn customer(n: usize) -> RawEntry {
    serde_json::from_value(json!({
        "id": format!("gid://shopify/Customer/{}", n),
        "displayName": format!("Customer {}", n),
        "email": format!("c{}@example.com", n),
        "pet_type": { "value": "Dog" },
    }))
    .unwrap()
}

/// In-memory remote collection paged by offset cursors.
#[derive(Clone, Default)]
struct SimulatedShop {
    entries: Vec<RawEntry>,
    /// Largest page the remote returns regardless of the requested size.
    page_limit: usize,
    /// 1-based page that reports no further pages.
    last_page: Option<usize>,
    /// 1-based page that fails.
    fail_on_page: Option<usize>,
    /// 1-based page that reports more pages but carries no cursor.
    cursorless_page: Option<usize>,
    /// Always return `page_limit` entries, whatever size was requested.
    ignores_size: bool,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl SimulatedShop {
    fn with_entries(count: usize, page_limit: usize) -> Self {
        Self {
            entries: (1..=count).map(customer).collect(),
            page_limit,
            ..Default::default()
        }
    }

    async fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl PageSource for SimulatedShop {
    async fn fetch_page(&self, request: PageRequest) -> Result<RawPage> {
        let page_no = {
            let mut guard = self.requests.lock().await;
            guard.push(request.clone());
            guard.len()
        };
        if self.fail_on_page == Some(page_no) {
            return Err(anyhow!("Throttled"));
        }

        let offset: usize = request
            .cursor
            .as_deref()
            .map(|c| c.parse().unwrap())
            .unwrap_or(0);
        let take = if self.ignores_size {
            self.page_limit
        } else {
            request.size.min(self.page_limit)
        };
        let end = (offset + take).min(self.entries.len());
        let has_more = end < self.entries.len() && self.last_page != Some(page_no);
        let end_cursor = (self.cursorless_page != Some(page_no)).then(|| end.to_string());
        Ok(RawPage {
            entries: self.entries[offset..end].to_vec(),
            has_more,
            end_cursor,
            total_count: Some(self.entries.len() as u64),
        })
    }
}

fn settings(cap: Option<usize>, page_size: usize) -> CollectorSettings {
    CollectorSettings {
        cap,
        page_size,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn cap_stops_collection_with_more_pages_available() {
    let shop = SimulatedShop::with_entries(1000, 100);
    let started = tokio::time::Instant::now();

    let result = collect(&shop, &settings(Some(250), 100)).await;

    assert!(result.error.is_none());
    assert_eq!(result.records.len(), 250);
    assert_eq!(result.total_count, 250);
    assert!(result.pagination_info.has_more);
    assert_eq!(result.pagination_info.total_fetched, 250);
    assert_eq!(result.pagination_info.cap, Some(250));

    let sizes: Vec<usize> = shop.requests().await.iter().map(|r| r.size).collect();
    assert_eq!(sizes, vec![100, 100, 50]);

    // one fixed delay between each pair of pages, none after the last
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn cursor_is_threaded_through_pages() {
    let shop = SimulatedShop::with_entries(250, 100);
    let result = collect(&shop, &settings(None, 100)).await;

    assert_eq!(result.total_count, 250);
    assert!(!result.pagination_info.has_more);
    assert_eq!(result.pagination_info.cap, None);
    let cursors: Vec<Option<String>> = shop.requests().await.into_iter().map(|r| r.cursor).collect();
    assert_eq!(
        cursors,
        vec![None, Some("100".to_string()), Some("200".to_string())]
    );
    assert_eq!(result.records[0].id, "1");
    assert_eq!(result.records[249].id, "250");
}

#[tokio::test(start_paused = true)]
async fn remote_end_of_pages_wins_over_cap() {
    let shop = SimulatedShop {
        last_page: Some(3),
        ..SimulatedShop::with_entries(1000, 100)
    };
    let result = collect(&shop, &settings(Some(1000), 100)).await;

    assert!(result.error.is_none());
    assert_eq!(result.records.len(), 300);
    assert!(!result.pagination_info.has_more);
    assert_eq!(shop.requests().await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn page_failure_aborts_run() {
    let shop = SimulatedShop {
        fail_on_page: Some(2),
        ..SimulatedShop::with_entries(1000, 100)
    };
    let result = collect(&shop, &settings(Some(1000), 100)).await;

    assert_eq!(result.error.as_deref(), Some("Throttled"));
    assert!(!result.pagination_info.has_more);
    assert!(result.records.is_empty());
    assert_eq!(result.total_count, 0);
    assert_eq!(shop.requests().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_cap_makes_no_request() {
    let shop = SimulatedShop::with_entries(10, 100);
    let result = collect(&shop, &settings(Some(0), 100)).await;

    assert!(result.error.is_none());
    assert!(result.records.is_empty());
    assert_eq!(result.total_count, 0);
    assert!(result.pagination_info.has_more);
    assert_eq!(result.pagination_info.total_fetched, 0);
    assert_eq!(result.pagination_info.cap, Some(0));
    assert!(shop.requests().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn more_pages_without_cursor_ends_run_cleanly() {
    let shop = SimulatedShop {
        cursorless_page: Some(2),
        ..SimulatedShop::with_entries(100, 10)
    };
    let result = collect(&shop, &settings(Some(1000), 10)).await;

    assert!(result.error.is_none());
    assert_eq!(result.total_count, 20);
    assert_eq!(result.records[19].id, "20");
    assert!(result.pagination_info.has_more);
    assert_eq!(result.pagination_info.total_fetched, 20);
    assert_eq!(shop.requests().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn page_size_is_clamped_to_api_ceiling() {
    let shop = SimulatedShop::with_entries(600, 1000);
    let result = collect(&shop, &settings(Some(600), 1000)).await;

    assert!(result.error.is_none());
    assert_eq!(result.total_count, 600);
    let sizes: Vec<usize> = shop.requests().await.iter().map(|r| r.size).collect();
    assert_eq!(sizes, vec![250, 250, 100]);
}

#[derive(Clone)]
struct OversizedPages;

#[async_trait::async_trait]
impl PageSource for OversizedPages {
    async fn fetch_page(&self, _request: PageRequest) -> Result<RawPage> {
        Ok(RawPage {
            entries: (1..=50).map(customer).collect(),
            has_more: true,
            end_cursor: Some("next".into()),
            total_count: None,
        })
    }
}

#[tokio::test(start_paused = true)]
async fn oversized_page_is_cut_at_cap() {
    let result = collect(&OversizedPages, &settings(Some(30), 10)).await;
    assert_eq!(result.records.len(), 30);
    assert_eq!(result.total_count, 30);
    assert_eq!(result.pagination_info.total_fetched, 30);
    assert!(result.pagination_info.has_more);
    let ids: Vec<String> = (1..=30).map(|n| n.to_string()).collect();
    assert_eq!(result.records.iter().map(|r| r.id.clone()).collect::<Vec<_>>(), ids);
}

#[tokio::test(start_paused = true)]
async fn pages_larger_than_requested_are_kept_whole() {
    let shop = SimulatedShop {
        ignores_size: true,
        ..SimulatedShop::with_entries(100, 15)
    };
    let result = collect(&shop, &settings(Some(30), 10)).await;

    assert!(result.error.is_none());
    assert_eq!(result.total_count, 30);
    assert!(result.pagination_info.has_more);
    let ids: Vec<String> = result.records.iter().map(|r| r.id.clone()).collect();
    let expected: Vec<String> = (1..=30).map(|n| n.to_string()).collect();
    assert_eq!(ids, expected);

    let requests = shop.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].cursor.as_deref(), Some("15"));
}

#[tokio::test(start_paused = true)]
async fn null_profiles_assemble_to_empty_attributes() {
    let raw = |v: serde_json::Value| -> RawEntry { serde_json::from_value(v).unwrap() };
    let shop = SimulatedShop {
        entries: vec![
            raw(json!({
                "id": "gid://shopify/Customer/1",
                "email": "one@example.com",
                "pet_type": { "value": "Dog" },
                "stress_level": { "value": "Low" },
                "drug_usage": { "value": "None" },
                "pet_age": { "value": "1-6" },
                "pet_weight": { "value": "0-10 lbs" }
            })),
            raw(json!({
                "id": "gid://shopify/Customer/2",
                "email": "two@example.com",
                "pet_type": null,
                "stress_level": null,
                "drug_usage": null,
                "pet_age": null,
                "pet_weight": null
            })),
            raw(json!({
                "id": "gid://shopify/Customer/3",
                "email": "three@example.com",
                "pet_type": { "value": "Cat" },
                "drug_usage": { "value": "seasonal allergies" }
            })),
            raw(json!({
                "id": "gid://shopify/Customer/4",
                "pet_age": { "value": 9 }
            })),
        ],
        page_limit: 2,
        ..Default::default()
    };

    let result = collect(&shop, &settings(Some(1000), 2)).await;
    assert!(result.error.is_none());
    assert_eq!(result.total_count, 4);

    let second = &result.records[1];
    assert_eq!(second.id, "2");
    for field in ProfileField::ALL {
        assert_eq!(second.profile.get(field), "");
    }
    assert_eq!(score(second), 0);
    assert!(!is_complete(second));
    assert!(is_complete(&result.records[0]));

    // malformed record is kept, with its bad attribute blanked
    assert_eq!(result.records[3].id, "4");
    assert_eq!(result.records[3].profile.pet_age, "");

    let with_second = aggregate(&result.records);
    let without_second = aggregate(&[
        result.records[0].clone(),
        result.records[2].clone(),
        result.records[3].clone(),
    ]);
    assert_eq!(with_second, without_second);
}
