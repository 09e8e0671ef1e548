//! Remote page sources: the shop's customer list or a customer segment.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::info;

use super::model::{CustomersData, SegmentMembersData};
use super::ShopifyClient;
use crate::collector::{PageRequest, PageSource, RawPage};
use crate::config::{Config, Source};
use crate::model::ProfileField;

/// Aliased metafield lookups, one per profile attribute.
fn metafield_selection() -> String {
    ProfileField::ALL
        .iter()
        .map(|f| {
            format!(
                "      {key}: metafield(namespace: $namespace, key: \"{key}\") {{ value }}\n",
                key = f.key()
            )
        })
        .collect()
}

static CUSTOMERS_QUERY: Lazy<String> = Lazy::new(|| {
    format!(
        r#"query PetProfileCustomers($first: Int!, $after: String, $query: String, $namespace: String!) {{
  customers(first: $first, after: $after, query: $query) {{
    nodes {{
      id
      displayName
      firstName
      lastName
      email
      verifiedEmail
      numberOfOrders
      createdAt
      updatedAt
{fields}    }}
    pageInfo {{ hasNextPage endCursor }}
  }}
}}"#,
        fields = metafield_selection()
    )
});

static SEGMENT_MEMBERS_QUERY: Lazy<String> = Lazy::new(|| {
    format!(
        r#"query PetProfileSegmentMembers($first: Int!, $after: String, $segmentId: ID!, $namespace: String!) {{
  customerSegmentMembers(first: $first, after: $after, segmentId: $segmentId) {{
    totalCount
    edges {{
      node {{
        id
        displayName
        firstName
        lastName
        defaultEmailAddress {{ emailAddress }}
        numberOfOrders
{fields}      }}
    }}
    pageInfo {{ hasNextPage endCursor }}
  }}
}}"#,
        fields = metafield_selection()
    )
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Customers { query: Option<String> },
    SegmentId(String),
    SegmentName(String),
}

impl Target {
    pub fn from_source(source: &Source) -> Self {
        match source {
            Source::Customers { query } => Target::Customers {
                query: query.clone().filter(|q| !q.trim().is_empty()),
            },
            Source::Segment { id: Some(id), .. } if !id.trim().is_empty() => {
                Target::SegmentId(segment_gid(id))
            }
            Source::Segment { name, .. } => {
                Target::SegmentName(name.clone().unwrap_or_default().trim().to_string())
            }
        }
    }
}

pub fn segment_gid(id: &str) -> String {
    let id = id.trim();
    if id.starts_with("gid://") {
        id.to_string()
    } else {
        format!("gid://shopify/Segment/{}", id)
    }
}

/// Pages of customers carrying the pet profile metafields.
#[derive(Debug)]
pub struct ProfilePages {
    client: ShopifyClient,
    namespace: String,
    target: Target,
    segment_id: OnceCell<String>,
}

impl ProfilePages {
    pub fn new(client: ShopifyClient, namespace: impl Into<String>, target: Target) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            target,
            segment_id: OnceCell::new(),
        }
    }

    pub fn from_config(client: ShopifyClient, cfg: &Config) -> Self {
        Self::new(
            client,
            cfg.shopify.metafield_namespace.clone(),
            Target::from_source(&cfg.collector.source),
        )
    }

    async fn resolved_segment(&self, name: &str) -> Result<&str> {
        let id = self
            .segment_id
            .get_or_try_init(|| async move {
                let id = self.client.find_segment_id(name).await?;
                info!(segment = name, %id, "resolved segment");
                Ok::<_, anyhow::Error>(id)
            })
            .await?;
        Ok(id.as_str())
    }

    async fn fetch_customers(&self, request: PageRequest, query: Option<&str>) -> Result<RawPage> {
        let data: CustomersData = self
            .client
            .graphql(
                &CUSTOMERS_QUERY,
                json!({
                    "first": request.size,
                    "after": request.cursor,
                    "query": query,
                    "namespace": self.namespace,
                }),
            )
            .await
            .context("customers query failed")?;
        let conn = data.customers;
        Ok(RawPage {
            entries: conn.nodes,
            has_more: conn.page_info.has_next_page,
            end_cursor: conn.page_info.end_cursor,
            total_count: None,
        })
    }

    async fn fetch_segment(&self, request: PageRequest, segment_id: &str) -> Result<RawPage> {
        let data: SegmentMembersData = self
            .client
            .graphql(
                &SEGMENT_MEMBERS_QUERY,
                json!({
                    "first": request.size,
                    "after": request.cursor,
                    "segmentId": segment_id,
                    "namespace": self.namespace,
                }),
            )
            .await
            .context("segment members query failed")?;
        let conn = data.customer_segment_members;
        Ok(RawPage {
            entries: conn.edges.into_iter().map(|e| e.node).collect(),
            has_more: conn.page_info.has_next_page,
            end_cursor: conn.page_info.end_cursor,
            total_count: conn.total_count,
        })
    }
}

#[async_trait]
impl PageSource for ProfilePages {
    async fn fetch_page(&self, request: PageRequest) -> Result<RawPage> {
        match &self.target {
            Target::Customers { query } => self.fetch_customers(request, query.as_deref()).await,
            Target::SegmentId(id) => self.fetch_segment(request, id).await,
            Target::SegmentName(name) => {
                let id = self.resolved_segment(name).await?.to_string();
                self.fetch_segment(request, &id).await
            }
        }
    }
}
