use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::model::ProfileField;
use crate::submission::{
    build_metafields_set_variables, customer_gid, fields_to_write, ProfileUpdate,
    SubmissionError, SubmissionReceipt,
};

pub mod model;
pub mod pages;

pub use model::SegmentSummary;
pub use pages::ProfilePages;

use model::{GraphQlResponse, MetafieldsSetData, SegmentsData};

const METAFIELDS_SET_MUTATION: &str = r#"mutation PetProfileSet($metafields: [MetafieldsSetInput!]!) {
  metafieldsSet(metafields: $metafields) {
    metafields { key value }
    userErrors { field message }
  }
}"#;

const SEGMENTS_QUERY: &str = r#"query PetProfileSegments($first: Int!, $query: String) {
  segments(first: $first, query: $query) {
    nodes { id name }
  }
}"#;

/// Admin GraphQL API client for one shop.
#[derive(Clone)]
pub struct ShopifyClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
}

impl fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl ShopifyClient {
    pub fn new(shop: &str, token: String, version: String) -> Result<Self> {
        let shop = shop.trim().trim_end_matches('/');
        let base = if shop.starts_with("http://") || shop.starts_with("https://") {
            format!("{}/", shop)
        } else {
            format!("https://{}/", shop)
        };
        let base_url = Url::parse(&base).with_context(|| format!("invalid shop domain {shop}"))?;
        Self::with_base_url(token, version, base_url)
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            &cfg.shopify.shop,
            cfg.shopify.access_token.clone(),
            cfg.shopify.api_version.clone(),
        )
    }

    pub fn with_base_url(token: String, version: String, base_url: Url) -> Result<Self> {
        // No request timeout: a hung page request hangs the run.
        let http = Client::builder()
            .user_agent("pet-profiles/0.1")
            .no_proxy()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            token,
            version,
        })
    }

    pub fn build_request(&self, body: &Value) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("admin/api/{}/graphql.json", self.version))
            .context("invalid Shopify base URL")?;
        self.http
            .post(endpoint)
            .header("X-Shopify-Access-Token", &self.token)
            .header("Content-Type", "application/json")
            .json(body)
            .build()
            .context("failed to build Shopify request")
    }

    /// Run one GraphQL operation. Transport failures, non-2xx statuses and a
    /// non-empty `errors` array are all reported as errors.
    pub async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let body = json!({ "query": query, "variables": variables });
        let request = self.build_request(&body)?;
        debug!(url = %request.url(), variables = %body["variables"], "sending graphql request");

        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Shopify")?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let body = res.text().await.unwrap_or_default();
            warn!("rate limited by Shopify: {}", body);
            return Err(anyhow!("received 429 from Shopify: {}", body));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "Shopify API error: {}", body);
            return Err(anyhow!("shopify error {}: {}", status, body));
        }

        let payload: GraphQlResponse<T> = res.json().await.context("invalid Shopify response")?;
        if !payload.errors.is_empty() {
            let messages: Vec<&str> = payload.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(anyhow!("graphql error: {}", messages.join("; ")));
        }
        payload
            .data
            .ok_or_else(|| anyhow!("graphql response carried no data"))
    }

    #[instrument(skip(self))]
    pub async fn list_segments(&self, query: Option<&str>, first: usize) -> Result<Vec<SegmentSummary>> {
        let data: SegmentsData = self
            .graphql(SEGMENTS_QUERY, json!({ "first": first, "query": query }))
            .await
            .context("failed to list segments")?;
        Ok(data.segments.nodes)
    }

    /// Look up a segment id by its exact name.
    #[instrument(skip(self))]
    pub async fn find_segment_id(&self, name: &str) -> Result<String> {
        let query = segment_name_query(name);
        let segments = self.list_segments(Some(&query), 1).await?;
        segments
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| s.id)
            .ok_or_else(|| anyhow!("segment '{}' not found", name))
    }

    /// Write the profile as metafields on the customer. Only the first user
    /// error is reported on rejection.
    #[instrument(skip(self, update))]
    pub async fn set_profile(
        &self,
        namespace: &str,
        customer_id: &str,
        update: &ProfileUpdate,
    ) -> std::result::Result<SubmissionReceipt, SubmissionError> {
        let profile = update.sanitized();
        let written: Vec<ProfileField> = fields_to_write(&profile);
        if written.is_empty() {
            info!(customer_id, "no profile values to write");
            return Ok(SubmissionReceipt {
                customer_id: customer_id.to_string(),
                written,
            });
        }

        let variables = build_metafields_set_variables(namespace, customer_id, &profile);
        let data: MetafieldsSetData = self.graphql(METAFIELDS_SET_MUTATION, variables).await?;
        let payload = data.metafields_set.unwrap_or_default();

        if let Some(first) = payload.user_errors.into_iter().next() {
            let field = first
                .field
                .map(|path| path.join("."))
                .unwrap_or_else(|| "profile".to_string());
            warn!(customer_id, %field, message = %first.message, "profile submission rejected");
            return Err(SubmissionError::Rejected {
                field,
                message: first.message,
            });
        }

        info!(
            owner = %customer_gid(customer_id),
            written = written.len(),
            "profile submitted"
        );
        Ok(SubmissionReceipt {
            customer_id: customer_id.to_string(),
            written,
        })
    }
}

/// Search filter matching a segment name, quoted for the Admin API search syntax.
fn segment_name_query(name: &str) -> String {
    format!("name:'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
}
