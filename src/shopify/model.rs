use serde::{Deserialize, Serialize};

use crate::assemble::RawEntry;

#[derive(Deserialize, Debug)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CustomersData {
    pub customers: CustomerConnection,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CustomerConnection {
    #[serde(default)]
    pub nodes: Vec<RawEntry>,
    #[serde(default)]
    pub page_info: PageInfo,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMembersData {
    pub customer_segment_members: SegmentMemberConnection,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMemberConnection {
    pub total_count: Option<u64>,
    #[serde(default)]
    pub edges: Vec<SegmentMemberEdge>,
    #[serde(default)]
    pub page_info: PageInfo,
}

#[derive(Deserialize, Debug)]
pub struct SegmentMemberEdge {
    pub node: RawEntry,
}

#[derive(Deserialize, Debug)]
pub struct SegmentsData {
    pub segments: SegmentConnection,
}

#[derive(Deserialize, Debug)]
pub struct SegmentConnection {
    #[serde(default)]
    pub nodes: Vec<SegmentSummary>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SegmentSummary {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MetafieldsSetData {
    pub metafields_set: Option<MetafieldsSetPayload>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetafieldsSetPayload {
    #[serde(default)]
    pub metafields: Option<Vec<WrittenMetafield>>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WrittenMetafield {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}
