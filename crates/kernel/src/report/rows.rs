//! Report records and row mappers.
//!
//! The store hands back each row as a JSON object whose keys are the column
//! aliases chosen in `query_builder`. The mappers here turn those objects into
//! typed records; they hold no state and touch nothing but the row.

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::schema::object_types;
use crate::error::ReportResult;

/// A content node with its current version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
    /// Platform-wide unique id.
    pub udi: Uuid,
    pub id: i32,
    pub parent_id: i32,
    pub level: i32,
    pub icon: Option<String>,
    pub trashed: bool,
    pub alias: String,
    pub name: Option<String>,
    pub create_date: NaiveDateTime,
    pub creator_id: i32,
    pub creator_name: Option<String>,
    pub update_date: NaiveDateTime,
    pub updater_id: i32,
    pub updater_name: Option<String>,
    /// Number of culture variants the node has.
    pub language_count: i64,
}

/// Usage row as read from the store, before the category is derived.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageRecord {
    pub id: i32,
    pub node_count: i64,
    pub description: Option<String>,
    pub alias: String,
    pub icon: Option<String>,
    /// Object type of the content type's own node. Null when that node is gone.
    pub guid_type: Option<Uuid>,
}

/// Which kind of type a usage row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageCategory {
    Content,
    Media,
    Members,
    Unknown,
}

impl UsageCategory {
    /// Derive the category from a node object type.
    pub fn from_object_type(guid: Option<Uuid>) -> Self {
        match guid {
            Some(g) if g == object_types::DOCUMENT_TYPE => UsageCategory::Content,
            Some(g) if g == object_types::MEDIA_TYPE => UsageCategory::Media,
            Some(g) if g == object_types::MEMBER_TYPE => UsageCategory::Members,
            _ => UsageCategory::Unknown,
        }
    }

    /// Display label; empty for anything unrecognised.
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageCategory::Content => "Content",
            UsageCategory::Media => "Media",
            UsageCategory::Members => "Members",
            UsageCategory::Unknown => "",
        }
    }
}

impl Serialize for UsageCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How many instances of a content type exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    pub id: i32,
    pub node_count: i64,
    pub description: Option<String>,
    pub alias: String,
    pub icon: Option<String>,
    pub guid_type: Option<Uuid>,
    #[serde(rename = "type")]
    pub category: UsageCategory,
}

impl From<UsageRecord> for UsageRow {
    fn from(record: UsageRecord) -> Self {
        Self {
            category: UsageCategory::from_object_type(record.guid_type),
            id: record.id,
            node_count: record.node_count,
            description: record.description,
            alias: record.alias,
            icon: record.icon,
            guid_type: record.guid_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRow {
    pub id: i32,
    pub user_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub create_date: NaiveDateTime,
    pub udi: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberGroupRow {
    pub id: i32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageRow {
    pub id: i32,
    pub name: Option<String>,
}

/// A registered server in a load-balanced host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRow {
    pub id: i32,
    pub address: String,
    pub computer_name: String,
    pub registered_date: NaiveDateTime,
    pub last_notified_date: NaiveDateTime,
    pub is_active: bool,
    pub is_master: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValueRow {
    pub key: String,
    pub value: Option<String>,
    pub updated: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
struct AliasRecord {
    alias: String,
}

#[derive(Debug, Clone, Deserialize)]
struct NodeIdRecord {
    node_id: i32,
}

/// Map raw rows into typed records.
pub fn map_rows<T: DeserializeOwned>(rows: Vec<JsonValue>) -> ReportResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

/// Map usage rows, deriving each row's category.
pub fn map_usage_rows(rows: Vec<JsonValue>) -> ReportResult<Vec<UsageRow>> {
    Ok(map_rows::<UsageRecord>(rows)?
        .into_iter()
        .map(UsageRow::from)
        .collect())
}

/// Map single-column alias rows.
pub fn map_aliases(rows: Vec<JsonValue>) -> ReportResult<Vec<String>> {
    Ok(map_rows::<AliasRecord>(rows)?
        .into_iter()
        .map(|r| r.alias)
        .collect())
}

/// Map single-column node id rows.
pub fn map_node_ids(rows: Vec<JsonValue>) -> ReportResult<Vec<i32>> {
    Ok(map_rows::<NodeIdRecord>(rows)?
        .into_iter()
        .map(|r| r.node_id)
        .collect())
}
