//! Insight test utilities.
//!
//! Builders for host-schema fixtures: each one knows the row it appears as
//! in a report, and the column values needed to insert it into a scratch
//! copy of the host tables.

use chrono::NaiveDateTime;
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// Fixed timestamp so fixtures compare equal across runs.
pub fn fixture_time() -> NaiveDateTime {
    chrono::DateTime::from_timestamp(1_700_000_000, 0)
        .unwrap_or_default()
        .naive_utc()
}

/// Create a content node with default values.
pub fn test_node(id: i32, alias: &str, name: &str) -> TestNode {
    TestNode {
        id,
        unique_id: Uuid::now_v7(),
        parent_id: -1,
        level: 1,
        trashed: false,
        name: name.to_string(),
        alias: alias.to_string(),
        icon: Some("icon-document".to_string()),
        create_date: fixture_time(),
        creator_id: -1,
        creator_name: "admin".to_string(),
        update_date: fixture_time(),
        updater_id: -1,
        updater_name: "admin".to_string(),
        language_ids: Vec::new(),
    }
}

/// A content node fixture.
#[derive(Debug, Clone)]
pub struct TestNode {
    pub id: i32,
    pub unique_id: Uuid,
    pub parent_id: i32,
    pub level: i32,
    pub trashed: bool,
    pub name: String,
    pub alias: String,
    pub icon: Option<String>,
    pub create_date: NaiveDateTime,
    pub creator_id: i32,
    pub creator_name: String,
    pub update_date: NaiveDateTime,
    pub updater_id: i32,
    pub updater_name: String,
    pub language_ids: Vec<i32>,
}

impl TestNode {
    /// Place under a parent, one level deeper.
    pub fn under(mut self, parent: &TestNode) -> Self {
        self.parent_id = parent.id;
        self.level = parent.level + 1;
        self
    }

    /// Move to the recycle bin.
    pub fn trashed(mut self) -> Self {
        self.trashed = true;
        self
    }

    pub fn created_by(mut self, id: i32, name: &str) -> Self {
        self.creator_id = id;
        self.creator_name = name.to_string();
        self
    }

    pub fn updated_by(mut self, id: i32, name: &str) -> Self {
        self.updater_id = id;
        self.updater_name = name.to_string();
        self
    }

    /// Give the node culture variants.
    pub fn with_languages(mut self, ids: &[i32]) -> Self {
        self.language_ids = ids.to_vec();
        self
    }

    /// The node as a content report row.
    pub fn content_row(&self) -> JsonValue {
        json!({
            "udi": self.unique_id,
            "id": self.id,
            "parent_id": self.parent_id,
            "level": self.level,
            "icon": self.icon,
            "trashed": self.trashed,
            "alias": self.alias,
            "name": self.name,
            "create_date": self.create_date,
            "creator_id": self.creator_id,
            "creator_name": self.creator_name,
            "update_date": self.update_date,
            "updater_id": self.updater_id,
            "updater_name": self.updater_name,
            "language_count": self.language_ids.len(),
        })
    }
}

/// Create a member with default values.
pub fn test_member(id: i32, login: &str) -> TestMember {
    TestMember {
        id,
        unique_id: Uuid::now_v7(),
        login: login.to_string(),
        name: login.to_string(),
        email: format!("{login}@example.com"),
        create_date: fixture_time(),
        group_ids: Vec::new(),
    }
}

/// A member fixture.
#[derive(Debug, Clone)]
pub struct TestMember {
    pub id: i32,
    pub unique_id: Uuid,
    pub login: String,
    pub name: String,
    pub email: String,
    pub create_date: NaiveDateTime,
    pub group_ids: Vec<i32>,
}

impl TestMember {
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn in_groups(mut self, ids: &[i32]) -> Self {
        self.group_ids = ids.to_vec();
        self
    }

    /// The member as a member report row.
    pub fn member_row(&self) -> JsonValue {
        json!({
            "id": self.id,
            "user_name": self.login,
            "name": self.name,
            "email": self.email,
            "create_date": self.create_date,
            "udi": self.unique_id,
        })
    }
}

/// Assertion helpers for report JSON.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a page body has the expected paging fields.
    pub fn page_shape(value: &Value, total: u64, items: usize) {
        assert_eq!(value["total"], total, "unexpected total in {value}");
        let len = value["items"].as_array().map(Vec::len);
        assert_eq!(len, Some(items), "unexpected item count in {value}");
    }
}
