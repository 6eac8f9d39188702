#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Report API tests against the real router over the in-memory store.

mod common;

use axum::http::StatusCode;
use axum::routing::get;
use common::{FakeNode, FakeResolver, MemoryStore, app, get as get_json, post, serve_local, template_rows};
use insight_kernel::report::schema::SERVER_TABLE;
use insight_test_utils::{assert, test_member, test_node};
use serde_json::json;

fn content_store(count: i32) -> MemoryStore {
    let rows = (1..=count)
        .map(|i| test_node(1000 + i, "textPage", &format!("Page {i}")).content_row())
        .collect();
    MemoryStore::new().with_rows("content", rows)
}

#[tokio::test]
async fn unsafe_order_by_is_rejected_before_any_query() {
    let store = content_store(3);
    let router = app(&store, FakeResolver::new());

    let (status, body) = get_json(&router, "/api/report/content?order=N.id%3B%20DROP%20TABLE%20umbracoNode").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not an allowed sort column"));

    let (status, _) = get_json(&router, "/api/report/members?order=password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&router, "/api/report/usage?dir=sideways").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(store.queries().is_empty());
    assert_eq!(store.scopes().0, 0);
}

#[tokio::test]
async fn non_positive_page_size_is_rejected() {
    let store = content_store(3);
    let router = app(&store, FakeResolver::new());

    let (status, _) = get_json(&router, "/api/report/content?per_page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&router, "/api/report/members?per_page=-3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(store.queries().is_empty());
}

#[tokio::test]
async fn content_page_body() {
    let store = content_store(25);
    let router = app(&store, FakeResolver::new());

    let (status, body) = get_json(&router, "/api/report/content?page=2&per_page=10&order=name&dir=desc").await;
    assert_eq!(status, StatusCode::OK);
    assert::page_shape(&body, 25, 10);
    assert_eq!(body["page"], 2);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["has_prev"], true);
    assert_eq!(body["items"][0]["id"], 1011);
    assert_eq!(body["items"][0]["alias"], "textPage");

    let (status, body) = get_json(&router, "/api/report/content?page=7&per_page=10").await;
    assert_eq!(status, StatusCode::OK);
    assert::page_shape(&body, 25, 0);
}

#[tokio::test]
async fn malformed_filters_place_no_constraint() {
    let store = content_store(1);
    let router = app(&store, FakeResolver::new());

    let (status, _) = get_json(&router, "/api/report/content?level=two&trashed=maybe&creator=&alias=textPage").await;
    assert_eq!(status, StatusCode::OK);

    let fetch = &store.queries()[1];
    assert!(fetch.sql.contains("\"CT\".\"alias\" = $"), "{}", fetch.sql);
    assert!(!fetch.sql.contains("\"N\".\"level\" = $"), "{}", fetch.sql);
    assert!(!fetch.sql.contains("\"N\".\"trashed\" = $"), "{}", fetch.sql);
}

#[tokio::test]
async fn members_endpoint() {
    let store = MemoryStore::new().with_rows(
        "members",
        vec![test_member(2001, "jsmith").named("Jane Smith").member_row()],
    );
    let router = app(&store, FakeResolver::new());

    let (status, body) = get_json(&router, "/api/report/members?group=5&search=smith&order=email").await;
    assert_eq!(status, StatusCode::OK);
    assert::page_shape(&body, 1, 1);
    assert_eq!(body["items"][0]["user_name"], "jsmith");
}

#[tokio::test]
async fn optional_tables_answer_null_when_absent() {
    let store = MemoryStore::new();
    let router = app(&store, FakeResolver::new());

    let (status, body) = get_json(&router, "/api/report/servers").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, body) = get_json(&router, "/api/report/key-values").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let store = MemoryStore::new().with_table(SERVER_TABLE);
    let router = app(&store, FakeResolver::new());
    let (status, body) = get_json(&router, "/api/report/servers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn list_endpoints() {
    let store = MemoryStore::new()
        .with_rows("languages", vec![json!({"id": 1, "name": "en-US"})])
        .with_rows("member_groups", vec![json!({"id": 7, "name": "Editors"})])
        .with_rows("content_type_aliases", vec![json!({"alias": "home"})])
        .with_rows(
            "usage",
            vec![json!({"id": 1, "node_count": 3, "description": null, "alias": "home",
                        "icon": null, "guid_type": null})],
        );
    let router = app(&store, FakeResolver::new());

    let (_, body) = get_json(&router, "/api/report/languages").await;
    assert_eq!(body, json!([{"id": 1, "name": "en-US"}]));

    let (_, body) = get_json(&router, "/api/report/member-groups").await;
    assert_eq!(body[0]["name"], "Editors");

    let (_, body) = get_json(&router, "/api/report/content-types").await;
    assert_eq!(body, json!(["home"]));

    let (status, body) = get_json(&router, "/api/report/usage?id=1&order=count&dir=desc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["type"], "");
    assert_eq!(body[0]["node_count"], 3);

    let (_, body) = get_json(&router, "/api/report/database").await;
    assert_eq!(body, json!({"type": "memory"}));
}

#[tokio::test]
async fn store_failure_is_service_unavailable() {
    let store = content_store(1).failing();
    let router = app(&store, FakeResolver::new());

    let (status, body) = get_json(&router, "/api/report/content").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "backend unavailable"}));

    let (status, body) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn health_ok() {
    let store = MemoryStore::new();
    let router = app(&store, FakeResolver::new());

    let (status, body) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "memory");
}

#[tokio::test]
async fn template_urls_endpoint() {
    let store = MemoryStore::new().with_rows("template_nodes", template_rows(&[1051, 1060, 1102]));
    let resolver = FakeResolver::new()
        .url(1051, "https://site.test/")
        .node(1060, FakeNode::LookupFails)
        .url(1102, "https://site.test/blog/");
    let router = app(&store, resolver);

    let (status, body) = get_json(&router, "/api/report/template-urls").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["https://site.test/", "https://site.test/blog/"]));
}

#[tokio::test]
async fn warmup_endpoint_pings_each_url() {
    let site = axum::Router::new()
        .route("/", get(|| async { "home" }))
        .route("/gone", get(|| async { StatusCode::NOT_FOUND }));
    let base = serve_local(site).await;

    let store = MemoryStore::new().with_rows("template_nodes", template_rows(&[1, 2, 3]));
    let resolver = FakeResolver::new()
        .url(1, &format!("{base}/"))
        .node(2, FakeNode::Missing)
        .url(3, &format!("{base}/gone"));
    let router = app(&store, resolver);

    let (status, body) = post(&router, "/api/report/warmup").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["succeeded"], 1);
    assert_eq!(body["outcomes"][0]["status"], 200);
    assert_eq!(body["outcomes"][1]["status"], 404);
}
