//! Report API routes.
//!
//! JSON endpoints over the reporting service. Query parameters are read
//! leniently: a filter that fails to parse places no constraint. Page sizes
//! below one and sort columns outside the allow-list are rejected before any
//! query runs.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::ReportResult;
use crate::report::{
    ContentCriteria, ContentRow, ContentSort, KeyValueRow, LanguageRow, MemberCriteria,
    MemberGroupRow, MemberRow, MemberSort, PageRequest, PageResult, PingOutcome, ServerRow,
    SortOrder, UsageRow, UsageSort,
};
use crate::state::AppState;

/// Page size when the caller does not give one.
const DEFAULT_PER_PAGE: i64 = 20;

/// Create the report router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/report/content", get(content))
        .route("/api/report/content-types", get(content_types))
        .route("/api/report/usage", get(usage))
        .route("/api/report/members", get(members))
        .route("/api/report/member-groups", get(member_groups))
        .route("/api/report/languages", get(languages))
        .route("/api/report/servers", get(servers))
        .route("/api/report/key-values", get(key_values))
        .route("/api/report/template-urls", get(template_urls))
        .route("/api/report/warmup", post(warmup))
        .route("/api/report/database", get(database))
}

type Params = Query<HashMap<String, String>>;

#[derive(Serialize)]
struct DatabaseResponse {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct WarmupResponse {
    total: usize,
    succeeded: usize,
    outcomes: Vec<PingOutcome>,
}

fn page_request(params: &HashMap<String, String>) -> ReportResult<PageRequest> {
    let number = |key: &str| params.get(key).and_then(|v| v.trim().parse::<i64>().ok());
    PageRequest::new(
        number("page").unwrap_or(1),
        number("per_page").unwrap_or(DEFAULT_PER_PAGE),
    )
}

fn sort_order<S>(params: &HashMap<String, String>) -> ReportResult<SortOrder<S>>
where
    S: std::str::FromStr<Err = crate::error::ReportError> + Default,
{
    SortOrder::parse(
        params.get("order").map(String::as_str),
        params.get("dir").map(String::as_str),
    )
}

async fn content(
    State(state): State<AppState>,
    Query(params): Params,
) -> ReportResult<Json<PageResult<ContentRow>>> {
    let page = page_request(&params)?;
    let order = sort_order::<ContentSort>(&params)?;
    let criteria = ContentCriteria::from_params(&params);

    let result = state.reports().content(&criteria, page, order).await?;
    Ok(Json(result))
}

async fn content_types(State(state): State<AppState>) -> ReportResult<Json<Vec<String>>> {
    Ok(Json(state.reports().content_type_aliases().await?))
}

async fn usage(
    State(state): State<AppState>,
    Query(params): Params,
) -> ReportResult<Json<Vec<UsageRow>>> {
    let order = sort_order::<UsageSort>(&params)?;
    let type_id = params.get("id").and_then(|v| v.trim().parse().ok());

    Ok(Json(state.reports().content_usage(type_id, order).await?))
}

async fn members(
    State(state): State<AppState>,
    Query(params): Params,
) -> ReportResult<Json<PageResult<MemberRow>>> {
    let page = page_request(&params)?;
    let order = sort_order::<MemberSort>(&params)?;
    let criteria = MemberCriteria::from_params(&params);

    Ok(Json(state.reports().members(&criteria, page, order).await?))
}

async fn member_groups(State(state): State<AppState>) -> ReportResult<Json<Vec<MemberGroupRow>>> {
    Ok(Json(state.reports().member_groups().await?))
}

async fn languages(State(state): State<AppState>) -> ReportResult<Json<Vec<LanguageRow>>> {
    Ok(Json(state.reports().languages().await?))
}

async fn servers(State(state): State<AppState>) -> ReportResult<Json<Option<Vec<ServerRow>>>> {
    Ok(Json(state.reports().servers().await?))
}

async fn key_values(
    State(state): State<AppState>,
) -> ReportResult<Json<Option<Vec<KeyValueRow>>>> {
    Ok(Json(state.reports().key_values().await?))
}

async fn template_urls(State(state): State<AppState>) -> ReportResult<Json<Vec<String>>> {
    // Dropping the handler (client gone) cancels the scan
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let mut stream = state
        .reports()
        .template_urls(state.resolver(), state.warmup_options(), cancel)
        .await?;

    let mut urls = Vec::new();
    while let Some(url) = tokio_stream::StreamExt::next(&mut stream).await {
        urls.push(url);
    }
    Ok(Json(urls))
}

async fn warmup(State(state): State<AppState>) -> ReportResult<Json<WarmupResponse>> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let urls = state
        .reports()
        .template_urls(state.resolver(), state.warmup_options(), cancel)
        .await?;
    let outcomes = state.pinger().ping_all(urls).await;
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();

    info!(total = outcomes.len(), succeeded, "warm-up finished");

    Ok(Json(WarmupResponse {
        total: outcomes.len(),
        succeeded,
        outcomes,
    }))
}

async fn database(State(state): State<AppState>) -> Json<DatabaseResponse> {
    Json(DatabaseResponse {
        kind: state.reports().database_type(),
    })
}
