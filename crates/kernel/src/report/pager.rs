//! Counted, windowed execution of a report query.

use serde_json::Value as JsonValue;
use tracing::debug;

use super::query_builder::ReportQuery;
use super::store::{BuiltQuery, StoreScope};
use super::types::PageRequest;
use crate::error::ReportResult;

/// The two rendered reads behind one report page.
///
/// Rendered up front so only SQL text and bound values are held while the
/// store is awaited.
#[derive(Debug, Clone)]
pub struct PagedQuery {
    pub count: BuiltQuery,
    pub window: BuiltQuery,
    pub page: PageRequest,
}

impl PagedQuery {
    pub fn new(query: &ReportQuery, page: PageRequest) -> Self {
        Self {
            count: query.count(),
            window: query.page(page),
            page,
        }
    }
}

/// Run the count query, then fetch the requested window.
///
/// Both reads go through the same scope. A page past the end yields no rows
/// and the full total.
pub async fn paginate(
    scope: &mut dyn StoreScope,
    query: &PagedQuery,
) -> ReportResult<(u64, Vec<JsonValue>)> {
    let total = scope.count(&query.count).await?;
    let rows = scope.fetch(&query.window).await?;

    debug!(
        report = query.window.report,
        page = query.page.page(),
        per_page = query.page.per_page(),
        total,
        rows = rows.len(),
        "report page"
    );

    Ok((total, rows))
}
