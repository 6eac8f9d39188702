//! Reporting service.
//!
//! One operation per report. Every operation opens its own store scope,
//! reads, maps rows and completes the scope; on any error the scope is
//! dropped and released.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::pager::{PagedQuery, paginate};
use super::query_builder::{
    ContentQueryBuilder, MemberQueryBuilder, content_type_aliases_query,
    key_values_query, languages_query, member_groups_query, servers_query, template_nodes_query,
    usage_query,
};
use super::rows::{
    ContentRow, KeyValueRow, LanguageRow, MemberGroupRow, MemberRow, ServerRow, UsageRow,
    map_aliases, map_node_ids, map_rows, map_usage_rows,
};
use super::schema::{KEY_VALUE_TABLE, SERVER_TABLE};
use super::store::{BuiltQuery, ReportStore};
use super::types::{
    ContentCriteria, ContentSort, MemberCriteria, MemberSort, PageRequest, PageResult, SortOrder,
    UsageSort,
};
use super::warmup::{UrlResolver, UrlStream, WarmupOptions, resolve_urls};
use crate::error::ReportResult;

/// Default cap on items per page.
pub const MAX_ITEMS_PER_PAGE: u32 = 200;

/// Read-only reports over the host schema.
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn ReportStore>,
    max_items_per_page: u32,
}

impl ReportingService {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self {
            store,
            max_items_per_page: MAX_ITEMS_PER_PAGE,
        }
    }

    /// Override the page size cap.
    pub fn with_max_items_per_page(mut self, max: u32) -> Self {
        self.max_items_per_page = max.max(1);
        self
    }

    /// Content nodes matching `criteria`, one page at a time.
    pub async fn content(
        &self,
        criteria: &ContentCriteria,
        page: PageRequest,
        order: SortOrder<ContentSort>,
    ) -> ReportResult<PageResult<ContentRow>> {
        let query = PagedQuery::new(
            &ContentQueryBuilder::new(criteria).build(order),
            page.capped(self.max_items_per_page),
        );
        self.paged(&query).await
    }

    /// Members, optionally limited to a group and a text search.
    pub async fn members(
        &self,
        criteria: &MemberCriteria,
        page: PageRequest,
        order: SortOrder<MemberSort>,
    ) -> ReportResult<PageResult<MemberRow>> {
        let query = PagedQuery::new(
            &MemberQueryBuilder::new(criteria).build(order),
            page.capped(self.max_items_per_page),
        );
        self.paged(&query).await
    }

    /// Instance counts per content type; `type_id` limits it to one type.
    pub async fn content_usage(
        &self,
        type_id: Option<i32>,
        order: SortOrder<UsageSort>,
    ) -> ReportResult<Vec<UsageRow>> {
        let query = usage_query(type_id, order).all();
        let rows = self.fetch_all(&query).await?;
        map_usage_rows(rows)
    }

    /// All document type aliases, alphabetically.
    pub async fn content_type_aliases(&self) -> ReportResult<Vec<String>> {
        let query = content_type_aliases_query().all();
        let rows = self.fetch_all(&query).await?;
        map_aliases(rows)
    }

    pub async fn member_groups(&self) -> ReportResult<Vec<MemberGroupRow>> {
        let query = member_groups_query().all();
        let rows = self.fetch_all(&query).await?;
        map_rows(rows)
    }

    pub async fn languages(&self) -> ReportResult<Vec<LanguageRow>> {
        let query = languages_query().all();
        let rows = self.fetch_all(&query).await?;
        map_rows(rows)
    }

    /// Registered servers, or `None` when the host has no server registry.
    pub async fn servers(&self) -> ReportResult<Option<Vec<ServerRow>>> {
        let query = servers_query().all();
        match self.fetch_optional(SERVER_TABLE, &query).await? {
            Some(rows) => Ok(Some(map_rows(rows)?)),
            None => Ok(None),
        }
    }

    /// Key-value entries, or `None` when the host has no key-value table.
    pub async fn key_values(&self) -> ReportResult<Option<Vec<KeyValueRow>>> {
        let query = key_values_query().all();
        match self.fetch_optional(KEY_VALUE_TABLE, &query).await? {
            Some(rows) => Ok(Some(map_rows(rows)?)),
            None => Ok(None),
        }
    }

    /// Which backend the store is.
    pub fn database_type(&self) -> &'static str {
        self.store.kind()
    }

    /// Whether the store answers.
    pub async fn store_healthy(&self) -> bool {
        self.store.ping().await
    }

    /// The lowest content node id of each template in use, ascending.
    pub async fn template_node_ids(&self) -> ReportResult<Vec<i32>> {
        let query = template_nodes_query().all();
        let rows = self.fetch_all(&query).await?;
        map_node_ids(rows)
    }

    /// Warm-up URLs, one per template in use.
    ///
    /// The node id query runs now and its errors surface here. URLs are
    /// resolved only as the returned stream is polled.
    pub async fn template_urls(
        &self,
        resolver: Arc<dyn UrlResolver>,
        options: WarmupOptions,
        cancel: CancellationToken,
    ) -> ReportResult<UrlStream> {
        let node_ids = self.template_node_ids().await?;
        info!(templates = node_ids.len(), "resolving warm-up urls");
        Ok(resolve_urls(node_ids, resolver, options, cancel))
    }

    async fn paged<T>(&self, query: &PagedQuery) -> ReportResult<PageResult<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut scope = self.store.begin().await?;
        let (total, rows) = paginate(scope.as_mut(), query).await?;
        scope.complete().await?;

        Ok(PageResult::new(map_rows(rows)?, total, query.page))
    }

    async fn fetch_all(&self, query: &BuiltQuery) -> ReportResult<Vec<serde_json::Value>> {
        let mut scope = self.store.begin().await?;
        let rows = scope.fetch(query).await?;
        scope.complete().await?;

        debug!(report = query.report, rows = rows.len(), "report rows");
        Ok(rows)
    }

    async fn fetch_optional(
        &self,
        table: &str,
        query: &BuiltQuery,
    ) -> ReportResult<Option<Vec<serde_json::Value>>> {
        let mut scope = self.store.begin().await?;
        if !scope.table_exists(table).await? {
            scope.complete().await?;
            debug!(report = query.report, table, "optional table absent");
            return Ok(None);
        }

        let rows = scope.fetch(query).await?;
        scope.complete().await?;
        Ok(Some(rows))
    }
}
