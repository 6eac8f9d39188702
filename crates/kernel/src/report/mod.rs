//! Report module.
//!
//! This module provides:
//! - ReportingService: one operation per report over the host schema
//! - ContentQueryBuilder / MemberQueryBuilder: SeaQuery-based SQL generation
//! - ReportStore: the store seam, with the PostgreSQL implementation
//! - UrlResolver / WarmupPinger: template warm-up

mod pager;
pub mod query_builder;
pub mod rows;
pub mod schema;
mod service;
pub mod store;
pub mod types;
pub mod warmup;

pub use pager::{PagedQuery, paginate};
pub use query_builder::{ContentQueryBuilder, MemberQueryBuilder, ReportQuery};
pub use rows::{
    ContentRow, KeyValueRow, LanguageRow, MemberGroupRow, MemberRow, ServerRow, UsageCategory,
    UsageRow,
};
pub use service::{MAX_ITEMS_PER_PAGE, ReportingService};
pub use store::{BuiltQuery, PgReportStore, ReportStore, StoreScope, Window};
pub use types::{
    ContentCriteria, ContentSort, FIRST_PAGE, MemberCriteria, MemberSort, PageRequest, PageResult,
    SortDirection, SortOrder, UsageSort,
};
pub use warmup::{
    ContentHandle, HttpUrlResolver, PingOutcome, UrlResolver, UrlStream, WarmupOptions,
    WarmupPinger,
};
