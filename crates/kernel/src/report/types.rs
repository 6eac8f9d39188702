//! Report request and result types.
//!
//! Provides:
//! - ContentCriteria / MemberCriteria: optional filters per report family
//! - PageRequest / PageResult: 1-based paging in, counted page out
//! - ContentSort / UsageSort / MemberSort: the order-by allow-lists

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};

/// First page number. Pages are 1-based.
pub const FIRST_PAGE: u32 = 1;

/// Filters for the content listing.
///
/// Every field is optional; `None` places no constraint on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCriteria {
    /// Exact content type alias.
    pub alias: Option<String>,

    /// Case-insensitive substring of the node name.
    pub name: Option<String>,

    /// Numeric node id, or a fragment of the node's unique id.
    pub id: Option<String>,

    /// Hierarchy level.
    pub level: Option<i32>,

    /// Whether the node is in the recycle bin.
    pub trashed: Option<bool>,

    /// Id of the user who created the node.
    pub creator_id: Option<i32>,

    /// Id of the user who saved the current version.
    pub updater_id: Option<i32>,

    /// Language the node has a culture variant for.
    pub language_id: Option<i32>,
}

impl ContentCriteria {
    /// Build criteria from raw request parameters.
    ///
    /// Blank strings and values that fail to parse are treated as absent.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            alias: text_param(params, "alias"),
            name: text_param(params, "name"),
            id: text_param(params, "id"),
            level: parsed_param(params, "level"),
            trashed: parsed_param(params, "trashed"),
            creator_id: parsed_param(params, "creator"),
            updater_id: parsed_param(params, "updater"),
            language_id: parsed_param(params, "language"),
        }
    }
}

/// Filters for the member listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCriteria {
    /// Only members of this group.
    pub group_id: Option<i32>,

    /// Case-insensitive substring of name, email or login name.
    pub search: Option<String>,
}

impl MemberCriteria {
    /// Build criteria from raw request parameters.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            group_id: parsed_param(params, "group"),
            search: text_param(params, "search"),
        }
    }
}

fn text_param(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parsed_param<T: FromStr>(params: &HashMap<String, String>, key: &str) -> Option<T> {
    params.get(key).and_then(|v| v.trim().parse().ok())
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Validate a raw page request.
    ///
    /// A non-positive page size is rejected. Page numbers below the first
    /// page are read as the first page.
    pub fn new(page: i64, items_per_page: i64) -> ReportResult<Self> {
        if items_per_page <= 0 {
            return Err(ReportError::InvalidPageSize(items_per_page));
        }
        let page = u32::try_from(page.max(i64::from(FIRST_PAGE))).unwrap_or(u32::MAX);
        let per_page = u32::try_from(items_per_page).unwrap_or(u32::MAX);
        Ok(Self { page, per_page })
    }

    /// Current page number (1-indexed).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - FIRST_PAGE) * u64::from(self.per_page)
    }

    /// Same page, with the page size limited to `max`.
    pub fn capped(self, max: u32) -> Self {
        if self.per_page > max {
            tracing::warn!(
                requested = self.per_page,
                capped = max,
                "items_per_page exceeds maximum, capping"
            );
            Self {
                per_page: max,
                ..self
            }
        } else {
            self
        }
    }
}

/// One page of a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult<T> {
    /// Rows on this page.
    pub items: Vec<T>,

    /// Total count across all pages.
    pub total: u64,

    /// Current page number (1-indexed).
    pub page: u32,

    /// Items per page.
    pub per_page: u32,

    /// Total number of pages.
    pub total_pages: u64,

    /// Whether there's a next page.
    pub has_next: bool,

    /// Whether there's a previous page.
    pub has_prev: bool,
}

impl<T> PageResult<T> {
    /// Create a new result with paging calculations.
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let total_pages = total.div_ceil(u64::from(request.per_page));

        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            total_pages,
            has_next: u64::from(request.page) < total_pages,
            has_prev: request.page > FIRST_PAGE,
        }
    }

    /// Convert the rows, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ReportError::UnsafeOrderBy(s.to_string())),
        }
    }
}

/// Sortable columns of the content listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSort {
    #[default]
    Id,
    Name,
    Alias,
    Level,
    Created,
    Updated,
    Creator,
    Updater,
    Languages,
}

impl FromStr for ContentSort {
    type Err = ReportError;

    /// Accepts the column name or the host's column expression (`N.id`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" | "n.id" => Ok(ContentSort::Id),
            "name" | "n.text" => Ok(ContentSort::Name),
            "alias" | "ct.alias" => Ok(ContentSort::Alias),
            "level" | "n.level" => Ok(ContentSort::Level),
            "created" | "n.createdate" => Ok(ContentSort::Created),
            "updated" | "v.versiondate" => Ok(ContentSort::Updated),
            "creator" | "creator.username" => Ok(ContentSort::Creator),
            "updater" | "updater.username" => Ok(ContentSort::Updater),
            "languages" | "languagecount" => Ok(ContentSort::Languages),
            _ => Err(ReportError::UnsafeOrderBy(s.to_string())),
        }
    }
}

/// Sortable columns of the content type usage report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageSort {
    #[default]
    Alias,
    Id,
    Description,
    Count,
    Type,
}

impl FromStr for UsageSort {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alias" | "ct.alias" => Ok(UsageSort::Alias),
            "id" | "ct.pk" => Ok(UsageSort::Id),
            "description" | "ct.description" => Ok(UsageSort::Description),
            "count" | "nodecount" => Ok(UsageSort::Count),
            "type" | "n.nodeobjecttype" => Ok(UsageSort::Type),
            _ => Err(ReportError::UnsafeOrderBy(s.to_string())),
        }
    }
}

/// Sortable columns of the member listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSort {
    #[default]
    Name,
    Id,
    Email,
    UserName,
    Created,
}

impl FromStr for MemberSort {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "mn.text" => Ok(MemberSort::Name),
            "id" | "m.nodeid" => Ok(MemberSort::Id),
            "email" | "m.email" => Ok(MemberSort::Email),
            "username" | "login" | "m.loginname" => Ok(MemberSort::UserName),
            "created" | "mn.createdate" => Ok(MemberSort::Created),
            _ => Err(ReportError::UnsafeOrderBy(s.to_string())),
        }
    }
}

/// A sort column from an allow-list plus a direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder<S> {
    pub column: S,
    pub direction: SortDirection,
}

impl<S> SortOrder<S>
where
    S: FromStr<Err = ReportError> + Default,
{
    /// Ascending order on `column`.
    pub fn asc(column: S) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    /// Descending order on `column`.
    pub fn desc(column: S) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }

    /// Parse caller-supplied order and direction.
    ///
    /// Missing values fall back to the report's default column, ascending.
    /// Anything outside the allow-list is rejected.
    pub fn parse(order: Option<&str>, direction: Option<&str>) -> ReportResult<Self> {
        let column = match order.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse()?,
            None => S::default(),
        };
        let direction = match direction.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse()?,
            None => SortDirection::default(),
        };
        Ok(Self { column, direction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn content_criteria_from_params() {
        let criteria = ContentCriteria::from_params(&params(&[
            ("alias", "textPage"),
            ("name", "  home "),
            ("trashed", "false"),
            ("level", "2"),
            ("language", "1"),
        ]));

        assert_eq!(criteria.alias.as_deref(), Some("textPage"));
        assert_eq!(criteria.name.as_deref(), Some("home"));
        assert_eq!(criteria.trashed, Some(false));
        assert_eq!(criteria.level, Some(2));
        assert_eq!(criteria.language_id, Some(1));
        assert!(criteria.creator_id.is_none());
    }

    #[test]
    fn malformed_numbers_are_no_constraint() {
        let criteria = ContentCriteria::from_params(&params(&[
            ("level", "two"),
            ("creator", ""),
            ("trashed", "maybe"),
            ("alias", "   "),
        ]));

        assert_eq!(criteria, ContentCriteria::default());
    }

    #[test]
    fn member_criteria_from_params() {
        let criteria = MemberCriteria::from_params(&params(&[("group", "5"), ("search", "smith")]));
        assert_eq!(criteria.group_id, Some(5));
        assert_eq!(criteria.search.as_deref(), Some("smith"));

        let lenient = MemberCriteria::from_params(&params(&[("group", "five")]));
        assert_eq!(lenient, MemberCriteria::default());
    }

    #[test]
    fn page_request_rejects_non_positive_size() {
        assert!(matches!(
            PageRequest::new(1, 0),
            Err(ReportError::InvalidPageSize(0))
        ));
        assert!(matches!(
            PageRequest::new(1, -5),
            Err(ReportError::InvalidPageSize(-5))
        ));
    }

    #[test]
    fn page_request_offsets() {
        assert_eq!(PageRequest::new(1, 10).unwrap().offset(), 0);
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
        // below the first page reads as the first page
        let zero = PageRequest::new(0, 25).unwrap();
        assert_eq!(zero.page(), FIRST_PAGE);
        assert_eq!(zero.offset(), 0);
    }

    #[test]
    fn page_request_capping() {
        let req = PageRequest::new(2, 5000).unwrap().capped(200);
        assert_eq!(req.per_page(), 200);
        assert_eq!(req.page(), 2);

        let small = PageRequest::new(2, 20).unwrap().capped(200);
        assert_eq!(small.per_page(), 20);
    }

    #[test]
    fn page_result_calculations() {
        let req = PageRequest::new(2, 10).unwrap();
        let result = PageResult::new(vec![1, 2, 3], 25, req);

        assert_eq!(result.total, 25);
        assert_eq!(result.page, 2);
        assert_eq!(result.total_pages, 3);
        assert!(result.has_next);
        assert!(result.has_prev);

        let last = PageResult::new(vec![1], 25, PageRequest::new(3, 10).unwrap());
        assert!(!last.has_next);

        let empty: PageResult<i32> = PageResult::new(vec![], 0, PageRequest::new(1, 10).unwrap());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[test]
    fn sort_allow_lists() {
        assert_eq!("N.id".parse::<ContentSort>().unwrap(), ContentSort::Id);
        assert_eq!("name".parse::<ContentSort>().unwrap(), ContentSort::Name);
        assert_eq!("CT.alias".parse::<UsageSort>().unwrap(), UsageSort::Alias);
        assert_eq!("MN.text".parse::<MemberSort>().unwrap(), MemberSort::Name);
        assert_eq!("login".parse::<MemberSort>().unwrap(), MemberSort::UserName);

        let err = "N.id; DROP TABLE umbracoNode".parse::<ContentSort>();
        assert!(matches!(err, Err(ReportError::UnsafeOrderBy(_))));
    }

    #[test]
    fn ordering_parse_defaults_and_rejects() {
        let default = SortOrder::<MemberSort>::parse(None, None).unwrap();
        assert_eq!(default.column, MemberSort::Name);
        assert_eq!(default.direction, SortDirection::Asc);

        let desc = SortOrder::<ContentSort>::parse(Some("updated"), Some("DESC")).unwrap();
        assert_eq!(desc, SortOrder::desc(ContentSort::Updated));

        assert!(SortOrder::<ContentSort>::parse(Some("id"), Some("sideways")).is_err());
        assert!(SortOrder::<UsageSort>::parse(Some("random()"), None).is_err());
    }
}
