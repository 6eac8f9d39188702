//! Report query builder using SeaQuery.
//!
//! Generates the base query of every report and appends criteria as
//! parameterized predicates. Values are never rendered into the SQL text;
//! they travel as bound `$n` arguments. Sorting is only possible through
//! the allow-list enums in `types`, each mapped here to a fixed column.

use sea_query::{
    Alias, Asterisk, Cond, Expr, Func, JoinType, Order, Query, SelectStatement, SimpleExpr,
    SubQueryStatement,
};

use super::schema::{
    Content, ContentType, ContentVersion, CultureVariation, Document, DocumentType, KeyValue,
    Language, Member, MemberToGroup, Node, Server, Src, Template, User, object_types,
};
use super::store::{BuiltQuery, Window};
use super::types::{
    ContentCriteria, ContentSort, MemberCriteria, MemberSort, PageRequest, SortDirection,
    SortOrder, UsageSort,
};

/// A filtered report query and the order its rows come back in.
///
/// The order is kept apart from the statement so the count query can be
/// derived from the unordered form.
#[derive(Debug, Clone)]
pub struct ReportQuery {
    pub report: &'static str,
    pub select: SelectStatement,
    pub order: Vec<(SimpleExpr, Order)>,
}

impl ReportQuery {
    fn new(report: &'static str, select: SelectStatement) -> Self {
        Self {
            report,
            select,
            order: Vec::new(),
        }
    }

    fn order_by(mut self, expr: impl Into<SimpleExpr>, order: Order) -> Self {
        self.order.push((expr.into(), order));
        self
    }

    /// The statement with its ORDER BY applied.
    pub fn ordered(&self) -> SelectStatement {
        let mut select = self.select.clone();
        for (expr, order) in &self.order {
            select.order_by_expr(expr.clone(), order.clone());
        }
        select
    }

    /// `SELECT COUNT(*)` over the unordered statement.
    pub fn count(&self) -> BuiltQuery {
        let count = Query::select()
            .expr(Expr::col(Asterisk).count())
            .from_subquery(self.select.clone(), Alias::new("counted"))
            .to_owned();
        BuiltQuery::new(self.report, &count)
    }

    /// The ordered statement restricted to one page.
    pub fn page(&self, page: PageRequest) -> BuiltQuery {
        let window = Window {
            limit: u64::from(page.per_page()),
            offset: page.offset(),
        };
        let mut select = self.ordered();
        select.limit(window.limit).offset(window.offset);
        BuiltQuery::new(self.report, &select).windowed(window)
    }

    /// The ordered statement without a window.
    pub fn all(&self) -> BuiltQuery {
        BuiltQuery::new(self.report, &self.ordered())
    }
}

fn order_of(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// Builds the content listing from a set of criteria.
pub struct ContentQueryBuilder<'a> {
    criteria: &'a ContentCriteria,
}

impl<'a> ContentQueryBuilder<'a> {
    pub fn new(criteria: &'a ContentCriteria) -> Self {
        Self { criteria }
    }

    /// Content nodes joined to their type, creator and current version.
    pub fn base() -> SelectStatement {
        let variants = Query::select()
            .expr(Expr::col((Src::Variation, CultureVariation::LanguageId)).count())
            .from_as(CultureVariation::Table, Src::Variation)
            .and_where(
                Expr::col((Src::Variation, CultureVariation::NodeId))
                    .equals((Src::Node, Node::Id)),
            )
            .to_owned();

        Query::select()
            .expr_as(Expr::col((Src::Node, Node::UniqueId)), Alias::new("udi"))
            .expr_as(Expr::col((Src::Node, Node::Id)), Alias::new("id"))
            .expr_as(Expr::col((Src::Node, Node::ParentId)), Alias::new("parent_id"))
            .expr_as(Expr::col((Src::Node, Node::Level)), Alias::new("level"))
            .expr_as(Expr::col((Src::ContentType, ContentType::Icon)), Alias::new("icon"))
            .expr_as(Expr::col((Src::Node, Node::Trashed)), Alias::new("trashed"))
            .expr_as(Expr::col((Src::ContentType, ContentType::Alias)), Alias::new("alias"))
            .expr_as(Expr::col((Src::Node, Node::Text)), Alias::new("name"))
            .expr_as(Expr::col((Src::Node, Node::CreateDate)), Alias::new("create_date"))
            .expr_as(Expr::col((Src::Creator, User::Id)), Alias::new("creator_id"))
            .expr_as(Expr::col((Src::Creator, User::UserName)), Alias::new("creator_name"))
            .expr_as(
                Expr::col((Src::Version, ContentVersion::VersionDate)),
                Alias::new("update_date"),
            )
            .expr_as(Expr::col((Src::Updater, User::Id)), Alias::new("updater_id"))
            .expr_as(Expr::col((Src::Updater, User::UserName)), Alias::new("updater_name"))
            .expr_as(
                SimpleExpr::SubQuery(None, Box::new(SubQueryStatement::SelectStatement(variants))),
                Alias::new("language_count"),
            )
            .from_as(Content::Table, Src::Content)
            .join_as(
                JoinType::InnerJoin,
                Node::Table,
                Src::Node,
                Expr::col((Src::Node, Node::Id)).equals((Src::Content, Content::NodeId)),
            )
            .join_as(
                JoinType::InnerJoin,
                ContentType::Table,
                Src::ContentType,
                Expr::col((Src::Content, Content::ContentTypeId))
                    .equals((Src::ContentType, ContentType::NodeId)),
            )
            .join_as(
                JoinType::InnerJoin,
                Document::Table,
                Src::Document,
                Expr::col((Src::Document, Document::NodeId)).equals((Src::Content, Content::NodeId)),
            )
            // Only the current version, so each node appears once
            .join_as(
                JoinType::InnerJoin,
                ContentVersion::Table,
                Src::Version,
                Cond::all()
                    .add(
                        Expr::col((Src::Version, ContentVersion::NodeId))
                            .equals((Src::Node, Node::Id)),
                    )
                    .add(Expr::col((Src::Version, ContentVersion::Current)).eq(true)),
            )
            .join_as(
                JoinType::InnerJoin,
                User::Table,
                Src::Creator,
                Expr::col((Src::Creator, User::Id)).equals((Src::Node, Node::NodeUser)),
            )
            .join_as(
                JoinType::InnerJoin,
                User::Table,
                Src::Updater,
                Expr::col((Src::Version, ContentVersion::UserId)).equals((Src::Updater, User::Id)),
            )
            .to_owned()
    }

    /// One predicate per present criterion, always in the same order:
    /// alias, name, id, level, trashed, creator, updater, language.
    pub fn predicates(&self) -> Vec<SimpleExpr> {
        let c = self.criteria;
        let mut predicates = Vec::new();

        if let Some(alias) = non_empty(&c.alias) {
            predicates.push(Expr::col((Src::ContentType, ContentType::Alias)).eq(alias));
        }

        if let Some(name) = non_empty(&c.name) {
            predicates.push(contains_ci(Expr::col((Src::Node, Node::Text)), name));
        }

        if let Some(id) = non_empty(&c.id) {
            let unique_id = Expr::col((Src::Node, Node::UniqueId))
                .cast_as(Alias::new("text"))
                .like(like_fragment(&id.to_lowercase()));
            // A non-numeric id can only match the unique id
            let predicate = match id.trim().parse::<i32>() {
                Ok(numeric) => Cond::any()
                    .add(Expr::col((Src::Node, Node::Id)).eq(numeric))
                    .add(unique_id)
                    .into(),
                Err(_) => unique_id,
            };
            predicates.push(predicate);
        }

        if let Some(level) = c.level {
            predicates.push(Expr::col((Src::Node, Node::Level)).eq(level));
        }

        if let Some(trashed) = c.trashed {
            predicates.push(Expr::col((Src::Node, Node::Trashed)).eq(trashed));
        }

        if let Some(creator_id) = c.creator_id {
            predicates.push(Expr::col((Src::Creator, User::Id)).eq(creator_id));
        }

        if let Some(updater_id) = c.updater_id {
            predicates.push(Expr::col((Src::Updater, User::Id)).eq(updater_id));
        }

        if let Some(language_id) = c.language_id {
            let languages = Query::select()
                .column((Alias::new("LV"), CultureVariation::LanguageId))
                .from_as(CultureVariation::Table, Alias::new("LV"))
                .and_where(
                    Expr::col((Alias::new("LV"), CultureVariation::NodeId))
                        .equals((Src::Node, Node::Id)),
                )
                .to_owned();
            predicates.push(Expr::val(language_id).in_subquery(languages));
        }

        predicates
    }

    /// Base query with every predicate applied and the requested order.
    pub fn build(&self, order: SortOrder<ContentSort>) -> ReportQuery {
        let mut select = Self::base();
        for predicate in self.predicates() {
            select.and_where(predicate);
        }

        let column: SimpleExpr = match order.column {
            ContentSort::Id => Expr::col((Src::Node, Node::Id)).into(),
            ContentSort::Name => Expr::col((Src::Node, Node::Text)).into(),
            ContentSort::Alias => Expr::col((Src::ContentType, ContentType::Alias)).into(),
            ContentSort::Level => Expr::col((Src::Node, Node::Level)).into(),
            ContentSort::Created => Expr::col((Src::Node, Node::CreateDate)).into(),
            ContentSort::Updated => Expr::col((Src::Version, ContentVersion::VersionDate)).into(),
            ContentSort::Creator => Expr::col((Src::Creator, User::UserName)).into(),
            ContentSort::Updater => Expr::col((Src::Updater, User::UserName)).into(),
            ContentSort::Languages => Expr::col(Alias::new("language_count")).into(),
        };

        ReportQuery::new("content", select)
            .order_by(column, order_of(order.direction))
            .order_by(Expr::col((Src::Node, Node::Id)), Order::Asc)
    }
}

/// Builds the member listing.
pub struct MemberQueryBuilder<'a> {
    criteria: &'a MemberCriteria,
}

impl<'a> MemberQueryBuilder<'a> {
    pub fn new(criteria: &'a MemberCriteria) -> Self {
        Self { criteria }
    }

    pub fn base() -> SelectStatement {
        Query::select()
            .expr_as(Expr::col((Src::Member, Member::NodeId)), Alias::new("id"))
            .expr_as(Expr::col((Src::Member, Member::LoginName)), Alias::new("user_name"))
            .expr_as(Expr::col((Src::MemberNode, Node::Text)), Alias::new("name"))
            .expr_as(Expr::col((Src::Member, Member::Email)), Alias::new("email"))
            .expr_as(Expr::col((Src::MemberNode, Node::CreateDate)), Alias::new("create_date"))
            .expr_as(Expr::col((Src::MemberNode, Node::UniqueId)), Alias::new("udi"))
            .from_as(Member::Table, Src::Member)
            .join_as(
                JoinType::InnerJoin,
                Node::Table,
                Src::MemberNode,
                Expr::col((Src::Member, Member::NodeId)).equals((Src::MemberNode, Node::Id)),
            )
            .to_owned()
    }

    /// Group membership, then the text search across name, email and login.
    pub fn predicates(&self) -> Vec<SimpleExpr> {
        let mut predicates = Vec::new();

        // Membership as a subquery keeps one row per member
        if let Some(group_id) = self.criteria.group_id {
            let members = Query::select()
                .column((Src::MemberGroup, MemberToGroup::Member))
                .from_as(MemberToGroup::Table, Src::MemberGroup)
                .and_where(Expr::col((Src::MemberGroup, MemberToGroup::MemberGroup)).eq(group_id))
                .to_owned();
            predicates.push(Expr::col((Src::Member, Member::NodeId)).in_subquery(members));
        }

        if let Some(search) = non_empty(&self.criteria.search) {
            predicates.push(
                Cond::any()
                    .add(contains_ci(Expr::col((Src::MemberNode, Node::Text)), search))
                    .add(contains_ci(Expr::col((Src::Member, Member::Email)), search))
                    .add(contains_ci(Expr::col((Src::Member, Member::LoginName)), search))
                    .into(),
            );
        }

        predicates
    }

    pub fn build(&self, order: SortOrder<MemberSort>) -> ReportQuery {
        let mut select = Self::base();
        for predicate in self.predicates() {
            select.and_where(predicate);
        }

        let column: SimpleExpr = match order.column {
            MemberSort::Name => Expr::col((Src::MemberNode, Node::Text)).into(),
            MemberSort::Id => Expr::col((Src::Member, Member::NodeId)).into(),
            MemberSort::Email => Expr::col((Src::Member, Member::Email)).into(),
            MemberSort::UserName => Expr::col((Src::Member, Member::LoginName)).into(),
            MemberSort::Created => Expr::col((Src::MemberNode, Node::CreateDate)).into(),
        };

        ReportQuery::new("members", select)
            .order_by(column, order_of(order.direction))
            .order_by(Expr::col((Src::Member, Member::NodeId)), Order::Asc)
    }
}

/// Instance counts per content type, optionally for one type.
///
/// Counts content rows, so a type nobody uses reports zero.
pub fn usage_query(type_id: Option<i32>, order: SortOrder<UsageSort>) -> ReportQuery {
    let mut select = Query::select()
        .expr_as(
            Expr::col((Src::Content, Content::NodeId)).count(),
            Alias::new("node_count"),
        )
        .expr_as(
            Expr::col((Src::ContentType, ContentType::Description)),
            Alias::new("description"),
        )
        .expr_as(Expr::col((Src::ContentType, ContentType::Alias)), Alias::new("alias"))
        .expr_as(Expr::col((Src::ContentType, ContentType::Icon)), Alias::new("icon"))
        .expr_as(Expr::col((Src::ContentType, ContentType::Pk)), Alias::new("id"))
        .expr_as(Expr::col((Src::Node, Node::NodeObjectType)), Alias::new("guid_type"))
        .from_as(ContentType::Table, Src::ContentType)
        .join_as(
            JoinType::LeftJoin,
            Content::Table,
            Src::Content,
            Expr::col((Src::Content, Content::ContentTypeId))
                .equals((Src::ContentType, ContentType::NodeId)),
        )
        .join_as(
            JoinType::LeftJoin,
            Node::Table,
            Src::Node,
            Expr::col((Src::ContentType, ContentType::NodeId)).equals((Src::Node, Node::Id)),
        )
        .to_owned();

    if let Some(id) = type_id {
        select.and_where(Expr::col((Src::ContentType, ContentType::Pk)).eq(id));
    }

    select
        .group_by_col((Src::ContentType, ContentType::Alias))
        .group_by_col((Src::ContentType, ContentType::Icon))
        .group_by_col((Src::ContentType, ContentType::Description))
        .group_by_col((Src::ContentType, ContentType::Pk))
        .group_by_col((Src::Node, Node::NodeObjectType));

    let column: SimpleExpr = match order.column {
        UsageSort::Alias => Expr::col((Src::ContentType, ContentType::Alias)).into(),
        UsageSort::Id => Expr::col((Src::ContentType, ContentType::Pk)).into(),
        UsageSort::Description => Expr::col((Src::ContentType, ContentType::Description)).into(),
        UsageSort::Count => Expr::col(Alias::new("node_count")).into(),
        UsageSort::Type => Expr::col((Src::Node, Node::NodeObjectType)).into(),
    };

    ReportQuery::new("usage", select)
        .order_by(column, order_of(order.direction))
        .order_by(Expr::col((Src::ContentType, ContentType::Pk)), Order::Asc)
}

/// Aliases of all document types.
pub fn content_type_aliases_query() -> ReportQuery {
    let select = Query::select()
        .expr_as(Expr::col((Src::ContentType, ContentType::Alias)), Alias::new("alias"))
        .from_as(ContentType::Table, Src::ContentType)
        .join_as(
            JoinType::InnerJoin,
            Node::Table,
            Src::Node,
            Expr::col((Src::ContentType, ContentType::NodeId)).equals((Src::Node, Node::Id)),
        )
        .and_where(Expr::col((Src::Node, Node::NodeObjectType)).eq(object_types::DOCUMENT_TYPE))
        .to_owned();

    ReportQuery::new("content_type_aliases", select).order_by(
        Expr::col((Src::ContentType, ContentType::Alias)),
        Order::Asc,
    )
}

pub fn languages_query() -> ReportQuery {
    let select = Query::select()
        .expr_as(Expr::col(Language::Id), Alias::new("id"))
        .expr_as(Expr::col(Language::CultureName), Alias::new("name"))
        .from(Language::Table)
        .to_owned();

    ReportQuery::new("languages", select).order_by(Expr::col(Language::Id), Order::Asc)
}

pub fn member_groups_query() -> ReportQuery {
    let select = Query::select()
        .expr_as(Expr::col(Node::Id), Alias::new("id"))
        .expr_as(Expr::col(Node::Text), Alias::new("name"))
        .from(Node::Table)
        .and_where(Expr::col(Node::NodeObjectType).eq(object_types::MEMBER_GROUP))
        .to_owned();

    ReportQuery::new("member_groups", select)
        .order_by(Expr::col(Node::Text), Order::Asc)
        .order_by(Expr::col(Node::Id), Order::Asc)
}

pub fn servers_query() -> ReportQuery {
    let select = Query::select()
        .expr_as(Expr::col(Server::Id), Alias::new("id"))
        .expr_as(Expr::col(Server::Address), Alias::new("address"))
        .expr_as(Expr::col(Server::ComputerName), Alias::new("computer_name"))
        .expr_as(Expr::col(Server::RegisteredDate), Alias::new("registered_date"))
        .expr_as(Expr::col(Server::LastNotifiedDate), Alias::new("last_notified_date"))
        .expr_as(Expr::col(Server::IsActive), Alias::new("is_active"))
        .expr_as(Expr::col(Server::IsMaster), Alias::new("is_master"))
        .from(Server::Table)
        .to_owned();

    ReportQuery::new("servers", select).order_by(Expr::col(Server::Id), Order::Asc)
}

pub fn key_values_query() -> ReportQuery {
    let select = Query::select()
        .expr_as(Expr::col(KeyValue::Key), Alias::new("key"))
        .expr_as(Expr::col(KeyValue::Value), Alias::new("value"))
        .expr_as(Expr::col(KeyValue::Updated), Alias::new("updated"))
        .from(KeyValue::Table)
        .to_owned();

    ReportQuery::new("key_values", select)
        .order_by(Expr::col(KeyValue::Updated), Order::Asc)
        .order_by(Expr::col(KeyValue::Key), Order::Asc)
}

/// The lowest content node id for each template in use.
pub fn template_nodes_query() -> ReportQuery {
    let select = Query::select()
        .expr_as(
            Expr::col((Src::Content, Content::NodeId)).min(),
            Alias::new("node_id"),
        )
        .from_as(DocumentType::Table, Src::DocumentType)
        .join_as(
            JoinType::InnerJoin,
            Template::Table,
            Src::Template,
            Expr::col((Src::DocumentType, DocumentType::TemplateNodeId))
                .equals((Src::Template, Template::NodeId)),
        )
        .join_as(
            JoinType::InnerJoin,
            Content::Table,
            Src::Content,
            Expr::col((Src::Content, Content::ContentTypeId))
                .equals((Src::DocumentType, DocumentType::ContentTypeNodeId)),
        )
        .group_by_col((Src::DocumentType, DocumentType::TemplateNodeId))
        .to_owned();

    ReportQuery::new("template_nodes", select).order_by(Expr::col(Alias::new("node_id")), Order::Asc)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Case-insensitive substring match.
fn contains_ci(column: Expr, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(column)).like(like_fragment(&needle.to_lowercase()))
}

/// `%value%` with LIKE wildcards in the value escaped.
fn like_fragment(value: &str) -> String {
    format!("%{}%", escape_like_wildcards(value))
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
