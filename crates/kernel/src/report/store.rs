//! Report store backends.
//!
//! Provides the store seam the reporting service reads through, and the
//! PostgreSQL implementation of it. Each report opens one scope, reads, and
//! completes it; a scope dropped on an error path rolls back and returns its
//! connection to the pool.

use std::time::Duration;

use async_trait::async_trait;
use sea_query::{PostgresQueryBuilder, SelectStatement, Value, Values};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::{ReportError, ReportResult};

/// Row window applied to a paged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u64,
    pub offset: u64,
}

/// A rendered, parameterized query ready for a store.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    /// Report the query belongs to, for logging.
    pub report: &'static str,
    /// SQL text with `$n` placeholders.
    pub sql: String,
    /// Values for the placeholders, in order.
    pub values: Values,
    /// Window rendered into the SQL, if any.
    pub window: Option<Window>,
}

impl BuiltQuery {
    /// Render a statement for PostgreSQL.
    pub fn new(report: &'static str, statement: &SelectStatement) -> Self {
        let (sql, values) = statement.build(PostgresQueryBuilder);
        Self {
            report,
            sql,
            values,
            window: None,
        }
    }

    /// Record the window that was applied to the statement.
    pub fn windowed(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }
}

/// Source of report scopes.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Open a read scope.
    async fn begin(&self) -> ReportResult<Box<dyn StoreScope>>;

    /// Kind of backend (e.g., "postgres").
    fn kind(&self) -> &'static str;

    /// Check that the store answers.
    async fn ping(&self) -> bool;
}

/// One unit of work against the store.
///
/// Dropping a scope without calling [`StoreScope::complete`] releases it.
#[async_trait]
pub trait StoreScope: Send {
    /// Run a `COUNT(*)` query.
    async fn count(&mut self, query: &BuiltQuery) -> ReportResult<u64>;

    /// Run a query, returning each row as a JSON object keyed by column alias.
    async fn fetch(&mut self, query: &BuiltQuery) -> ReportResult<Vec<JsonValue>>;

    /// Whether a table exists in the store's current schema.
    async fn table_exists(&mut self, table: &str) -> ReportResult<bool>;

    /// Finish the scope.
    async fn complete(self: Box<Self>) -> ReportResult<()>;
}

/// PostgreSQL-backed report store.
#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgReportStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn begin(&self) -> ReportResult<Box<dyn StoreScope>> {
        let mut tx = self.pool.begin().await?;

        // SET LOCAL applies to this transaction only and resets on commit/rollback
        let millis = self.statement_timeout.as_millis().max(1);
        sqlx::query(&format!("SET LOCAL statement_timeout = {millis}"))
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgScope { tx }))
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

struct PgScope {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreScope for PgScope {
    async fn count(&mut self, query: &BuiltQuery) -> ReportResult<u64> {
        let args = pg_arguments(&query.values)?;
        let total: i64 = sqlx::query_scalar_with(&query.sql, args)
            .fetch_one(&mut *self.tx)
            .await?;

        debug!(report = query.report, total, "count query");
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn fetch(&mut self, query: &BuiltQuery) -> ReportResult<Vec<JsonValue>> {
        let args = pg_arguments(&query.values)?;
        let sql = format!("SELECT row_to_json(t) FROM ({}) t", query.sql);
        let rows: Vec<JsonValue> = sqlx::query_scalar_with(&sql, args)
            .fetch_all(&mut *self.tx)
            .await?;

        debug!(report = query.report, rows = rows.len(), "fetch query");
        Ok(rows)
    }

    async fn table_exists(&mut self, table: &str) -> ReportResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1)",
        )
        .bind(table)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn complete(self: Box<Self>) -> ReportResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Convert SeaQuery values into positional PostgreSQL arguments.
fn pg_arguments(values: &Values) -> ReportResult<PgArguments> {
    let mut args = PgArguments::default();
    for value in values.iter() {
        let added = match value {
            Value::Bool(v) => args.add(*v),
            Value::TinyInt(v) => args.add(v.map(i16::from)),
            Value::SmallInt(v) => args.add(*v),
            Value::Int(v) => args.add(*v),
            Value::BigInt(v) => args.add(*v),
            Value::TinyUnsigned(v) => args.add(v.map(i16::from)),
            Value::SmallUnsigned(v) => args.add(v.map(i32::from)),
            Value::Unsigned(v) => args.add(v.map(i64::from)),
            Value::BigUnsigned(v) => {
                let v = v
                    .map(i64::try_from)
                    .transpose()
                    .map_err(|e| ReportError::Internal(e.into()))?;
                args.add(v)
            }
            Value::Float(v) => args.add(*v),
            Value::Double(v) => args.add(*v),
            Value::String(v) => args.add(v.as_deref().cloned()),
            Value::Char(v) => args.add(v.map(|c| c.to_string())),
            Value::Bytes(v) => args.add(v.as_deref().cloned()),
            Value::Uuid(v) => args.add(v.as_deref().copied()),
            #[allow(unreachable_patterns)]
            other => {
                return Err(ReportError::Internal(anyhow::anyhow!(
                    "unsupported query value: {other:?}"
                )));
            }
        };
        added.map_err(|e| ReportError::Internal(anyhow::anyhow!(e)))?;
    }
    Ok(args)
}
