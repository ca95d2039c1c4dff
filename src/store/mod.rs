//! Entity storage.
//!
//! Records are addressed through the [`Record`] trait so both backends can
//! serve every table with the same handful of operations. Writes take a
//! [`ColumnSet`] describing only the columns being assigned.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use crate::models::Audit;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Tables in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Clients,
    Projects,
    JobPositions,
    Employees,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Clients => "clients",
            Table::Projects => "projects",
            Table::JobPositions => "job_positions",
            Table::Employees => "employees",
        }
    }

    /// Singular, human-readable entity name.
    pub fn label(&self) -> &'static str {
        match self {
            Table::Users => "user",
            Table::Clients => "client",
            Table::Projects => "project",
            Table::JobPositions => "job position",
            Table::Employees => "employee",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Clients => "clients",
            Table::Projects => "projects",
            Table::JobPositions => "job positions",
            Table::Employees => "employees",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single bindable column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    OptInt(Option<i32>),
    BigInt(Option<i64>),
    Float(f64),
    Bool(bool),
    Text(String),
    OptText(Option<String>),
    Date(NaiveDate),
    TextList(Vec<String>),
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<Option<i32>> for Value {
    fn from(v: Option<i32>) -> Self {
        Value::OptInt(v)
    }
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        Value::BigInt(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(Some(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        Value::OptText(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::TextList(v)
    }
}

/// Ordered column assignments for an insert or a partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet(Vec<(&'static str, Value)>);

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `column` unconditionally.
    pub fn set<T: Clone + Into<Value>>(mut self, column: &'static str, value: &T) -> Self {
        self.0.push((column, value.clone().into()));
        self
    }

    /// Assign `column` only when a value was supplied.
    pub fn set_some<T: Clone + Into<Value>>(self, column: &'static str, value: &Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<(&'static str, Value)> {
        self.0
    }
}

/// Write payloads (new rows and patches) describe themselves as columns.
pub trait Columns {
    fn columns(&self) -> ColumnSet;

    /// Rows in other tables this payload points at.
    fn references(&self) -> Vec<(Table, i32)> {
        Vec::new()
    }
}

/// A persisted entity type.
pub trait Record: for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static {
    const TABLE: Table;

    type New: Columns + Send + Sync + 'static;
    type Patch: Columns + Send + Sync + 'static;

    fn id(&self) -> i32;

    fn audit(&self) -> &Audit;

    fn audit_mut(&mut self) -> &mut Audit;

    /// Materialize a new row from its creation payload.
    fn build(id: i32, new: Self::New, audit: Audit) -> Self;

    /// Apply only the fields present in `patch`.
    fn merge(&mut self, patch: Self::Patch);

    /// Value of a foreign-key column, used for membership filters.
    fn reference(&self, _column: &str) -> Option<i32> {
        None
    }

    fn is_active(&self) -> bool {
        self.audit().active
    }
}

/// Offset/limit window over an id-ordered listing. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl Window {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self { offset, limit }
    }

    pub fn is_unbounded(&self) -> bool {
        self.offset.is_none() && self.limit.is_none()
    }
}

/// Row filter for listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub include_inactive: bool,
    /// Restrict to rows whose foreign-key column is one of the given ids.
    pub member_of: Option<(&'static str, Vec<i32>)>,
}

impl Filter {
    pub fn active() -> Self {
        Self::default()
    }

    pub fn everything() -> Self {
        Self {
            include_inactive: true,
            member_of: None,
        }
    }

    pub fn with_inactive(mut self, include_inactive: bool) -> Self {
        self.include_inactive = include_inactive;
        self
    }

    pub fn member_of(mut self, column: &'static str, ids: Vec<i32>) -> Self {
        self.member_of = Some((column, ids));
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("foreign key violation: {0}")]
    ForeignKey(String),
    #[error("check constraint violation: {0}")]
    Check(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("{table} row {id} has an unexpected shape")]
    Corrupt { table: Table, id: i32 },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23503") => return StoreError::ForeignKey(db_err.message().to_string()),
                Some("23514") => return StoreError::Check(db_err.message().to_string()),
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Per-call storage operations, shared by stores and open transactions.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn insert<R: Record>(&self, new: R::New) -> Result<R, StoreError>;

    async fn find_by_id<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError>;

    /// Like [`Repository::find_by_id`], but inside a transaction the row is
    /// held against concurrent writers until commit.
    async fn find_for_share<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError>;

    async fn find_all<R: Record>(&self, filter: &Filter, window: Window)
    -> Result<Vec<R>, StoreError>;

    /// Returns the row after the patch, or `None` if no row has `id`.
    async fn update_where<R: Record>(&self, id: i32, patch: R::Patch)
    -> Result<Option<R>, StoreError>;

    /// Flip the active flag off. Only active rows match.
    async fn deactivate<R: Record>(&self, id: i32) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait Transaction: Repository + Sized {
    async fn commit(self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait Store: Repository {
    type Tx: Transaction;

    /// Open a transaction. Dropping it without `commit` discards its writes.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_set_skips_absent_values() {
        let name = Some("Ada".to_string());
        let rate: Option<f64> = None;
        let cols = ColumnSet::new()
            .set_some("name", &name)
            .set_some("bill_rate", &rate)
            .set("active", &true);

        assert_eq!(
            cols.into_inner(),
            vec![
                ("name", Value::Text("Ada".into())),
                ("active", Value::Bool(true)),
            ]
        );
    }

    #[test]
    fn default_window_is_unbounded() {
        assert!(Window::all().is_unbounded());
        assert!(!Window::new(Some(0), None).is_unbounded());
    }

    #[test]
    fn filters_compose() {
        let filter = Filter::active().with_inactive(true).member_of("project_id", vec![1, 2]);
        assert!(filter.include_inactive);
        assert_eq!(filter.member_of, Some(("project_id", vec![1, 2])));
    }
}
