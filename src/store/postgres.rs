use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, Postgres, QueryBuilder};
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    Columns, Filter, Record, Repository, Store, StoreError, Transaction, Value, Window,
};
use crate::config::Config;

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store with a connection pool
    pub async fn connect(url: &str, config: &Config) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: Value) {
    match value {
        Value::Int(v) => qb.push_bind(v),
        Value::OptInt(v) => qb.push_bind(v),
        Value::BigInt(v) => qb.push_bind(v),
        Value::Float(v) => qb.push_bind(v),
        Value::Bool(v) => qb.push_bind(v),
        Value::Text(v) => qb.push_bind(v),
        Value::OptText(v) => qb.push_bind(v),
        Value::Date(v) => qb.push_bind(v),
        Value::TextList(v) => qb.push_bind(v),
    };
}

async fn insert_row<'e, R, E>(executor: E, new: &R::New) -> Result<R, StoreError>
where
    R: Record,
    E: Executor<'e, Database = Postgres>,
{
    let columns = new.columns().into_inner();

    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
    qb.push(R::TABLE.name()).push(" (");
    for (column, _) in &columns {
        qb.push(*column).push(", ");
    }
    qb.push("active) VALUES (");
    for (_, value) in columns {
        push_value(&mut qb, value);
        qb.push(", ");
    }
    qb.push("TRUE) RETURNING *");

    debug!(table = %R::TABLE, "insert");
    let record = qb.build_query_as::<R>().fetch_one(executor).await?;
    Ok(record)
}

async fn select_by_id<'e, R, E>(executor: E, id: i32, for_share: bool) -> Result<Option<R>, StoreError>
where
    R: Record,
    E: Executor<'e, Database = Postgres>,
{
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM ");
    qb.push(R::TABLE.name()).push(" WHERE id = ").push_bind(id);
    if for_share {
        qb.push(" FOR SHARE");
    }

    let record = qb.build_query_as::<R>().fetch_optional(executor).await?;
    Ok(record)
}

async fn select_all<'e, R, E>(executor: E, filter: &Filter, window: Window) -> Result<Vec<R>, StoreError>
where
    R: Record,
    E: Executor<'e, Database = Postgres>,
{
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM ");
    qb.push(R::TABLE.name()).push(" WHERE TRUE");
    if !filter.include_inactive {
        qb.push(" AND active");
    }
    if let Some((column, ids)) = &filter.member_of {
        qb.push(" AND ")
            .push(*column)
            .push(" = ANY(")
            .push_bind(ids.clone())
            .push(")");
    }
    qb.push(" ORDER BY id ASC");
    if let Some(offset) = window.offset {
        qb.push(" OFFSET ").push_bind(i64::from(offset));
    }
    if let Some(limit) = window.limit {
        qb.push(" LIMIT ").push_bind(i64::from(limit));
    }

    let records = qb.build_query_as::<R>().fetch_all(executor).await?;
    Ok(records)
}

async fn update_row<'e, R, E>(executor: E, id: i32, patch: &R::Patch) -> Result<Option<R>, StoreError>
where
    R: Record,
    E: Executor<'e, Database = Postgres>,
{
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
    qb.push(R::TABLE.name()).push(" SET updated_at = now()");
    for (column, value) in patch.columns().into_inner() {
        qb.push(", ").push(column).push(" = ");
        push_value(&mut qb, value);
    }
    qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

    debug!(table = %R::TABLE, id, "update");
    let record = qb.build_query_as::<R>().fetch_optional(executor).await?;
    Ok(record)
}

async fn deactivate_row<'e, R, E>(executor: E, id: i32) -> Result<u64, StoreError>
where
    R: Record,
    E: Executor<'e, Database = Postgres>,
{
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
    qb.push(R::TABLE.name())
        .push(" SET active = FALSE, updated_at = now(), deleted_at = now() WHERE id = ")
        .push_bind(id)
        .push(" AND active");

    let result = qb.build().execute(executor).await?;
    Ok(result.rows_affected())
}

#[async_trait]
impl Repository for PgStore {
    async fn insert<R: Record>(&self, new: R::New) -> Result<R, StoreError> {
        insert_row::<R, _>(&self.pool, &new).await
    }

    async fn find_by_id<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError> {
        select_by_id::<R, _>(&self.pool, id, false).await
    }

    async fn find_for_share<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError> {
        // Outside a transaction the lock would be released immediately.
        select_by_id::<R, _>(&self.pool, id, false).await
    }

    async fn find_all<R: Record>(
        &self,
        filter: &Filter,
        window: Window,
    ) -> Result<Vec<R>, StoreError> {
        select_all::<R, _>(&self.pool, filter, window).await
    }

    async fn update_where<R: Record>(
        &self,
        id: i32,
        patch: R::Patch,
    ) -> Result<Option<R>, StoreError> {
        update_row::<R, _>(&self.pool, id, &patch).await
    }

    async fn deactivate<R: Record>(&self, id: i32) -> Result<u64, StoreError> {
        deactivate_row::<R, _>(&self.pool, id).await
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx: Mutex::new(tx) })
    }
}

/// An open database transaction. Rolled back on drop unless committed.
pub struct PgTx {
    tx: Mutex<sqlx::Transaction<'static, Postgres>>,
}

#[async_trait]
impl Repository for PgTx {
    async fn insert<R: Record>(&self, new: R::New) -> Result<R, StoreError> {
        let mut tx = self.tx.lock().await;
        insert_row::<R, _>(&mut **tx, &new).await
    }

    async fn find_by_id<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError> {
        let mut tx = self.tx.lock().await;
        select_by_id::<R, _>(&mut **tx, id, false).await
    }

    async fn find_for_share<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError> {
        let mut tx = self.tx.lock().await;
        select_by_id::<R, _>(&mut **tx, id, true).await
    }

    async fn find_all<R: Record>(
        &self,
        filter: &Filter,
        window: Window,
    ) -> Result<Vec<R>, StoreError> {
        let mut tx = self.tx.lock().await;
        select_all::<R, _>(&mut **tx, filter, window).await
    }

    async fn update_where<R: Record>(
        &self,
        id: i32,
        patch: R::Patch,
    ) -> Result<Option<R>, StoreError> {
        let mut tx = self.tx.lock().await;
        update_row::<R, _>(&mut **tx, id, &patch).await
    }

    async fn deactivate<R: Record>(&self, id: i32) -> Result<u64, StoreError> {
        let mut tx = self.tx.lock().await;
        deactivate_row::<R, _>(&mut **tx, id).await
    }
}

#[async_trait]
impl Transaction for PgTx {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }
}
