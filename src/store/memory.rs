//! In-process store. Used when no database is configured, and by tests.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    Columns, Filter, Record, Repository, Store, StoreError, Table, Transaction, Window,
};
use crate::models::Audit;

type Row = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Default)]
struct Tables {
    rows: HashMap<Table, BTreeMap<i32, Row>>,
    next_id: HashMap<Table, i32>,
    clock: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing wall-clock timestamp.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(stamp);
        stamp
    }

    fn exists(&self, table: Table, id: i32) -> bool {
        self.rows
            .get(&table)
            .is_some_and(|rows| rows.contains_key(&id))
    }

    fn check_references(&self, references: Vec<(Table, i32)>) -> Result<(), StoreError> {
        for (table, id) in references {
            if !self.exists(table, id) {
                return Err(StoreError::ForeignKey(format!(
                    "{} {} does not exist",
                    table.label(),
                    id
                )));
            }
        }
        Ok(())
    }

    fn get<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError> {
        let Some(row) = self.rows.get(&R::TABLE).and_then(|rows| rows.get(&id)) else {
            return Ok(None);
        };
        row.downcast_ref::<R>()
            .cloned()
            .map(Some)
            .ok_or(StoreError::Corrupt { table: R::TABLE, id })
    }

    fn put<R: Record>(&mut self, record: R) {
        self.rows
            .entry(R::TABLE)
            .or_default()
            .insert(record.id(), Arc::new(record));
    }

    fn insert<R: Record>(&mut self, new: R::New) -> Result<R, StoreError> {
        self.check_references(new.references())?;

        let next = self.next_id.entry(R::TABLE).or_insert(0);
        *next += 1;
        let id = *next;

        let now = self.tick();
        let record = R::build(id, new, Audit::created_at(now));
        self.put(record.clone());
        Ok(record)
    }

    fn find_all<R: Record>(&self, filter: &Filter, window: Window) -> Result<Vec<R>, StoreError> {
        let Some(rows) = self.rows.get(&R::TABLE) else {
            return Ok(Vec::new());
        };

        let mut matched = Vec::new();
        for (id, row) in rows {
            let record = row
                .downcast_ref::<R>()
                .ok_or(StoreError::Corrupt { table: R::TABLE, id: *id })?;
            if !filter.include_inactive && !record.is_active() {
                continue;
            }
            if let Some((column, ids)) = &filter.member_of {
                match record.reference(column) {
                    Some(value) if ids.contains(&value) => {}
                    _ => continue,
                }
            }
            matched.push(record.clone());
        }

        let offset = window.offset.unwrap_or(0) as usize;
        let limit = window.limit.map_or(usize::MAX, |l| l as usize);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    fn update<R: Record>(&mut self, id: i32, patch: R::Patch) -> Result<Option<R>, StoreError> {
        let Some(mut record) = self.get::<R>(id)? else {
            return Ok(None);
        };
        self.check_references(patch.references())?;

        record.merge(patch);
        record.audit_mut().updated_at = self.tick();
        self.put(record.clone());
        Ok(Some(record))
    }

    fn deactivate<R: Record>(&mut self, id: i32) -> Result<u64, StoreError> {
        let Some(mut record) = self.get::<R>(id)? else {
            return Ok(0);
        };
        if !record.is_active() {
            return Ok(0);
        }

        let now = self.tick();
        let audit = record.audit_mut();
        audit.active = false;
        audit.updated_at = now;
        audit.deleted_at = Some(now);
        self.put(record);
        Ok(1)
    }
}

/// Shared in-memory tables. Cloning yields another handle to the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn insert<R: Record>(&self, new: R::New) -> Result<R, StoreError> {
        self.tables.lock().await.insert::<R>(new)
    }

    async fn find_by_id<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError> {
        self.tables.lock().await.get::<R>(id)
    }

    async fn find_for_share<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError> {
        self.tables.lock().await.get::<R>(id)
    }

    async fn find_all<R: Record>(
        &self,
        filter: &Filter,
        window: Window,
    ) -> Result<Vec<R>, StoreError> {
        self.tables.lock().await.find_all::<R>(filter, window)
    }

    async fn update_where<R: Record>(
        &self,
        id: i32,
        patch: R::Patch,
    ) -> Result<Option<R>, StoreError> {
        self.tables.lock().await.update::<R>(id, patch)
    }

    async fn deactivate<R: Record>(&self, id: i32) -> Result<u64, StoreError> {
        self.tables.lock().await.deactivate::<R>(id)
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = Tables::clone(&guard);
        Ok(MemoryTx {
            guard,
            working: Mutex::new(working),
        })
    }
}

/// Holds the store lock for its whole lifetime; writes land on a working
/// copy that replaces the shared tables on commit.
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Mutex<Tables>,
}

#[async_trait]
impl Repository for MemoryTx {
    async fn insert<R: Record>(&self, new: R::New) -> Result<R, StoreError> {
        self.working.lock().await.insert::<R>(new)
    }

    async fn find_by_id<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError> {
        self.working.lock().await.get::<R>(id)
    }

    async fn find_for_share<R: Record>(&self, id: i32) -> Result<Option<R>, StoreError> {
        self.working.lock().await.get::<R>(id)
    }

    async fn find_all<R: Record>(
        &self,
        filter: &Filter,
        window: Window,
    ) -> Result<Vec<R>, StoreError> {
        self.working.lock().await.find_all::<R>(filter, window)
    }

    async fn update_where<R: Record>(
        &self,
        id: i32,
        patch: R::Patch,
    ) -> Result<Option<R>, StoreError> {
        self.working.lock().await.update::<R>(id, patch)
    }

    async fn deactivate<R: Record>(&self, id: i32) -> Result<u64, StoreError> {
        self.working.lock().await.deactivate::<R>(id)
    }
}

#[async_trait]
impl Transaction for MemoryTx {
    async fn commit(self) -> Result<(), StoreError> {
        let MemoryTx { mut guard, working } = self;
        *guard = working.into_inner();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, ClientPatch, NewClient};

    fn client(name: &str) -> NewClient {
        NewClient {
            name: name.to_string(),
            high_growth: false,
        }
    }

    #[tokio::test]
    async fn ids_follow_insertion_order() {
        let store = MemoryStore::new();
        let a: Client = store.insert::<Client>(client("a")).await.unwrap();
        let b: Client = store.insert::<Client>(client("b")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(a.audit.active);
        assert!(b.audit.created_at > a.audit.created_at);
    }

    #[tokio::test]
    async fn deactivate_matches_active_rows_only() {
        let store = MemoryStore::new();
        let a: Client = store.insert::<Client>(client("a")).await.unwrap();

        assert_eq!(store.deactivate::<Client>(a.id).await.unwrap(), 1);
        assert_eq!(store.deactivate::<Client>(a.id).await.unwrap(), 0);
        assert_eq!(store.deactivate::<Client>(99).await.unwrap(), 0);

        let stored = store.find_by_id::<Client>(a.id).await.unwrap().unwrap();
        assert!(!stored.audit.active);
        assert!(stored.audit.deleted_at.is_some());
    }

    #[tokio::test]
    async fn listing_hides_inactive_rows_by_default() {
        let store = MemoryStore::new();
        for name in ["a", "b", "c"] {
            store.insert::<Client>(client(name)).await.unwrap();
        }
        store.deactivate::<Client>(2).await.unwrap();

        let active: Vec<Client> = store.find_all(&Filter::active(), Window::all()).await.unwrap();
        let all: Vec<Client> = store
            .find_all(&Filter::everything(), Window::all())
            .await
            .unwrap();

        assert_eq!(active.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_none() {
        let store = MemoryStore::new();
        let patch = ClientPatch {
            name: Some("x".into()),
            ..Default::default()
        };
        assert!(store.update_where::<Client>(5, patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        {
            let tx = store.begin().await.unwrap();
            tx.insert::<Client>(client("ghost")).await.unwrap();
        }
        let rows: Vec<Client> = store.find_all(&Filter::everything(), Window::all()).await.unwrap();
        assert!(rows.is_empty());

        let tx = store.begin().await.unwrap();
        tx.insert::<Client>(client("kept")).await.unwrap();
        tx.commit().await.unwrap();

        let rows: Vec<Client> = store.find_all(&Filter::everything(), Window::all()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "kept");
    }
}
