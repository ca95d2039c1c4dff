//! Lifecycle operations over the catalog: create, read, partial update and
//! soft delete, with the invariants each entity type carries.

pub mod associations;
pub mod password;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::curation::curate;
use crate::models::{
    Client, CuratedJobPosition, CuratedPatch, Employee, JobPosition, JobPositionPatch,
    NewJobPosition, Project, User,
};
use crate::store::{Filter, Record, Repository, Store, StoreError, Transaction, Window};

pub use associations::{Include, ProjectView};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("{0}")]
    Conflict(String),
    #[error("store failure: {0}")]
    Store(#[source] StoreError),
}

impl ServiceError {
    /// Outcomes a caller can act on, as opposed to infrastructure failures.
    pub fn is_expected(&self) -> bool {
        !matches!(self, ServiceError::Store(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ForeignKey(detail) => ServiceError::Conflict(detail),
            StoreError::Check(detail) => ServiceError::Validation(detail),
            other => ServiceError::Store(other),
        }
    }
}

fn log_failure(err: &ServiceError) {
    if !err.is_expected() {
        error!(error = %err, "store operation failed");
    }
}

fn fail(err: StoreError) -> ServiceError {
    let err = ServiceError::from(err);
    log_failure(&err);
    err
}

fn not_found<R: Record>(id: i32) -> ServiceError {
    ServiceError::NotFound {
        entity: R::TABLE.label(),
        id,
    }
}

fn require_text(value: &str, field: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), ServiceError> {
    require_text(value, "email")?;
    if !value.contains('@') {
        return Err(ServiceError::Validation(format!("'{value}' is not an email address")));
    }
    Ok(())
}

fn require_rate(value: f64) -> Result<(), ServiceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::Validation(format!(
            "bill_rate must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Entity types whose caller payloads are persisted as-is, after checks.
pub trait DirectWrite: Record {
    fn prepare_new(_new: &mut Self::New) -> Result<(), ServiceError> {
        Ok(())
    }

    fn prepare_patch(_patch: &mut Self::Patch) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Rules that span the stored row and the incoming patch.
    fn check_patch(_current: &Self, _patch: &Self::Patch) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl DirectWrite for User {
    fn prepare_new(new: &mut Self::New) -> Result<(), ServiceError> {
        require_text(&new.name, "name")?;
        require_email(&new.email)?;
        new.password = password::hash_password(&new.password)?;
        Ok(())
    }

    fn prepare_patch(patch: &mut Self::Patch) -> Result<(), ServiceError> {
        if let Some(email) = &patch.email {
            require_email(email)?;
        }
        if let Some(plain) = patch.password.take() {
            patch.password = Some(password::hash_password(&plain)?);
        }
        Ok(())
    }
}

impl DirectWrite for Client {
    fn prepare_new(new: &mut Self::New) -> Result<(), ServiceError> {
        require_text(&new.name, "name")
    }
}

fn require_date_order(posting: NaiveDate, closure: NaiveDate) -> Result<(), ServiceError> {
    if closure < posting {
        return Err(ServiceError::Validation(format!(
            "exp_closure_date {closure} must not precede posting_date {posting}"
        )));
    }
    Ok(())
}

impl DirectWrite for Project {
    fn prepare_new(new: &mut Self::New) -> Result<(), ServiceError> {
        require_text(&new.name, "name")?;
        require_date_order(new.posting_date, new.exp_closure_date)
    }

    fn prepare_patch(patch: &mut Self::Patch) -> Result<(), ServiceError> {
        match &patch.name {
            Some(name) => require_text(name, "name"),
            None => Ok(()),
        }
    }

    fn check_patch(current: &Self, patch: &Self::Patch) -> Result<(), ServiceError> {
        require_date_order(
            patch.posting_date.unwrap_or(current.posting_date),
            patch.exp_closure_date.unwrap_or(current.exp_closure_date),
        )
    }
}

impl DirectWrite for Employee {
    fn prepare_new(new: &mut Self::New) -> Result<(), ServiceError> {
        require_text(&new.name, "name")?;
        require_email(&new.email)
    }

    fn prepare_patch(patch: &mut Self::Patch) -> Result<(), ServiceError> {
        match &patch.email {
            Some(email) => require_email(email),
            None => Ok(()),
        }
    }
}

/// Entry point for every catalog operation.
pub struct CatalogService<S> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create<R: DirectWrite>(&self, mut new: R::New) -> Result<R, ServiceError> {
        R::prepare_new(&mut new)?;
        let record = self.store.insert::<R>(new).await.map_err(fail)?;
        info!(table = %R::TABLE, id = record.id(), "created");
        Ok(record)
    }

    /// Fetch by id. Soft-deleted rows are still returned.
    pub async fn get<R: Record>(&self, id: i32) -> Result<R, ServiceError> {
        self.store
            .find_by_id::<R>(id)
            .await
            .map_err(fail)?
            .ok_or_else(|| not_found::<R>(id))
    }

    pub async fn list<R: Record>(
        &self,
        filter: &Filter,
        window: Window,
    ) -> Result<Vec<R>, ServiceError> {
        self.store.find_all::<R>(filter, window).await.map_err(fail)
    }

    pub async fn update<R: DirectWrite>(
        &self,
        id: i32,
        mut patch: R::Patch,
    ) -> Result<R, ServiceError> {
        R::prepare_patch(&mut patch)?;

        let tx = self.store.begin().await.map_err(fail)?;
        let current = tx
            .find_for_share::<R>(id)
            .await
            .map_err(fail)?
            .ok_or_else(|| not_found::<R>(id))?;
        R::check_patch(&current, &patch)?;
        let record = tx
            .update_where::<R>(id, patch)
            .await
            .map_err(fail)?
            .ok_or_else(|| not_found::<R>(id))?;
        tx.commit().await.map_err(fail)?;
        info!(table = %R::TABLE, id, "updated");
        Ok(record)
    }

    /// Mark a row inactive. A row that is missing or already inactive is
    /// `NotFound`.
    pub async fn soft_delete<R: Record>(&self, id: i32) -> Result<(), ServiceError> {
        let affected = self.store.deactivate::<R>(id).await.map_err(fail)?;
        if affected == 0 {
            return Err(not_found::<R>(id));
        }
        info!(table = %R::TABLE, id, "soft deleted");
        Ok(())
    }

    /// Create a job position with its curation computed from the client.
    /// Client lookup and insert share one transaction.
    pub async fn create_job_position(
        &self,
        new: NewJobPosition,
    ) -> Result<JobPosition, ServiceError> {
        require_text(&new.name, "name")?;
        require_rate(new.bill_rate)?;

        let tx = self.store.begin().await.map_err(fail)?;
        let curation = curate(&tx, new.client_id, new.exclusivity)
            .await
            .inspect_err(log_failure)?;
        let position = tx
            .insert::<JobPosition>(CuratedJobPosition::new(new, curation))
            .await
            .map_err(fail)?;
        tx.commit().await.map_err(fail)?;

        info!(
            id = position.id,
            client_id = position.client_id,
            curation = %position.demand_curation,
            "job position created"
        );
        Ok(position)
    }

    /// Partial update. Curation is recomputed only when the patch carries both
    /// `client_id` and `exclusivity`; otherwise the stored value stands.
    pub async fn update_job_position(
        &self,
        id: i32,
        patch: JobPositionPatch,
    ) -> Result<JobPosition, ServiceError> {
        if let Some(rate) = patch.bill_rate {
            require_rate(rate)?;
        }
        if let Some(name) = &patch.name {
            require_text(name, "name")?;
        }

        let tx = self.store.begin().await.map_err(fail)?;
        let curation = match (patch.client_id, patch.exclusivity) {
            (Some(client_id), Some(exclusivity)) => Some(
                curate(&tx, client_id, exclusivity)
                    .await
                    .inspect_err(log_failure)?,
            ),
            (Some(_), None) | (None, Some(_)) => {
                warn!(id, "partial curation inputs; keeping stored demand curation");
                None
            }
            (None, None) => None,
        };

        let position = tx
            .update_where::<JobPosition>(id, CuratedPatch::new(patch, curation))
            .await
            .map_err(fail)?
            .ok_or_else(|| not_found::<JobPosition>(id))?;
        tx.commit().await.map_err(fail)?;

        info!(id, curation = %position.demand_curation, "job position updated");
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientPatch, NewClient, NewUser, UserPatch};
    use crate::store::MemoryStore;

    fn service() -> CatalogService<MemoryStore> {
        CatalogService::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn user_passwords_are_hashed_on_write() {
        let service = service();
        let user: User = service
            .create::<User>(NewUser {
                name: "Grace".into(),
                email: "grace@example.com".into(),
                password: "s3cret".into(),
                role: "admin".into(),
            })
            .await
            .unwrap();

        assert_ne!(user.password, "s3cret");
        assert!(password::verify_password("s3cret", &user.password));

        let updated: User = service
            .update::<User>(
                user.id,
                UserPatch {
                    password: Some("rotated".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(password::verify_password("rotated", &updated.password));

        let json = serde_json::to_value(&updated).unwrap();
        assert!(json.get("password").is_none());
    }

    #[tokio::test]
    async fn blank_names_are_validation_errors() {
        let service = service();
        let err = service
            .create::<Client>(NewClient {
                name: "  ".into(),
                high_growth: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(err.is_expected());
    }

    #[tokio::test]
    async fn update_keeps_soft_deleted_rows_inactive() {
        let service = service();
        let client: Client = service
            .create::<Client>(NewClient {
                name: "Initech".into(),
                high_growth: false,
            })
            .await
            .unwrap();
        service.soft_delete::<Client>(client.id).await.unwrap();

        let renamed: Client = service
            .update::<Client>(
                client.id,
                ClientPatch {
                    name: Some("Initrode".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(renamed.name, "Initrode");
        assert!(!renamed.audit.active);
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let service = service();
        let err = service.get::<Employee>(9).await.unwrap_err();
        assert_eq!(err.to_string(), "employee 9 not found");

        let err = service
            .update::<Client>(9, ClientPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "client", id: 9 }));
    }

    #[test]
    fn foreign_key_failures_become_conflicts() {
        let err = ServiceError::from(StoreError::ForeignKey("user 3 does not exist".into()));
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn check_violations_become_validation_errors() {
        let err = ServiceError::from(StoreError::Check("projects_check".into()));
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(err.is_expected());
    }
}
