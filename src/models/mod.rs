mod client;
mod employee;
mod job_position;
mod project;
mod user;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use client::{Client, ClientPatch, NewClient};
pub use employee::{Employee, EmployeePatch, NewEmployee};
pub use job_position::{CuratedJobPosition, CuratedPatch, JobPosition, JobPositionPatch, NewJobPosition};
pub use project::{NewProject, Project, ProjectPatch};
pub use user::{NewUser, User, UserPatch};

/// System-managed lifecycle columns shared by every table.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Audit {
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Audit {
    /// A freshly created, active row.
    pub fn created_at(now: DateTime<Utc>) -> Self {
        Self {
            active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Patch fields that may be cleared: an absent key stays `None`, an explicit
/// `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
