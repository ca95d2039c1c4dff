use serde::{Deserialize, Serialize};

use super::Audit;
use crate::store::{ColumnSet, Columns, Record, Table};

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never the clear-text password.
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl Columns for NewUser {
    fn columns(&self) -> ColumnSet {
        ColumnSet::new()
            .set("name", &self.name)
            .set("email", &self.email)
            .set("password", &self.password)
            .set("role", &self.role)
    }
}

impl Columns for UserPatch {
    fn columns(&self) -> ColumnSet {
        ColumnSet::new()
            .set_some("name", &self.name)
            .set_some("email", &self.email)
            .set_some("password", &self.password)
            .set_some("role", &self.role)
    }
}

impl Record for User {
    const TABLE: Table = Table::Users;

    type New = NewUser;
    type Patch = UserPatch;

    fn id(&self) -> i32 {
        self.id
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn build(id: i32, new: NewUser, audit: Audit) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            password: new.password,
            role: new.role,
            audit,
        }
    }

    fn merge(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
    }
}
