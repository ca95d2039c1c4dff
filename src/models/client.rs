use serde::{Deserialize, Serialize};

use super::Audit;
use crate::store::{ColumnSet, Columns, Record, Table};

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Client {
    pub id: i32,
    pub name: String,
    /// Strategically prioritized account; drives demand curation.
    pub high_growth: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub high_growth: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub high_growth: Option<bool>,
}

impl Columns for NewClient {
    fn columns(&self) -> ColumnSet {
        ColumnSet::new()
            .set("name", &self.name)
            .set("high_growth", &self.high_growth)
    }
}

impl Columns for ClientPatch {
    fn columns(&self) -> ColumnSet {
        ColumnSet::new()
            .set_some("name", &self.name)
            .set_some("high_growth", &self.high_growth)
    }
}

impl Record for Client {
    const TABLE: Table = Table::Clients;

    type New = NewClient;
    type Patch = ClientPatch;

    fn id(&self) -> i32 {
        self.id
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn build(id: i32, new: NewClient, audit: Audit) -> Self {
        Self {
            id,
            name: new.name,
            high_growth: new.high_growth,
            audit,
        }
    }

    fn merge(&mut self, patch: ClientPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(high_growth) = patch.high_growth {
            self.high_growth = high_growth;
        }
    }
}
