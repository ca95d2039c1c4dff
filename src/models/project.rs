use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Audit;
use crate::store::{ColumnSet, Columns, Record, Table};

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub status: i32,
    pub revenue: f64,
    pub region: String,
    pub posting_date: NaiveDate,
    pub exp_closure_date: NaiveDate,
    pub image: Option<String>,
    /// Owning user.
    pub user_id: i32,
    pub client_id: i32,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub revenue: f64,
    pub region: String,
    pub posting_date: NaiveDate,
    pub exp_closure_date: NaiveDate,
    #[serde(default)]
    pub image: Option<String>,
    pub user_id: i32,
    pub client_id: i32,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub status: Option<i32>,
    pub revenue: Option<f64>,
    pub region: Option<String>,
    pub posting_date: Option<NaiveDate>,
    pub exp_closure_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub image: Option<Option<String>>,
    pub user_id: Option<i32>,
    pub client_id: Option<i32>,
}

impl Columns for NewProject {
    fn columns(&self) -> ColumnSet {
        ColumnSet::new()
            .set("name", &self.name)
            .set("status", &self.status)
            .set("revenue", &self.revenue)
            .set("region", &self.region)
            .set("posting_date", &self.posting_date)
            .set("exp_closure_date", &self.exp_closure_date)
            .set("image", &self.image)
            .set("user_id", &self.user_id)
            .set("client_id", &self.client_id)
    }

    fn references(&self) -> Vec<(Table, i32)> {
        vec![(Table::Users, self.user_id), (Table::Clients, self.client_id)]
    }
}

impl Columns for ProjectPatch {
    fn columns(&self) -> ColumnSet {
        ColumnSet::new()
            .set_some("name", &self.name)
            .set_some("status", &self.status)
            .set_some("revenue", &self.revenue)
            .set_some("region", &self.region)
            .set_some("posting_date", &self.posting_date)
            .set_some("exp_closure_date", &self.exp_closure_date)
            .set_some("image", &self.image)
            .set_some("user_id", &self.user_id)
            .set_some("client_id", &self.client_id)
    }

    fn references(&self) -> Vec<(Table, i32)> {
        let mut refs = Vec::new();
        if let Some(user_id) = self.user_id {
            refs.push((Table::Users, user_id));
        }
        if let Some(client_id) = self.client_id {
            refs.push((Table::Clients, client_id));
        }
        refs
    }
}

impl Record for Project {
    const TABLE: Table = Table::Projects;

    type New = NewProject;
    type Patch = ProjectPatch;

    fn id(&self) -> i32 {
        self.id
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn build(id: i32, new: NewProject, audit: Audit) -> Self {
        Self {
            id,
            name: new.name,
            status: new.status,
            revenue: new.revenue,
            region: new.region,
            posting_date: new.posting_date,
            exp_closure_date: new.exp_closure_date,
            image: new.image,
            user_id: new.user_id,
            client_id: new.client_id,
            audit,
        }
    }

    fn merge(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(revenue) = patch.revenue {
            self.revenue = revenue;
        }
        if let Some(region) = patch.region {
            self.region = region;
        }
        if let Some(posting_date) = patch.posting_date {
            self.posting_date = posting_date;
        }
        if let Some(exp_closure_date) = patch.exp_closure_date {
            self.exp_closure_date = exp_closure_date;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(user_id) = patch.user_id {
            self.user_id = user_id;
        }
        if let Some(client_id) = patch.client_id {
            self.client_id = client_id;
        }
    }

    fn reference(&self, column: &str) -> Option<i32> {
        match column {
            "user_id" => Some(self.user_id),
            "client_id" => Some(self.client_id),
            _ => None,
        }
    }
}
