use serde::{Deserialize, Serialize};

use super::Audit;
use crate::curation::{DemandCuration, Exclusivity};
use crate::store::{ColumnSet, Columns, Record, Table};

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct JobPosition {
    pub id: i32,
    pub name: String,
    pub bill_rate: f64,
    pub posting_type: String,
    pub division: String,
    pub skills: Vec<String>,
    pub region: String,
    #[sqlx(try_from = "String")]
    pub exclusivity: Exclusivity,
    /// Derived from the client's growth tier and `exclusivity` at write time.
    #[sqlx(try_from = "String")]
    pub demand_curation: DemandCuration,
    pub cross_division: bool,
    pub image: Option<String>,
    pub client_id: i32,
    pub project_id: Option<i32>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

/// Caller input for a new position. Curation is not part of it.
#[derive(Deserialize, Debug, Clone)]
pub struct NewJobPosition {
    pub name: String,
    #[serde(default)]
    pub bill_rate: f64,
    #[serde(default)]
    pub posting_type: String,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub region: String,
    pub exclusivity: Exclusivity,
    #[serde(default)]
    pub cross_division: bool,
    #[serde(default)]
    pub image: Option<String>,
    pub client_id: i32,
    #[serde(default)]
    pub project_id: Option<i32>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct JobPositionPatch {
    pub name: Option<String>,
    pub bill_rate: Option<f64>,
    pub posting_type: Option<String>,
    pub division: Option<String>,
    pub skills: Option<Vec<String>>,
    pub region: Option<String>,
    pub exclusivity: Option<Exclusivity>,
    pub cross_division: Option<bool>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub image: Option<Option<String>>,
    pub client_id: Option<i32>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub project_id: Option<Option<i32>>,
}

/// A new position paired with its computed curation. Only the lifecycle
/// service can build one.
#[derive(Debug, Clone)]
pub struct CuratedJobPosition {
    position: NewJobPosition,
    demand_curation: DemandCuration,
}

impl CuratedJobPosition {
    pub(crate) fn new(position: NewJobPosition, demand_curation: DemandCuration) -> Self {
        Self {
            position,
            demand_curation,
        }
    }
}

/// A patch plus a recomputed curation, when one was due.
#[derive(Debug, Clone)]
pub struct CuratedPatch {
    patch: JobPositionPatch,
    demand_curation: Option<DemandCuration>,
}

impl CuratedPatch {
    pub(crate) fn new(patch: JobPositionPatch, demand_curation: Option<DemandCuration>) -> Self {
        Self {
            patch,
            demand_curation,
        }
    }
}

impl Columns for CuratedJobPosition {
    fn columns(&self) -> ColumnSet {
        let p = &self.position;
        ColumnSet::new()
            .set("name", &p.name)
            .set("bill_rate", &p.bill_rate)
            .set("posting_type", &p.posting_type)
            .set("division", &p.division)
            .set("skills", &p.skills)
            .set("region", &p.region)
            .set("exclusivity", &p.exclusivity.as_str().to_string())
            .set("demand_curation", &self.demand_curation.as_str().to_string())
            .set("cross_division", &p.cross_division)
            .set("image", &p.image)
            .set("client_id", &p.client_id)
            .set("project_id", &p.project_id)
    }

    fn references(&self) -> Vec<(Table, i32)> {
        let mut refs = vec![(Table::Clients, self.position.client_id)];
        if let Some(project_id) = self.position.project_id {
            refs.push((Table::Projects, project_id));
        }
        refs
    }
}

impl Columns for CuratedPatch {
    fn columns(&self) -> ColumnSet {
        let p = &self.patch;
        ColumnSet::new()
            .set_some("name", &p.name)
            .set_some("bill_rate", &p.bill_rate)
            .set_some("posting_type", &p.posting_type)
            .set_some("division", &p.division)
            .set_some("skills", &p.skills)
            .set_some("region", &p.region)
            .set_some("exclusivity", &p.exclusivity.map(|e| e.as_str().to_string()))
            .set_some(
                "demand_curation",
                &self.demand_curation.map(|c| c.as_str().to_string()),
            )
            .set_some("cross_division", &p.cross_division)
            .set_some("image", &p.image)
            .set_some("client_id", &p.client_id)
            .set_some("project_id", &p.project_id)
    }

    fn references(&self) -> Vec<(Table, i32)> {
        let mut refs = Vec::new();
        if let Some(client_id) = self.patch.client_id {
            refs.push((Table::Clients, client_id));
        }
        if let Some(Some(project_id)) = self.patch.project_id {
            refs.push((Table::Projects, project_id));
        }
        refs
    }
}

impl Record for JobPosition {
    const TABLE: Table = Table::JobPositions;

    type New = CuratedJobPosition;
    type Patch = CuratedPatch;

    fn id(&self) -> i32 {
        self.id
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn build(id: i32, new: CuratedJobPosition, audit: Audit) -> Self {
        let p = new.position;
        Self {
            id,
            name: p.name,
            bill_rate: p.bill_rate,
            posting_type: p.posting_type,
            division: p.division,
            skills: p.skills,
            region: p.region,
            exclusivity: p.exclusivity,
            demand_curation: new.demand_curation,
            cross_division: p.cross_division,
            image: p.image,
            client_id: p.client_id,
            project_id: p.project_id,
            audit,
        }
    }

    fn merge(&mut self, curated: CuratedPatch) {
        let p = curated.patch;
        if let Some(name) = p.name {
            self.name = name;
        }
        if let Some(bill_rate) = p.bill_rate {
            self.bill_rate = bill_rate;
        }
        if let Some(posting_type) = p.posting_type {
            self.posting_type = posting_type;
        }
        if let Some(division) = p.division {
            self.division = division;
        }
        if let Some(skills) = p.skills {
            self.skills = skills;
        }
        if let Some(region) = p.region {
            self.region = region;
        }
        if let Some(exclusivity) = p.exclusivity {
            self.exclusivity = exclusivity;
        }
        if let Some(demand_curation) = curated.demand_curation {
            self.demand_curation = demand_curation;
        }
        if let Some(cross_division) = p.cross_division {
            self.cross_division = cross_division;
        }
        if let Some(image) = p.image {
            self.image = image;
        }
        if let Some(client_id) = p.client_id {
            self.client_id = client_id;
        }
        if let Some(project_id) = p.project_id {
            self.project_id = project_id;
        }
    }

    fn reference(&self, column: &str) -> Option<i32> {
        match column {
            "client_id" => Some(self.client_id),
            "project_id" => self.project_id,
            _ => None,
        }
    }
}
