use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Audit;
use crate::store::{ColumnSet, Columns, Record, Table};

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub status: String,
    pub email: String,
    pub cellphone: Option<i64>,
    pub job_title: String,
    pub job_grade: String,
    pub joining_date: NaiveDate,
    pub division: String,
    pub tech_stack: String,
    pub gender: String,
    pub skills: Vec<String>,
    pub proposed_action: Option<String>,
    pub reason_current_state: Option<String>,
    pub image_url: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    #[serde(default)]
    pub status: String,
    pub email: String,
    #[serde(default)]
    pub cellphone: Option<i64>,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_grade: String,
    pub joining_date: NaiveDate,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub tech_stack: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub proposed_action: Option<String>,
    #[serde(default)]
    pub reason_current_state: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub status: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub cellphone: Option<Option<i64>>,
    pub job_title: Option<String>,
    pub job_grade: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub division: Option<String>,
    pub tech_stack: Option<String>,
    pub gender: Option<String>,
    pub skills: Option<Vec<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub proposed_action: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub reason_current_state: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub image_url: Option<Option<String>>,
}

impl Columns for NewEmployee {
    fn columns(&self) -> ColumnSet {
        ColumnSet::new()
            .set("name", &self.name)
            .set("status", &self.status)
            .set("email", &self.email)
            .set("cellphone", &self.cellphone)
            .set("job_title", &self.job_title)
            .set("job_grade", &self.job_grade)
            .set("joining_date", &self.joining_date)
            .set("division", &self.division)
            .set("tech_stack", &self.tech_stack)
            .set("gender", &self.gender)
            .set("skills", &self.skills)
            .set("proposed_action", &self.proposed_action)
            .set("reason_current_state", &self.reason_current_state)
            .set("image_url", &self.image_url)
    }
}

impl Columns for EmployeePatch {
    fn columns(&self) -> ColumnSet {
        ColumnSet::new()
            .set_some("name", &self.name)
            .set_some("status", &self.status)
            .set_some("email", &self.email)
            .set_some("cellphone", &self.cellphone)
            .set_some("job_title", &self.job_title)
            .set_some("job_grade", &self.job_grade)
            .set_some("joining_date", &self.joining_date)
            .set_some("division", &self.division)
            .set_some("tech_stack", &self.tech_stack)
            .set_some("gender", &self.gender)
            .set_some("skills", &self.skills)
            .set_some("proposed_action", &self.proposed_action)
            .set_some("reason_current_state", &self.reason_current_state)
            .set_some("image_url", &self.image_url)
    }
}

impl Record for Employee {
    const TABLE: Table = Table::Employees;

    type New = NewEmployee;
    type Patch = EmployeePatch;

    fn id(&self) -> i32 {
        self.id
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn build(id: i32, new: NewEmployee, audit: Audit) -> Self {
        Self {
            id,
            name: new.name,
            status: new.status,
            email: new.email,
            cellphone: new.cellphone,
            job_title: new.job_title,
            job_grade: new.job_grade,
            joining_date: new.joining_date,
            division: new.division,
            tech_stack: new.tech_stack,
            gender: new.gender,
            skills: new.skills,
            proposed_action: new.proposed_action,
            reason_current_state: new.reason_current_state,
            image_url: new.image_url,
            audit,
        }
    }

    fn merge(&mut self, patch: EmployeePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(cellphone) = patch.cellphone {
            self.cellphone = cellphone;
        }
        if let Some(job_title) = patch.job_title {
            self.job_title = job_title;
        }
        if let Some(job_grade) = patch.job_grade {
            self.job_grade = job_grade;
        }
        if let Some(joining_date) = patch.joining_date {
            self.joining_date = joining_date;
        }
        if let Some(division) = patch.division {
            self.division = division;
        }
        if let Some(tech_stack) = patch.tech_stack {
            self.tech_stack = tech_stack;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(skills) = patch.skills {
            self.skills = skills;
        }
        if let Some(proposed_action) = patch.proposed_action {
            self.proposed_action = proposed_action;
        }
        if let Some(reason) = patch.reason_current_state {
            self.reason_current_state = reason;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
    }
}
