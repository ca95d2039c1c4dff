//! Project reads with optional eager loading of job positions.

use std::collections::HashMap;

use serde::Serialize;

use super::{CatalogService, ServiceError, fail};
use crate::models::{JobPosition, Project};
use crate::store::{Filter, Repository, Store, Window};

/// What to load alongside a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    pub job_positions: bool,
    /// Also return soft-deleted related rows.
    pub inactive: bool,
}

impl Include {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn job_positions() -> Self {
        Self {
            job_positions: true,
            inactive: false,
        }
    }

    pub fn with_inactive(mut self, inactive: bool) -> Self {
        self.inactive = inactive;
        self
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_positions: Option<Vec<JobPosition>>,
}

/// Attach related job positions in one batched read.
async fn resolve<R: Repository>(
    repo: &R,
    projects: Vec<Project>,
    include: Include,
) -> Result<Vec<ProjectView>, ServiceError> {
    if !include.job_positions {
        return Ok(projects
            .into_iter()
            .map(|project| ProjectView {
                project,
                job_positions: None,
            })
            .collect());
    }

    let ids: Vec<i32> = projects.iter().map(|p| p.id).collect();
    let mut by_project: HashMap<i32, Vec<JobPosition>> = HashMap::new();
    if !ids.is_empty() {
        let filter = Filter::active()
            .with_inactive(include.inactive)
            .member_of("project_id", ids);
        let positions = repo
            .find_all::<JobPosition>(&filter, Window::all())
            .await
            .map_err(fail)?;
        for position in positions {
            if let Some(project_id) = position.project_id {
                by_project.entry(project_id).or_default().push(position);
            }
        }
    }

    Ok(projects
        .into_iter()
        .map(|project| {
            let job_positions = by_project.remove(&project.id).unwrap_or_default();
            ProjectView {
                project,
                job_positions: Some(job_positions),
            }
        })
        .collect())
}

impl<S: Store> CatalogService<S> {
    pub async fn list_projects(
        &self,
        filter: &Filter,
        window: Window,
        include: Include,
    ) -> Result<Vec<ProjectView>, ServiceError> {
        let projects = self.list::<Project>(filter, window).await?;
        resolve(self.store(), projects, include).await
    }

    pub async fn get_project(&self, id: i32, include: Include) -> Result<ProjectView, ServiceError> {
        let project = self.get::<Project>(id).await?;
        let mut views = resolve(self.store(), vec![project], include).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::NotFound { entity: "project", id })
    }
}
