//! Command-line surface: argument parsing, payload decoding and response
//! envelopes. Raw strings stop here; the service only sees typed input.

pub mod envelope;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{Client, Employee, JobPosition, Project, User};
use crate::service::{CatalogService, DirectWrite, Include, ServiceError};
use crate::store::{Filter, Record, Store, Table, Window};

pub use envelope::{Envelope, Operation, Status};

#[derive(Parser, Debug)]
#[command(
    name = "catalog",
    version,
    about = "Staffing catalog: users, clients, projects, job positions and employees"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage users
    Users {
        #[command(subcommand)]
        action: Action,
    },
    /// Manage clients
    Clients {
        #[command(subcommand)]
        action: Action,
    },
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage job positions
    JobPositions {
        #[command(subcommand)]
        action: Action,
    },
    /// Manage employees
    Employees {
        #[command(subcommand)]
        action: Action,
    },
    /// Browse projects and job positions in the terminal
    Browse,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Create a record from a JSON object
    Create {
        #[arg(long)]
        data: String,
    },
    /// List records
    List {
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Show one record, including soft-deleted ones
    Get { id: i32 },
    /// Apply the fields present in a JSON object
    Update {
        id: i32,
        #[arg(long)]
        data: String,
    },
    /// Soft-delete a record
    Delete { id: i32 },
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Create a project from a JSON object
    Create {
        #[arg(long)]
        data: String,
    },
    /// List projects
    List {
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        include: IncludeArgs,
    },
    /// Show one project
    Get {
        id: i32,
        #[command(flatten)]
        include: IncludeArgs,
    },
    /// Apply the fields present in a JSON object
    Update {
        id: i32,
        #[arg(long)]
        data: String,
    },
    /// Soft-delete a project
    Delete { id: i32 },
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct WindowArgs {
    /// Rows to skip
    #[arg(long, visible_alias = "offset")]
    pub from: Option<u32>,
    /// Maximum number of rows
    #[arg(long, visible_alias = "limit")]
    pub to: Option<u32>,
    /// Include soft-deleted rows
    #[arg(long)]
    pub all: bool,
}

impl WindowArgs {
    pub fn window(&self) -> Window {
        Window::new(self.from, self.to)
    }

    pub fn filter(&self) -> Filter {
        Filter::active().with_inactive(self.all)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct IncludeArgs {
    /// "true" to load each project's job positions
    #[arg(long, default_value = "false")]
    pub include_job_positions: String,
    /// "true" to also load soft-deleted job positions
    #[arg(long, default_value = "false")]
    pub include_inactive: String,
}

impl IncludeArgs {
    pub fn include(&self) -> Include {
        Include {
            job_positions: parse_toggle(&self.include_job_positions),
            inactive: parse_toggle(&self.include_inactive),
        }
    }
}

/// String toggles are on only for "true".
pub fn parse_toggle(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn parse_payload<T: DeserializeOwned>(data: &str, table: Table) -> Result<T, ServiceError> {
    serde_json::from_str(data).map_err(|err| {
        ServiceError::Validation(format!("invalid {} payload: {err}", table.label()))
    })
}

fn respond<T: Serialize>(
    operation: Operation,
    table: Table,
    outcome: Result<T, ServiceError>,
) -> Result<Envelope> {
    match outcome {
        Ok(data) => Ok(Envelope::success(operation, table).with_data(&data)?),
        Err(err) => Ok(Envelope::failure(operation, table, &err)),
    }
}

fn respond_empty(operation: Operation, table: Table, outcome: Result<(), ServiceError>) -> Envelope {
    match outcome {
        Ok(()) => Envelope::success(operation, table),
        Err(err) => Envelope::failure(operation, table, &err),
    }
}

async fn run_direct<S, R>(service: &CatalogService<S>, action: Action) -> Result<Envelope>
where
    S: Store,
    R: DirectWrite + Serialize,
    R::New: DeserializeOwned,
    R::Patch: DeserializeOwned,
{
    let table = R::TABLE;
    match action {
        Action::Create { data } => {
            let outcome = match parse_payload::<R::New>(&data, table) {
                Ok(new) => service.create::<R>(new).await,
                Err(err) => Err(err),
            };
            respond(Operation::Create, table, outcome)
        }
        Action::List { window } => {
            let outcome = service.list::<R>(&window.filter(), window.window()).await;
            respond(Operation::List, table, outcome)
        }
        Action::Get { id } => respond(Operation::Get, table, service.get::<R>(id).await),
        Action::Update { id, data } => {
            let outcome = match parse_payload::<R::Patch>(&data, table) {
                Ok(patch) => service.update::<R>(id, patch).await,
                Err(err) => Err(err),
            };
            respond(Operation::Update, table, outcome)
        }
        Action::Delete { id } => Ok(respond_empty(
            Operation::Delete,
            table,
            service.soft_delete::<R>(id).await,
        )),
    }
}

async fn run_job_positions<S: Store>(
    service: &CatalogService<S>,
    action: Action,
) -> Result<Envelope> {
    let table = JobPosition::TABLE;
    match action {
        Action::Create { data } => {
            let outcome = match parse_payload(&data, table) {
                Ok(new) => service.create_job_position(new).await,
                Err(err) => Err(err),
            };
            respond(Operation::Create, table, outcome)
        }
        Action::List { window } => {
            let outcome = service
                .list::<JobPosition>(&window.filter(), window.window())
                .await;
            respond(Operation::List, table, outcome)
        }
        Action::Get { id } => respond(Operation::Get, table, service.get::<JobPosition>(id).await),
        Action::Update { id, data } => {
            let outcome = match parse_payload(&data, table) {
                Ok(patch) => service.update_job_position(id, patch).await,
                Err(err) => Err(err),
            };
            respond(Operation::Update, table, outcome)
        }
        Action::Delete { id } => Ok(respond_empty(
            Operation::Delete,
            table,
            service.soft_delete::<JobPosition>(id).await,
        )),
    }
}

async fn run_projects<S: Store>(
    service: &CatalogService<S>,
    action: ProjectAction,
) -> Result<Envelope> {
    let table = Project::TABLE;
    match action {
        ProjectAction::List { window, include } => {
            let outcome = service
                .list_projects(&window.filter(), window.window(), include.include())
                .await;
            respond(Operation::List, table, outcome)
        }
        ProjectAction::Get { id, include } => {
            let outcome = service.get_project(id, include.include()).await;
            respond(Operation::Get, table, outcome)
        }
        ProjectAction::Create { data } => {
            run_direct::<S, Project>(service, Action::Create { data }).await
        }
        ProjectAction::Update { id, data } => {
            run_direct::<S, Project>(service, Action::Update { id, data }).await
        }
        ProjectAction::Delete { id } => run_direct::<S, Project>(service, Action::Delete { id }).await,
    }
}

/// Run one non-interactive command and describe its outcome.
pub async fn execute<S: Store>(service: &CatalogService<S>, command: Command) -> Result<Envelope> {
    match command {
        Command::Users { action } => run_direct::<S, User>(service, action).await,
        Command::Clients { action } => run_direct::<S, Client>(service, action).await,
        Command::Projects { action } => run_projects(service, action).await,
        Command::JobPositions { action } => run_job_positions(service, action).await,
        Command::Employees { action } => run_direct::<S, Employee>(service, action).await,
        Command::Browse => anyhow::bail!("browse is interactive and has no envelope"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn toggles_parse_only_true() {
        assert!(parse_toggle("true"));
        assert!(parse_toggle(" TRUE "));
        assert!(!parse_toggle("false"));
        assert!(!parse_toggle("1"));
        assert!(!parse_toggle(""));
    }

    #[test]
    fn window_aliases_match_offset_and_limit() {
        let command = parse(&["catalog", "clients", "list", "--offset", "2", "--limit", "3"]);
        let Command::Clients {
            action: Action::List { window },
        } = command
        else {
            panic!("unexpected command");
        };
        assert_eq!(window.window(), Window::new(Some(2), Some(3)));
        assert!(!window.filter().include_inactive);
    }

    #[test]
    fn absent_window_is_unbounded() {
        let command = parse(&["catalog", "job-positions", "list"]);
        let Command::JobPositions {
            action: Action::List { window },
        } = command
        else {
            panic!("unexpected command");
        };
        assert!(window.window().is_unbounded());
    }

    #[test]
    fn project_include_flags_become_typed() {
        let command = parse(&[
            "catalog",
            "projects",
            "get",
            "4",
            "--include-job-positions",
            "true",
        ]);
        let Command::Projects {
            action: ProjectAction::Get { id, include },
        } = command
        else {
            panic!("unexpected command");
        };
        assert_eq!(id, 4);
        assert_eq!(include.include(), Include::job_positions());
    }

    #[tokio::test]
    async fn malformed_payload_is_a_validation_envelope() {
        let service = CatalogService::new(MemoryStore::new());
        let command = parse(&[
            "catalog",
            "job-positions",
            "create",
            "--data",
            r#"{"name":"SRE","client_id":1,"exclusivity":"sometimes"}"#,
        ]);

        let envelope = execute(&service, command).await.unwrap();
        assert_eq!(envelope.status, Status::Error);
        assert_eq!(envelope.message, "Invalid job position request");
    }

    #[tokio::test]
    async fn create_then_delete_twice() {
        let service = CatalogService::new(MemoryStore::new());
        let created = execute(
            &service,
            parse(&["catalog", "clients", "create", "--data", r#"{"name":"Acme"}"#]),
        )
        .await
        .unwrap();
        assert!(created.is_success());
        assert_eq!(created.data.as_ref().unwrap()["active"], true);

        let first = execute(&service, parse(&["catalog", "clients", "delete", "1"]))
            .await
            .unwrap();
        let second = execute(&service, parse(&["catalog", "clients", "delete", "1"]))
            .await
            .unwrap();

        assert_eq!(first.message, "Client deleted");
        assert_eq!(second.message, "Client not found");
    }
}
