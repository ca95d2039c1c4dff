//! Interactive browser for projects and their job positions.

pub mod job_positions;
pub mod projects;

use std::io;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::warn;
use tui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Spans,
    widgets::{Block, Borders, Paragraph},
};

use crate::models::{JobPosition, Project};
use crate::service::{CatalogService, Include, ServiceError};
use crate::store::{Filter, Store, Window};
use job_positions::{
    JobPositionAction, JobPositionsState, handle_input as handle_job_positions_input,
    render_job_positions,
};
use projects::{
    ProjectAction, ProjectsState, handle_input as handle_projects_input, render_projects,
};

// Represents the current screen in the app
enum AppScreen {
    Projects,
    JobPositions,
}

struct AppState<'a, S: Store> {
    service: &'a CatalogService<S>,
    screen: AppScreen,
    projects_state: ProjectsState,
    job_positions_state: Option<JobPositionsState>,
}

/// Take over the terminal until the user quits.
pub async fn run<S: Store>(service: &CatalogService<S>) -> Result<()> {
    let include = Include::none();
    let projects = service
        .list_projects(&Filter::active(), Window::all(), include)
        .await?;
    let mut app_state = AppState {
        service,
        screen: AppScreen::Projects,
        projects_state: ProjectsState::new(projects, include),
        job_positions_state: None,
    };

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app_state).await;

    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: Backend, S: Store>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<'_, S>,
) -> Result<()> {
    loop {
        terminal.draw(|f| match app_state.screen {
            AppScreen::Projects => render_projects(f, &mut app_state.projects_state),
            AppScreen::JobPositions => {
                if let Some(state) = &mut app_state.job_positions_state {
                    render_job_positions(f, state);
                }
            }
        })?;

        let should_quit = match app_state.screen {
            AppScreen::Projects => handle_projects_screen(app_state).await?,
            AppScreen::JobPositions => handle_job_positions_screen(app_state).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

/// A row that vanished or was already deleted under the browser is refreshed
/// away rather than ending the session.
fn tolerate_missing<T>(outcome: Result<T, ServiceError>) -> Result<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(ServiceError::NotFound { entity, id }) => {
            warn!(entity, id, "row no longer available; reloading");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

async fn reload_projects<S: Store>(app_state: &mut AppState<'_, S>) -> Result<()> {
    // The inactive toggle only widens the related job positions.
    let include = app_state.projects_state.include();
    let projects = app_state
        .service
        .list_projects(&Filter::active(), Window::all(), include)
        .await?;
    app_state.projects_state.reload(projects);
    Ok(())
}

async fn load_job_positions<S: Store>(
    service: &CatalogService<S>,
    project_id: i32,
) -> Result<Vec<JobPosition>> {
    let filter = Filter::active().member_of("project_id", vec![project_id]);
    Ok(service.list::<JobPosition>(&filter, Window::all()).await?)
}

async fn open_job_positions<S: Store>(
    app_state: &mut AppState<'_, S>,
    project_id: i32,
) -> Result<()> {
    let project = tolerate_missing(app_state.service.get::<Project>(project_id).await)?;
    let Some(project) = project else {
        app_state.job_positions_state = None;
        app_state.screen = AppScreen::Projects;
        return reload_projects(app_state).await;
    };
    let positions = load_job_positions(app_state.service, project_id).await?;
    app_state.job_positions_state =
        Some(JobPositionsState::new(project_id, project.name, positions));
    app_state.screen = AppScreen::JobPositions;
    Ok(())
}

async fn apply_project_action<S: Store>(
    app_state: &mut AppState<'_, S>,
    action: ProjectAction,
) -> Result<bool> {
    match action {
        ProjectAction::Exit => return Ok(true),
        ProjectAction::Reload => reload_projects(app_state).await?,
        ProjectAction::DeleteProject(project_id) => {
            tolerate_missing(app_state.service.soft_delete::<Project>(project_id).await)?;
            reload_projects(app_state).await?;
        }
        ProjectAction::OpenJobPositions(project_id) => {
            open_job_positions(app_state, project_id).await?;
        }
    }

    Ok(false)
}

async fn apply_job_position_action<S: Store>(
    app_state: &mut AppState<'_, S>,
    action: JobPositionAction,
) -> Result<bool> {
    match action {
        JobPositionAction::Back => {
            app_state.job_positions_state = None;
            app_state.screen = AppScreen::Projects;
            reload_projects(app_state).await?;
        }
        JobPositionAction::DeletePosition(position_id) => {
            let project_id = app_state.job_positions_state.as_ref().map(|s| s.project_id());
            let Some(project_id) = project_id else {
                app_state.screen = AppScreen::Projects;
                return Ok(false);
            };
            tolerate_missing(
                app_state
                    .service
                    .soft_delete::<JobPosition>(position_id)
                    .await,
            )?;
            open_job_positions(app_state, project_id).await?;
        }
    }

    Ok(false)
}

async fn handle_projects_screen<S: Store>(app_state: &mut AppState<'_, S>) -> Result<bool> {
    match handle_projects_input(&mut app_state.projects_state)? {
        Some(action) => apply_project_action(app_state, action).await,
        None => Ok(false),
    }
}

async fn handle_job_positions_screen<S: Store>(app_state: &mut AppState<'_, S>) -> Result<bool> {
    let Some(state) = &mut app_state.job_positions_state else {
        app_state.screen = AppScreen::Projects;
        return Ok(false);
    };

    match handle_job_positions_input(state)? {
        Some(action) => apply_job_position_action(app_state, action).await,
        None => Ok(false),
    }
}

pub(crate) fn render_delete_confirmation<B: Backend>(
    frame: &mut Frame<B>,
    size: Rect,
    question: &str,
    consequence: &str,
) {
    let popup_area = centered_rect(50, 20, size);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(question.to_string()),
        Spans::from(""),
        Spans::from(consequence.to_string()),
        Spans::from(""),
        Spans::from("<Y> Yes  <N> No"),
    ])
    .block(Block::default().title("Confirm Delete").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(popup, popup_area);
}

// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, NewClient, NewProject, NewUser, User};
    use crate::store::MemoryStore;

    async fn seeded() -> (CatalogService<MemoryStore>, Project, Project) {
        let service = CatalogService::new(MemoryStore::new());
        let user = service
            .create::<User>(NewUser {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password: "s3cret".into(),
                role: "manager".into(),
            })
            .await
            .unwrap();
        let client = service
            .create::<Client>(NewClient {
                name: "Acme".into(),
                high_growth: true,
            })
            .await
            .unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut projects = Vec::new();
        for name in ["Apollo", "Gemini"] {
            let project = service
                .create::<Project>(NewProject {
                    name: name.into(),
                    status: 0,
                    revenue: 0.0,
                    region: "EMEA".into(),
                    posting_date: date,
                    exp_closure_date: date,
                    image: None,
                    user_id: user.id,
                    client_id: client.id,
                })
                .await
                .unwrap();
            projects.push(project);
        }
        let gemini = projects.pop().unwrap();
        let apollo = projects.pop().unwrap();
        (service, apollo, gemini)
    }

    async fn app(service: &CatalogService<MemoryStore>) -> AppState<'_, MemoryStore> {
        let projects = service
            .list_projects(&Filter::active(), Window::all(), Include::none())
            .await
            .unwrap();
        AppState {
            service,
            screen: AppScreen::Projects,
            projects_state: ProjectsState::new(projects, Include::none()),
            job_positions_state: None,
        }
    }

    #[tokio::test]
    async fn deleting_an_already_deleted_project_reloads() {
        let (service, apollo, gemini) = seeded().await;
        let mut state = app(&service).await;
        service.soft_delete::<Project>(apollo.id).await.unwrap();

        let quit = apply_project_action(&mut state, ProjectAction::DeleteProject(apollo.id))
            .await
            .unwrap();

        assert!(!quit);
        assert_eq!(state.projects_state.selected_project_id(), Some(gemini.id));
    }

    #[tokio::test]
    async fn inactive_toggle_never_lists_deleted_projects() {
        let (service, apollo, gemini) = seeded().await;
        let mut state = app(&service).await;
        service.soft_delete::<Project>(apollo.id).await.unwrap();

        state.projects_state.toggle_inactive();
        apply_project_action(&mut state, ProjectAction::Reload)
            .await
            .unwrap();

        assert_eq!(state.projects_state.selected_project_id(), Some(gemini.id));
        state.projects_state.next();
        assert_eq!(state.projects_state.selected_project_id(), Some(gemini.id));
    }

    #[tokio::test]
    async fn opening_a_missing_project_stays_on_projects() {
        let (service, _, _) = seeded().await;
        let mut state = app(&service).await;

        apply_project_action(&mut state, ProjectAction::OpenJobPositions(99))
            .await
            .unwrap();

        assert!(matches!(state.screen, AppScreen::Projects));
        assert!(state.job_positions_state.is_none());
    }

    #[tokio::test]
    async fn deleting_a_missing_position_refreshes_the_screen() {
        let (service, apollo, _) = seeded().await;
        let mut state = app(&service).await;
        apply_project_action(&mut state, ProjectAction::OpenJobPositions(apollo.id))
            .await
            .unwrap();
        assert!(matches!(state.screen, AppScreen::JobPositions));

        let quit = apply_job_position_action(&mut state, JobPositionAction::DeletePosition(42))
            .await
            .unwrap();

        assert!(!quit);
        assert!(matches!(state.screen, AppScreen::JobPositions));
        assert_eq!(
            state.job_positions_state.as_ref().map(|s| s.project_id()),
            Some(apollo.id)
        );
    }

    #[test]
    fn store_failures_still_surface() {
        let outcome: Result<(), ServiceError> = Err(ServiceError::Validation("bad".into()));
        assert!(tolerate_missing(outcome).is_err());
        let missing: Result<(), ServiceError> =
            Err(ServiceError::NotFound { entity: "project", id: 1 });
        assert!(tolerate_missing(missing).unwrap().is_none());
    }

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(50, 20, outer);

        assert_eq!(inner.width, 50);
        assert!(inner.x >= 25 && inner.y >= 15);
        assert!(inner.bottom() <= outer.bottom());
    }
}
