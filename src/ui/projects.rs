use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    Frame,
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::render_delete_confirmation;
use crate::service::{Include, ProjectView};

// Represents the state of the project browser screen
pub struct ProjectsState {
    projects: Vec<ProjectView>,
    list_state: ListState,
    include: Include,
    show_delete_confirmation: bool,
}

impl ProjectsState {
    pub fn new(projects: Vec<ProjectView>, include: Include) -> Self {
        let mut list_state = ListState::default();
        if !projects.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            projects,
            list_state,
            include,
            show_delete_confirmation: false,
        }
    }

    /// Swap in freshly loaded rows, keeping the cursor in range.
    pub fn reload(&mut self, projects: Vec<ProjectView>) {
        let selected = self.list_state.selected().unwrap_or(0);
        self.projects = projects;
        if self.projects.is_empty() {
            self.list_state.select(None);
        } else {
            self.list_state.select(Some(selected.min(self.projects.len() - 1)));
        }
    }

    pub fn next(&mut self) {
        if self.projects.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i >= self.projects.len() - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.projects.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) | None => self.projects.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn toggle_job_positions(&mut self) {
        self.include.job_positions = !self.include.job_positions;
    }

    pub fn toggle_inactive(&mut self) {
        self.include.inactive = !self.include.inactive;
    }

    pub fn include(&self) -> Include {
        self.include
    }

    pub fn selected_project(&self) -> Option<&ProjectView> {
        self.list_state.selected().and_then(|i| self.projects.get(i))
    }

    pub fn selected_project_id(&self) -> Option<i32> {
        self.selected_project().map(|view| view.project.id)
    }
}

pub enum ProjectAction {
    Exit,
    Reload,
    DeleteProject(i32),
    OpenJobPositions(i32),
}

pub fn render_projects<B: Backend>(frame: &mut Frame<B>, state: &mut ProjectsState) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(size);

    let items: Vec<ListItem> = state
        .projects
        .iter()
        .map(|view| {
            let project = &view.project;
            let mut spans = vec![
                Span::raw(project.name.clone()),
                Span::raw(format!(
                    " ({} to {}, {})",
                    project.posting_date.format("%Y-%m-%d"),
                    project.exp_closure_date.format("%Y-%m-%d"),
                    project.region
                )),
            ];
            if let Some(positions) = &view.job_positions {
                spans.push(Span::styled(
                    format!(" [{} job positions]", positions.len()),
                    Style::default().fg(Color::Cyan),
                ));
            }
            ListItem::new(Spans::from(spans))
        })
        .collect();

    let title = if state.include.job_positions {
        "Projects (with job positions)"
    } else {
        "Projects"
    };
    let projects_list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(projects_list, chunks[0], &mut state.list_state);

    let buttons_text = if state.selected_project().is_some() {
        "<J> Toggle Job Positions | <I> Toggle Inactive Positions | <D> Delete Project | <Enter> View Job Positions | <Esc> Quit"
    } else {
        "<J> Toggle Job Positions | <Esc> Quit"
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(buttons, chunks[1]);

    if state.show_delete_confirmation {
        render_delete_confirmation(
            frame,
            size,
            "Are you sure you want to delete this project?",
            "It will be hidden from listings but kept on record.",
        );
    }
}

pub fn handle_input(state: &mut ProjectsState) -> Result<Option<ProjectAction>> {
    if let Event::Key(key) = event::read()? {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if state.show_delete_confirmation {
                    state.toggle_delete_confirmation();
                } else {
                    return Ok(Some(ProjectAction::Exit));
                }
            }
            KeyCode::Char('j') if !state.show_delete_confirmation => {
                state.toggle_job_positions();
                return Ok(Some(ProjectAction::Reload));
            }
            KeyCode::Char('i') if !state.show_delete_confirmation => {
                state.toggle_inactive();
                return Ok(Some(ProjectAction::Reload));
            }
            KeyCode::Char('d') => {
                if !state.show_delete_confirmation && state.selected_project().is_some() {
                    state.toggle_delete_confirmation();
                }
            }
            KeyCode::Char('y') => {
                if state.show_delete_confirmation {
                    if let Some(id) = state.selected_project_id() {
                        state.toggle_delete_confirmation();
                        return Ok(Some(ProjectAction::DeleteProject(id)));
                    }
                }
            }
            KeyCode::Char('n') if state.show_delete_confirmation => {
                state.toggle_delete_confirmation();
            }
            KeyCode::Down if !state.show_delete_confirmation => state.next(),
            KeyCode::Up if !state.show_delete_confirmation => state.previous(),
            KeyCode::Enter if !state.show_delete_confirmation => {
                if let Some(id) = state.selected_project_id() {
                    return Ok(Some(ProjectAction::OpenJobPositions(id)));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Audit, Project};

    fn view(id: i32) -> ProjectView {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        ProjectView {
            project: Project {
                id,
                name: format!("project {id}"),
                status: 0,
                revenue: 0.0,
                region: "EMEA".into(),
                posting_date: date,
                exp_closure_date: date,
                image: None,
                user_id: 1,
                client_id: 1,
                audit: Audit::created_at(chrono::Utc::now()),
            },
            job_positions: None,
        }
    }

    #[test]
    fn navigation_wraps_around() {
        let mut state = ProjectsState::new(vec![view(1), view(2), view(3)], Include::none());
        assert_eq!(state.selected_project_id(), Some(1));

        state.previous();
        assert_eq!(state.selected_project_id(), Some(3));
        state.next();
        assert_eq!(state.selected_project_id(), Some(1));
    }

    #[test]
    fn reload_clamps_selection() {
        let mut state = ProjectsState::new(vec![view(1), view(2), view(3)], Include::none());
        state.next();
        state.next();
        state.reload(vec![view(1)]);
        assert_eq!(state.selected_project_id(), Some(1));

        state.reload(Vec::new());
        assert_eq!(state.selected_project_id(), None);
    }

    #[test]
    fn toggles_flip_include() {
        let mut state = ProjectsState::new(Vec::new(), Include::none());
        state.toggle_job_positions();
        assert_eq!(state.include(), Include::job_positions());
        state.toggle_inactive();
        assert!(state.include().inactive);
    }
}
