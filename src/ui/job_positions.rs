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
use crate::models::JobPosition;

pub struct JobPositionsState {
    project_id: i32,
    project_name: String,
    positions: Vec<JobPosition>,
    list_state: ListState,
    show_delete_confirmation: bool,
}

impl JobPositionsState {
    pub fn new(project_id: i32, project_name: String, positions: Vec<JobPosition>) -> Self {
        let mut list_state = ListState::default();
        if !positions.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            project_id,
            project_name,
            positions,
            list_state,
            show_delete_confirmation: false,
        }
    }

    pub fn project_id(&self) -> i32 {
        self.project_id
    }

    pub fn next(&mut self) {
        if self.positions.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i >= self.positions.len() - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.positions.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) | None => self.positions.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn selected_position_id(&self) -> Option<i32> {
        self.list_state
            .selected()
            .and_then(|i| self.positions.get(i))
            .map(|position| position.id)
    }
}

pub enum JobPositionAction {
    Back,
    DeletePosition(i32),
}

pub fn render_job_positions<B: Backend>(frame: &mut Frame<B>, state: &mut JobPositionsState) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(size);

    let items: Vec<ListItem> = state
        .positions
        .iter()
        .map(|position| {
            ListItem::new(Spans::from(vec![
                Span::raw(position.name.clone()),
                Span::raw(format!(" ({:.2}/hr, {})", position.bill_rate, position.region)),
                Span::styled(
                    format!(" [{}]", position.demand_curation),
                    Style::default().fg(Color::Cyan),
                ),
            ]))
        })
        .collect();

    let positions_list = List::new(items)
        .block(
            Block::default()
                .title(format!("Job Positions for {}", state.project_name))
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(positions_list, chunks[0], &mut state.list_state);

    let buttons_text = if state.selected_position_id().is_some() {
        "<D> Delete Job Position | <Esc> Back"
    } else {
        "<Esc> Back"
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(buttons, chunks[1]);

    if state.show_delete_confirmation {
        render_delete_confirmation(
            frame,
            size,
            "Are you sure you want to delete this job position?",
            "It will no longer appear under its project.",
        );
    }
}

pub fn handle_input(state: &mut JobPositionsState) -> Result<Option<JobPositionAction>> {
    if let Event::Key(key) = event::read()? {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if state.show_delete_confirmation {
                    state.toggle_delete_confirmation();
                } else {
                    return Ok(Some(JobPositionAction::Back));
                }
            }
            KeyCode::Char('d') => {
                if !state.show_delete_confirmation && state.selected_position_id().is_some() {
                    state.toggle_delete_confirmation();
                }
            }
            KeyCode::Char('y') => {
                if state.show_delete_confirmation {
                    if let Some(id) = state.selected_position_id() {
                        state.toggle_delete_confirmation();
                        return Ok(Some(JobPositionAction::DeletePosition(id)));
                    }
                }
            }
            KeyCode::Char('n') if state.show_delete_confirmation => {
                state.toggle_delete_confirmation();
            }
            KeyCode::Down if !state.show_delete_confirmation => state.next(),
            KeyCode::Up if !state.show_delete_confirmation => state.previous(),
            _ => {}
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_has_no_selection() {
        let mut state = JobPositionsState::new(7, "Atlas".into(), Vec::new());
        state.next();
        state.previous();

        assert_eq!(state.project_id(), 7);
        assert_eq!(state.selected_position_id(), None);
    }
}
