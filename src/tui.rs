use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::io::stdout;
use uuid::Uuid;

use crate::db::Database;
use crate::filter::{board_columns, filtered_view, ViewQuery};
use crate::models::{JobApplication, JobPatch, Status, Theme};
use crate::state::{Action, AppState};
use crate::stats::{is_ghosted, needs_follow_up, DerivedStats};

struct BoardState {
    query: ViewQuery,
    column: usize,
    row: usize,
    message: Option<String>,
}

impl BoardState {
    fn new(query: ViewQuery) -> Self {
        Self {
            query,
            column: 0,
            row: 0,
            message: None,
        }
    }

    fn columns<'a>(&self, state: &'a AppState) -> [Vec<&'a JobApplication>; 4] {
        let view = filtered_view(&state.jobs, &self.query);
        board_columns(&view)
    }

    fn selected_id(&self, state: &AppState) -> Option<Uuid> {
        self.columns(state)[self.column].get(self.row).map(|j| j.id)
    }

    fn prev_column(&mut self, state: &AppState) {
        if self.column > 0 {
            self.column -= 1;
            self.clamp(state);
        }
    }

    fn next_column(&mut self, state: &AppState) {
        if self.column < Status::ALL.len() - 1 {
            self.column += 1;
            self.clamp(state);
        }
    }

    fn next_row(&mut self, state: &AppState) {
        let len = self.columns(state)[self.column].len();
        if len > 0 && self.row < len - 1 {
            self.row += 1;
        }
    }

    fn prev_row(&mut self) {
        self.row = self.row.saturating_sub(1);
    }

    fn clamp(&mut self, state: &AppState) {
        let len = self.columns(state)[self.column].len();
        self.row = self.row.min(len.saturating_sub(1));
    }

    // Moves the cursor onto `id` wherever it now sits.
    fn focus(&mut self, id: Uuid, state: &AppState) {
        for (col, jobs) in self.columns(state).iter().enumerate() {
            if let Some(row) = jobs.iter().position(|j| j.id == id) {
                self.column = col;
                self.row = row;
                return;
            }
        }
        self.clamp(state);
    }

    fn key_action(&mut self, code: KeyCode, state: &AppState) -> Option<Action> {
        let selected = self.selected_id(state);
        match code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.prev_column(state);
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.next_column(state);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.next_row(state);
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.prev_row();
                None
            }
            KeyCode::Char('H') if self.column > 0 => {
                selected.map(|id| Action::SetStatus(id, Status::ALL[self.column - 1]))
            }
            KeyCode::Char('L') if self.column < Status::ALL.len() - 1 => {
                selected.map(|id| Action::SetStatus(id, Status::ALL[self.column + 1]))
            }
            KeyCode::Char('n') | KeyCode::Enter => selected.map(Action::AdvanceStatus),
            KeyCode::Char('p') => selected.and_then(|id| {
                let job = state.get(id)?;
                Some(Action::Update(
                    id,
                    JobPatch {
                        priority: Some(!job.priority),
                        ..Default::default()
                    },
                ))
            }),
            KeyCode::Char('d') => selected.map(Action::Delete),
            KeyCode::Char('t') => Some(Action::ToggleTheme),
            _ => None,
        }
    }
}

pub fn run_board(db: &mut Database, state: AppState, query: ViewQuery) -> Result<()> {
    let mut board = BoardState::new(query);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut board, state, db);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    board: &mut BoardState,
    mut state: AppState,
    db: &mut Database,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, board, &state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                break;
            }

            let selected = board.selected_id(&state);
            let Some(action) = board.key_action(key.code, &state) else {
                continue;
            };

            match state.apply(action, Utc::now()) {
                Ok(Some(next)) => {
                    db.save(&next)?;
                    state = next;
                    board.message = None;
                    match selected {
                        Some(id) if state.get(id).is_some() => board.focus(id, &state),
                        _ => board.clamp(&state),
                    }
                }
                Ok(None) => {}
                Err(e) => board.message = Some(e.to_string()),
            }
        }
    }
    Ok(())
}

struct Palette {
    border: Style,
    active_border: Style,
    highlight: Style,
    muted: Style,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                border: Style::default().fg(Color::DarkGray),
                active_border: Style::default().fg(Color::Cyan),
                highlight: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
                muted: Style::default().fg(Color::DarkGray),
            },
            Theme::Light => Self {
                border: Style::default().fg(Color::Gray),
                active_border: Style::default().fg(Color::Blue),
                highlight: Style::default()
                    .bg(Color::LightBlue)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
                muted: Style::default().fg(Color::Gray),
            },
        }
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Applied => Color::Cyan,
        Status::Interviewing => Color::Yellow,
        Status::Offered => Color::Green,
        Status::Rejected => Color::Red,
    }
}

fn draw(frame: &mut Frame, board: &BoardState, state: &AppState) {
    let palette = Palette::for_theme(state.theme);
    let now = Utc::now();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(rows[0]);

    for (i, jobs) in board.columns(state).iter().enumerate() {
        let status = Status::ALL[i];
        let items: Vec<ListItem> = jobs
            .iter()
            .map(|job| {
                let mut spans = Vec::new();
                if job.priority {
                    spans.push(Span::styled("* ", Style::default().fg(Color::Magenta)));
                }
                spans.push(Span::raw(job.title.clone()));
                if needs_follow_up(job, now) {
                    spans.push(Span::styled(" [follow up]", Style::default().fg(Color::Yellow)));
                } else if is_ghosted(job, now) {
                    spans.push(Span::styled(" [quiet]", palette.muted));
                }
                if job.salary > 0 {
                    spans.push(Span::styled(format!(" ${}k", job.salary / 1000), palette.muted));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let active = board.column == i;
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(
                        format!(" {} ({}) ", status, jobs.len()),
                        Style::default().fg(status_color(status)),
                    ))
                    .border_style(if active { palette.active_border } else { palette.border }),
            )
            .highlight_style(palette.highlight)
            .highlight_symbol("> ");

        let mut list_state = ListState::default();
        if active && !jobs.is_empty() {
            list_state.select(Some(board.row));
        }
        frame.render_stateful_widget(list, cols[i], &mut list_state);
    }

    let stats = DerivedStats::compute(&state.jobs, state.weekly_goal, now);
    let summary = format!(
        " Total {}  Interviews {}  Offers {}  Success {}%  Pipeline ${}  Week {}/{} ({}%)  History {:?}",
        stats.total_jobs,
        stats.interviewing_count,
        stats.offers_count,
        stats.success_rate,
        stats.pipeline_value,
        stats.jobs_this_week,
        stats.weekly_goal,
        stats.goal_progress,
        stats.weekly_history,
    );
    let stats_widget = Paragraph::new(summary).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.border)
            .title(" Stats "),
    );
    frame.render_widget(stats_widget, rows[1]);

    let footer = match &board.message {
        Some(msg) => Paragraph::new(format!(" {}", msg)).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(
            " h/l:column  j/k:card  H/L:move  n:next status  p:priority  d:delete  t:theme  q:quit",
        )
        .style(palette.muted),
    };
    frame.render_widget(footer, rows[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(titles: &[&str]) -> AppState {
        let mut state = AppState::default();
        for title in titles {
            state = state
                .apply(Action::Add { title: title.to_string(), date: None }, Utc::now())
                .unwrap()
                .unwrap();
        }
        state
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let state = state_with(&["Acme", "Globex"]);
        let mut board = BoardState::new(ViewQuery::default());
        board.next_row(&state);
        board.next_row(&state);
        assert_eq!(board.row, 1);
        board.next_column(&state);
        assert_eq!(board.column, 1);
        assert_eq!(board.row, 0);
        board.prev_column(&state);
        board.prev_column(&state);
        assert_eq!(board.column, 0);
    }

    #[test]
    fn test_move_right_is_set_status() {
        let state = state_with(&["Acme"]);
        let mut board = BoardState::new(ViewQuery::default());
        let id = state.jobs[0].id;
        match board.key_action(KeyCode::Char('L'), &state) {
            Some(Action::SetStatus(got, Status::Interviewing)) => assert_eq!(got, id),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_move_left_from_first_column_does_nothing() {
        let state = state_with(&["Acme"]);
        let mut board = BoardState::new(ViewQuery::default());
        assert!(board.key_action(KeyCode::Char('H'), &state).is_none());
    }

    #[test]
    fn test_focus_follows_moved_card() {
        let state = state_with(&["Acme", "Globex"]);
        let mut board = BoardState::new(ViewQuery::default());
        let id = board.selected_id(&state).unwrap();
        let state = state
            .apply(Action::SetStatus(id, Status::Offered), Utc::now())
            .unwrap()
            .unwrap();
        board.focus(id, &state);
        assert_eq!(board.column, Status::Offered.index());
        assert_eq!(board.selected_id(&state), Some(id));
    }

    #[test]
    fn test_priority_key_toggles() {
        let state = state_with(&["Acme"]);
        let mut board = BoardState::new(ViewQuery::default());
        let action = board.key_action(KeyCode::Char('p'), &state).unwrap();
        let state = state.apply(action, Utc::now()).unwrap().unwrap();
        assert!(state.jobs[0].priority);
    }
}
