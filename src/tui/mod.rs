//! TUI module - Terminal dashboard with ratatui
//!
//! Today's plan, the rest timer and the muscle groups that need attention.
//! The session's background sync and midnight tick keep running underneath.

use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Local, Utc};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table},
};

use crate::caps::{Toast, ToastLevel, ToastQueue};
use crate::config::{Config, DEFAULT_INACTIVE_DAYS};
use crate::remote::RemoteStore;
use crate::store::{Session, WorkoutState};
use crate::timer::{RestTimer, TimerDriver, TimerState};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const FRAME: Duration = Duration::from_millis(100);
const REST_STEP_SECS: u32 = 15;

/// Everything one frame needs, copied out of the shared state
struct View {
    state: WorkoutState,
    timer: RestTimer,
    toasts: Vec<Toast>,
}

pub struct App<R: RemoteStore + 'static> {
    session: Session<R>,
    timer: TimerDriver,
    toasts: ToastQueue,
    should_quit: bool,
}

impl<R: RemoteStore + 'static> App<R> {
    pub fn new(session: Session<R>, timer: TimerDriver, toasts: ToastQueue) -> Self {
        Self {
            session,
            timer,
            toasts,
            should_quit: false,
        }
    }

    /// Run the dashboard until `q`, then close the session
    pub async fn run(mut self) -> Result<()> {
        let mut terminal = init_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        restore_terminal()?;

        let App { session, .. } = self;
        session.shutdown().await;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            let view = View {
                state: self.session.store().lock().await.state().clone(),
                timer: self.timer.snapshot(),
                toasts: self.toasts.visible(Instant::now()),
            };
            terminal.draw(|frame| render(frame, &view))?;
            self.handle_events()?;
            tokio::time::sleep(FRAME).await;
        }
        Ok(())
    }

    fn handle_events(&mut self) -> Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                    KeyCode::Char('s') | KeyCode::Char(' ') => self.timer.toggle(),
                    KeyCode::Char('r') => self.timer.reset(),
                    KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_rest(REST_STEP_SECS as i64),
                    KeyCode::Char('-') => self.adjust_rest(-(REST_STEP_SECS as i64)),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn adjust_rest(&mut self, delta: i64) {
        let timer = self.timer.snapshot();
        if timer.is_running() {
            return;
        }
        let wanted = (timer.duration() as i64 + delta).max(0) as u32;
        self.timer.configure(Config::clamp_rest(wanted));
    }
}

fn render(frame: &mut Frame, view: &View) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(frame, chunks[0], &view.state);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_plan(frame, body[0], &view.state);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(4)])
        .split(body[1]);

    render_timer(frame, side[0], &view.timer);
    render_inactive(frame, side[1], &view.state);

    render_footer(frame, chunks[2], &view.toasts);
}

fn render_header(frame: &mut Frame, area: Rect, state: &WorkoutState) {
    let sync = if state.is_loading {
        "loading...".to_string()
    } else {
        match state.last_sync {
            Some(at) => format!("synced {}", at.with_timezone(&Local).format("%H:%M:%S")),
            None => "not synced".to_string(),
        }
    };

    let header = Paragraph::new(format!("Gym Planner - {} | {}", state.today_name(), sync))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_plan(frame: &mut Frame, area: Rect, state: &WorkoutState) {
    let today = state.todays_plan();
    let title = format!("Today: {}", today.day);

    if today.exercises.is_empty() {
        let empty = Paragraph::new("No exercises planned. Rest day?")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = today
        .exercises
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(e.name.clone()),
                Cell::from(e.muscle_group.label()),
                Cell::from(format!("{}x{}", e.sets, e.reps)),
                Cell::from(e.weight.map(|w| format!("{}kg", w)).unwrap_or_default()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(vec!["Exercise", "Group", "Sets x Reps", "Weight"]).style(Style::default().bold()))
    .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}

fn render_timer(frame: &mut Frame, area: Rect, timer: &RestTimer) {
    let color = match timer.state() {
        TimerState::Running => Color::Green,
        TimerState::Paused => Color::Yellow,
        TimerState::Completed => Color::Magenta,
        TimerState::Idle => Color::Cyan,
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Rest Timer ({}s, {})", timer.duration(), timer.state())),
        )
        .gauge_style(Style::default().fg(color))
        .percent(timer.progress().round() as u16)
        .label(timer.display());
    frame.render_widget(gauge, area);
}

fn render_inactive(frame: &mut Frame, area: Rect, state: &WorkoutState) {
    let last = state.last_trained_by_group();
    let items: Vec<ListItem> = state
        .inactive_muscle_groups(DEFAULT_INACTIVE_DAYS, Utc::now())
        .into_iter()
        .map(|g| {
            let since = last
                .get(&g)
                .map(|d| format!("last {}", d))
                .unwrap_or_else(|| "never".to_string());
            ListItem::new(format!("{:10} {}", g.label(), since))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Not trained in {} days", DEFAULT_INACTIVE_DAYS)),
    );
    frame.render_widget(list, area);
}

fn render_footer(frame: &mut Frame, area: Rect, toasts: &[Toast]) {
    let footer = match toasts.last() {
        Some(toast) => {
            let color = match toast.level {
                ToastLevel::Success => Color::Green,
                ToastLevel::Error => Color::Red,
                ToastLevel::Info => Color::Blue,
            };
            let text = match &toast.description {
                Some(d) => format!("{} {}", toast.message, d),
                None => toast.message.clone(),
            };
            Paragraph::new(text).style(Style::default().fg(color))
        }
        None => Paragraph::new("q: quit | s/space: start/pause | r: reset | +/-: rest time")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer.block(Block::default().borders(Borders::ALL)), area);
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
