use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph,
    Wrap,
};

use eva_terminal::dataset_stats;
use eva_terminal::markdown;
use eva_terminal::state::{
    apply_delta, boost_label, role_label, series_label, AppState, BoostView, ChatRole, CoachFocus,
    CoachPhase, ProviderCommand, Screen, SeriesView, CHAT_CHIPS,
};
use eva_terminal::{demo_feed, feed};

/// Row heights of the dashboard cards in document order: summary, shooting
/// scatter, boost bars, win/loss drivers.
const DASH_CARD_HEIGHTS: [u16; 4] = [7, 16, 12, 12];

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn send(&mut self, cmd: ProviderCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider thread is gone");
        }
    }

    fn request_initial(&mut self) {
        self.state.dataset_loading = true;
        self.state.push_log("[INFO] Loading dataset");
        self.send(ProviderCommand::FetchDataset);
        self.send(ProviderCommand::FetchPlayers);
    }

    fn refresh_dataset(&mut self) {
        if self.state.dataset_loading {
            return;
        }
        self.state.dataset_loading = true;
        self.state.push_log("[INFO] Refreshing dataset");
        self.send(ProviderCommand::FetchDataset);
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
                self.state.help_overlay = false;
            }
            return;
        }
        match self.state.screen {
            Screen::Dashboard => self.on_dashboard_key(key),
            Screen::Coach => self.on_coach_key(key),
        }
    }

    fn on_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('c') | KeyCode::Tab => self.state.screen = Screen::Coach,
            KeyCode::Char('r') => self.refresh_dataset(),
            KeyCode::Char('v') => self.state.cycle_series_view(),
            KeyCode::Char('t') => self.state.toggle_boost_view(),
            KeyCode::Char('h') | KeyCode::Left => self.state.select_scatter_prev(),
            KeyCode::Char('l') | KeyCode::Right => self.state.select_scatter_next(),
            KeyCode::Char('j') | KeyCode::Down => {
                let last_card = (DASH_CARD_HEIGHTS.len() - 1) as u16;
                self.state.dash_scroll = (self.state.dash_scroll + 1).min(last_card);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.dash_scroll = self.state.dash_scroll.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn on_coach_key(&mut self, key: KeyEvent) {
        match self.state.coach_focus {
            CoachFocus::Search => self.on_search_key(key),
            CoachFocus::Matches => self.on_matches_key(key),
            CoachFocus::Chat => self.on_chat_key(key),
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some(cmd) = self.state.begin_search() {
                    self.send(cmd);
                }
            }
            KeyCode::Tab => {
                if self.state.visible_suggestions().is_empty() {
                    self.state.coach_focus = CoachFocus::Matches;
                } else {
                    self.state.accept_suggestion();
                }
            }
            KeyCode::Down => self.state.select_suggestion_next(),
            KeyCode::Up => self.state.select_suggestion_prev(),
            KeyCode::Backspace => {
                self.state.search_input.pop();
                self.state.suggestion_selected = 0;
            }
            KeyCode::Esc => {
                if self.state.search_input.is_empty() {
                    self.state.screen = Screen::Dashboard;
                } else {
                    self.state.search_input.clear();
                    self.state.suggestion_selected = 0;
                }
            }
            KeyCode::Char(c) => {
                self.state.search_input.push(c);
                self.state.suggestion_selected = 0;
            }
            _ => {}
        }
    }

    fn on_matches_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('d') => self.state.screen = Screen::Dashboard,
            KeyCode::Char('s') | KeyCode::Char('/') | KeyCode::Esc => {
                self.state.coach_focus = CoachFocus::Search;
            }
            KeyCode::Tab => {
                self.state.coach_focus = if self.state.chat_visible() {
                    CoachFocus::Chat
                } else {
                    CoachFocus::Search
                };
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_match_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_match_prev(),
            KeyCode::Enter => {
                if let Some(cmd) = self.state.begin_analysis() {
                    self.send(cmd);
                }
            }
            KeyCode::PageDown => {
                self.state.report_scroll = self.state.report_scroll.saturating_add(3);
            }
            KeyCode::PageUp => {
                self.state.report_scroll = self.state.report_scroll.saturating_sub(3);
            }
            _ => {}
        }
    }

    fn on_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.coach_focus = CoachFocus::Matches,
            KeyCode::Tab => self.state.coach_focus = CoachFocus::Search,
            KeyCode::Enter => {
                if let Some(cmd) = self.state.begin_chat() {
                    self.send(cmd);
                }
            }
            KeyCode::Up => {
                self.state.chat_scroll = self.state.chat_scroll.saturating_add(1);
            }
            KeyCode::Down => {
                self.state.chat_scroll = self.state.chat_scroll.saturating_sub(1);
            }
            KeyCode::Backspace => {
                self.state.chat_input.pop();
            }
            KeyCode::Char(c @ '1'..='3') if self.state.chat_input.is_empty() => {
                let chip = (c as usize) - ('1' as usize);
                if let Some(cmd) = self.state.submit_chip(chip) {
                    self.send(cmd);
                }
            }
            KeyCode::Char(c) => self.state.chat_input.push(c),
            _ => {}
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let demo = std::env::var("EVA_FEED")
        .map(|mode| mode.eq_ignore_ascii_case("demo"))
        .unwrap_or(false);
    if demo {
        demo_feed::spawn_demo_provider(tx, cmd_rx);
    } else {
        feed::spawn_provider(tx, cmd_rx);
    }

    let mut app = App::new(cmd_tx);
    app.request_initial();
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<eva_terminal::state::Delta>,
) -> io::Result<()> {
    let tick_ms = std::env::var("EVA_TICK_MS")
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(250)
        .clamp(50, 2_000);
    let tick_rate = Duration::from_millis(tick_ms);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Dashboard => render_dashboard(frame, chunks[1], &mut app.state),
        Screen::Coach => render_coach(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = match state.screen {
        Screen::Dashboard => format!(
            "EVA TERMINAL | DASHBOARD | Series: {} | Boost: {}",
            series_label(state.series_view),
            boost_label(state.boost_view)
        ),
        Screen::Coach => format!("EVA TERMINAL | COACH | {}", phase_label(state.phase)),
    };
    let line1 = format!("  .--.  {title}");
    let line2 = " ( oo )".to_string();
    let line3 = "  `--'".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Dashboard => {
            "c/Tab Coach | j/k Scroll | v Series | t Boost | h/l Point | r Refresh | ? Help | q Quit"
                .to_string()
        }
        Screen::Coach => match state.coach_focus {
            CoachFocus::Search => {
                "Type a name | Enter Search | Tab Complete/Next | Up/Down Pick | Esc Clear/Back"
                    .to_string()
            }
            CoachFocus::Matches => {
                "Enter Analyze | j/k Move | s Search | Tab Chat | PgUp/PgDn Report | d Dashboard | ? Help | q Quit"
                    .to_string()
            }
            CoachFocus::Chat => {
                "Type a question | Enter Send | 1-3 Quick questions | Up/Down Scroll | Esc Matches"
                    .to_string()
            }
        },
    }
}

fn phase_label(phase: CoachPhase) -> &'static str {
    match phase {
        CoachPhase::Idle => "IDLE",
        CoachPhase::Searching => "SEARCHING",
        CoachPhase::Listed => "LISTED",
        CoachPhase::Analyzing => "ANALYZING",
        CoachPhase::Reported => "REPORTED",
    }
}

fn dash_card_top(card: usize) -> u16 {
    DASH_CARD_HEIGHTS[..card].iter().sum()
}

fn render_dashboard(frame: &mut Frame, area: Rect, state: &mut AppState) {
    let first_card = (state.dash_scroll as usize).min(DASH_CARD_HEIGHTS.len() - 1);
    let scroll_rows = dash_card_top(first_card);

    // The chart cards reveal the first time they come near the bottom edge
    // of the viewport and stay visible from then on.
    for card in 1..DASH_CARD_HEIGHTS.len() {
        state
            .reveal
            .observe(card - 1, dash_card_top(card), scroll_rows, area.height);
    }

    let mut y = area.y;
    let bottom = area.y + area.height;
    for card in first_card..DASH_CARD_HEIGHTS.len() {
        if y + 3 > bottom {
            break;
        }
        let height = DASH_CARD_HEIGHTS[card].min(bottom - y);
        let card_area = Rect {
            x: area.x,
            y,
            width: area.width,
            height,
        };
        match card {
            0 => render_summary_card(frame, card_area, state),
            1 => render_scatter_card(frame, card_area, state),
            2 => render_boost_card(frame, card_area, state),
            _ => render_drivers_card(frame, card_area, state),
        }
        y += height;
    }
}

/// True once the chart card (1-based card index) has scrolled into view.
fn card_revealed(state: &AppState, card: usize) -> bool {
    state.reveal.is_revealed(card - 1)
}

fn render_hidden_card(frame: &mut Frame, inner: Rect) {
    let hint = Paragraph::new("Scroll down to reveal")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hint, inner);
}

fn render_summary_card(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Dataset").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let status = if state.dataset_loading {
        "Loading dataset...".to_string()
    } else if state.dataset.is_empty() {
        "No dataset. Press r to fetch again.".to_string()
    } else {
        let loaded = state
            .dataset_fetched_at
            .map(|t| DateTime::<Local>::from(t).format("%H:%M:%S").to_string())
            .unwrap_or_default();
        format!("Matches: {} (loaded {loaded})", state.dataset.len())
    };
    let (wins, losses) = dataset_stats::partition(&state.dataset);
    let text = format!(
        "{status}\nWins: {}   Losses: {}\nSeries: {}   Boost: {}\nScroll down for the charts.",
        wins.len(),
        losses.len(),
        series_label(state.series_view),
        boost_label(state.boost_view)
    );
    frame.render_widget(Paragraph::new(text), inner);
}

fn series_color(view: SeriesView) -> Color {
    match view {
        SeriesView::All => Color::Cyan,
        SeriesView::Wins => Color::Green,
        SeriesView::Losses => Color::Red,
    }
}

fn axis_labels(max: f64) -> Vec<Span<'static>> {
    vec![
        Span::from("0"),
        Span::from(dataset_stats::fmt_value(max / 2.0)),
        Span::from(dataset_stats::fmt_value(max)),
    ]
}

fn render_scatter_card(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = format!(
        "Shooting Efficiency: Shots vs Goals [{}]",
        series_label(state.series_view)
    );
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }
    if !card_revealed(state, 1) {
        render_hidden_card(frame, inner);
        return;
    }

    let points = dataset_stats::scatter_points(&state.dataset, state.series_view);
    if points.is_empty() {
        let empty = Paragraph::new("No matches in this series yet")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let (chart_area, hover_area) = if inner.height >= 3 {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        (rows[0], Some(rows[1]))
    } else {
        (inner, None)
    };

    let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.shots, p.goals)).collect();
    let x_max = points.iter().map(|p| p.shots).fold(0.0f64, f64::max).max(1.0) + 1.0;
    let y_max = points.iter().map(|p| p.goals).fold(0.0f64, f64::max).max(1.0) + 1.0;

    let selected_idx = state.scatter_selected.min(points.len() - 1);
    let selected = points[selected_idx];
    let selected_coord = [(selected.shots, selected.goals)];

    let datasets = vec![
        Dataset::default()
            .name(series_label(state.series_view))
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(series_color(state.series_view)))
            .data(&coords),
        Dataset::default()
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&selected_coord),
    ];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("Shots")
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels(axis_labels(x_max)),
        )
        .y_axis(
            Axis::default()
                .title("Goals")
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, y_max])
                .labels(axis_labels(y_max)),
        );
    frame.render_widget(chart, chart_area);

    if let Some(hover_area) = hover_area {
        let hover = format!(
            "Point {}/{}  {}",
            selected_idx + 1,
            points.len(),
            dataset_stats::hover_text(&selected)
        );
        let hover = Paragraph::new(hover).style(Style::default().fg(Color::Yellow));
        frame.render_widget(hover, hover_area);
    }
}

fn render_boost_card(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = format!("Boost Management [{}]", boost_label(state.boost_view));
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }
    if !card_revealed(state, 2) {
        render_hidden_card(frame, inner);
        return;
    }

    let totals = match state.boost_view {
        BoostView::Total => dataset_stats::boost_totals(&state.dataset),
        BoostView::Average => dataset_stats::boost_averages(&state.dataset),
    };
    let values = [
        ("Collected", totals.collected),
        ("Used", totals.used_supersonic),
        ("Stolen", totals.stolen),
    ];
    let bars: Vec<Bar> = values
        .iter()
        .map(|(label, value)| {
            Bar::default()
                .value(value.max(0.0).round() as u64)
                .text_value(dataset_stats::fmt_value(*value))
                .label(Line::from(*label))
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();
    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(11)
        .bar_gap(3);
    frame.render_widget(chart, inner);
}

fn render_drivers_card(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("What Changes Between Wins and Losses?")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }
    if !card_revealed(state, 3) {
        render_hidden_card(frame, inner);
        return;
    }

    let (wins, losses) = dataset_stats::partition(&state.dataset);
    let w = dataset_stats::driver_means(&wins);
    let l = dataset_stats::driver_means(&losses);
    let groups = [
        ("Goals", w.goals, l.goals),
        ("Shots", w.shots, l.shots),
        ("Saves", w.saves, l.saves),
        ("Demos", w.demos, l.demos),
    ];

    // Bar heights only resolve integers, so the means are scaled up and the
    // real value is printed on the bar instead.
    let scaled = |v: f64| (v.max(0.0) * 100.0).round() as u64;
    let mut grouped: Vec<[Bar; 2]> = Vec::new();
    for (_, win_value, loss_value) in groups {
        grouped.push([
            Bar::default()
                .value(scaled(win_value))
                .text_value(dataset_stats::fmt_value(win_value))
                .label(Line::from("W"))
                .style(Style::default().fg(Color::Green)),
            Bar::default()
                .value(scaled(loss_value))
                .text_value(dataset_stats::fmt_value(loss_value))
                .label(Line::from("L"))
                .style(Style::default().fg(Color::Red)),
        ]);
    }
    let mut chart = BarChart::default().bar_width(6).bar_gap(1).group_gap(3);
    for ((name, _, _), bars) in groups.iter().zip(&grouped) {
        chart = chart.data(BarGroup::default().label(Line::from(*name)).bars(bars));
    }
    frame.render_widget(chart, inner);
}

fn render_coach(frame: &mut Frame, area: Rect, state: &AppState) {
    let chat_width = if state.chat_visible() { 44 } else { 0 };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(32),
            Constraint::Min(30),
            Constraint::Length(chat_width),
        ])
        .split(area);

    render_search_column(frame, columns[0], state);
    render_report_panel(frame, columns[1], state);
    if state.chat_visible() {
        render_chat_panel(frame, columns[2], state);
    }
}

fn render_search_column(frame: &mut Frame, area: Rect, state: &AppState) {
    let suggestions: Vec<String> = state
        .visible_suggestions()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let suggestion_rows = if state.coach_focus == CoachFocus::Search && !suggestions.is_empty() {
        suggestions.len() as u16 + 2
    } else {
        0
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(suggestion_rows),
            Constraint::Min(1),
        ])
        .split(area);

    let search_focused = state.coach_focus == CoachFocus::Search;
    let border_style = if search_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let input = if search_focused {
        format!("{}_", state.search_input)
    } else if state.search_input.is_empty() {
        "Press s to search a player".to_string()
    } else {
        state.search_input.clone()
    };
    let search = Paragraph::new(input).block(
        Block::default()
            .title("Player Search")
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(search, rows[0]);

    if suggestion_rows > 0 {
        let lines: Vec<Line> = suggestions
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i == state.suggestion_selected {
                    Line::from(format!("> {name}"))
                        .style(Style::default().fg(Color::Black).bg(Color::Cyan))
                } else {
                    Line::from(format!("  {name}"))
                }
            })
            .collect();
        let list =
            Paragraph::new(lines).block(Block::default().title("Players").borders(Borders::ALL));
        frame.render_widget(list, rows[1]);
    }

    render_match_list(frame, rows[2], state);
}

fn render_match_list(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = match &state.searched_player {
        Some(player) if !state.matches.is_empty() => {
            format!("Matches: {player} ({})", state.matches.len())
        }
        Some(player) => format!("Matches: {player}"),
        None => "Matches".to_string(),
    };
    let border_style = if state.coach_focus == CoachFocus::Matches {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    if state.phase == CoachPhase::Searching {
        let player = state.searched_player.as_deref().unwrap_or_default();
        let loading = Paragraph::new(format!("Loading matches for {player}..."))
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: false });
        frame.render_widget(loading, inner);
        return;
    }
    if let Some(message) = &state.matches_error {
        let error = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false });
        frame.render_widget(error, inner);
        return;
    }
    if state.matches.is_empty() {
        let text = match (&state.phase, &state.searched_player) {
            (CoachPhase::Listed, Some(player)) => format!("No matches found for {player}."),
            _ => "Search a player to list their matches.".to_string(),
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: false });
        frame.render_widget(empty, inner);
        return;
    }

    let visible = inner.height as usize;
    let (start, end) = visible_range(state.match_selected, state.matches.len(), visible);
    let lines: Vec<Line> = state.matches[start..end]
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let idx = start + i;
            let selected = idx == state.match_selected;
            let prefix = if selected { "> " } else { "  " };
            let result_color = if m.result.eq_ignore_ascii_case("win") {
                Color::Green
            } else {
                Color::Red
            };
            let mut line = Line::from(vec![
                Span::raw(format!("{prefix}#{:<5}", m.index)),
                Span::styled(m.result.clone(), Style::default().fg(result_color)),
            ]);
            if selected {
                line = line.style(Style::default().bg(Color::DarkGray));
            }
            line
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }
    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_report_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = match &state.report {
        Some(report) => {
            let player = if report.player_name.is_empty() {
                state.searched_player.clone().unwrap_or_default()
            } else {
                report.player_name.clone()
            };
            format!("Report: {player} match #{}", report.match_index)
        }
        None => "Report".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    if state.phase == CoachPhase::Analyzing {
        let index = state.selected_match().map(|m| m.index).unwrap_or_default();
        let text = format!("Analyzing match #{index}\nSHAP can take a moment...");
        let loading = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, inner);
        return;
    }
    if let Some(message) = &state.report_error {
        let error = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false });
        frame.render_widget(error, inner);
        return;
    }
    let Some(report) = &state.report else {
        let empty = Paragraph::new("Select a match to analyze.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    };

    let text = report_text(state, report);
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((state.report_scroll, 0));
    frame.render_widget(paragraph, inner);
}

fn report_text(state: &AppState, report: &eva_terminal::state::MatchReport) -> Text<'static> {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line<'static>> = Vec::new();

    let outcome_color = |label: &str| {
        if label.eq_ignore_ascii_case("win") {
            Color::Green
        } else {
            Color::Red
        }
    };
    lines.push(Line::from(vec![
        Span::raw("Prediction: "),
        Span::styled(
            report.prediction.predicted.clone(),
            Style::default().fg(outcome_color(&report.prediction.predicted)),
        ),
    ]));
    lines.push(Line::from(format!(
        "Probability: {:.2}",
        report.prediction.probability
    )));
    lines.push(Line::from(vec![
        Span::raw("Actual: "),
        Span::styled(
            report.prediction.real.clone(),
            Style::default().fg(outcome_color(&report.prediction.real)),
        ),
    ]));

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Most influential stats (SHAP)",
        heading,
    )));
    for stat in &report.top_statistics {
        let positive = stat.shap_value >= 0.0;
        let sign = if positive { "+" } else { "-" };
        let color = if positive { Color::Green } else { Color::Red };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{sign}{:.3}", stat.shap_value.abs()),
                Style::default().fg(color),
            ),
            Span::raw(format!("  {}", stat.statistics)),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Top 3 stats to improve", heading)));
    for item in &report.to_improve {
        lines.push(Line::from(format!(
            "{}: You: {:.2} | Winners avg: {:.2}",
            item.statistics, item.player_value, item.winner_avg
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Strengths (this match)", heading)));
    lines.push(Line::from(report.strengths.join(", ")));

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Visual comparisons", heading)));
    if state.plot_files.is_empty() {
        lines.push(Line::from(Span::styled(
            "No plots in this report.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for plot in &state.plot_files {
        let detail = match (&plot.path, &plot.error) {
            (Some(path), _) => Span::styled(
                format!("{path} ({} bytes)", plot.bytes),
                Style::default().fg(Color::DarkGray),
            ),
            (None, Some(error)) => Span::styled(error.clone(), Style::default().fg(Color::Red)),
            (None, None) => Span::raw(String::new()),
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{}: ", plot.caption)),
            detail,
        ]));
    }

    Text::from(lines)
}

fn render_chat_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let chat_focused = state.coach_focus == CoachFocus::Chat;
    let border_style = if chat_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    let block = Block::default()
        .title("EVA Coach")
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(rows[0]);
    frame.render_widget(block, rows[0]);

    let lines = chat_lines(state);
    let total = lines.len() as u16;
    // Pinned to the latest message unless the user scrolled back up.
    let scroll = total
        .saturating_sub(inner.height)
        .saturating_sub(state.chat_scroll.min(total));
    let chat = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(chat, inner);

    let input = if chat_focused {
        format!("{}_", state.chat_input)
    } else {
        state.chat_input.clone()
    };
    let input = Paragraph::new(input).block(
        Block::default()
            .title("Ask EVA (1-3 quick questions)")
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(input, rows[1]);
}

fn chat_lines(state: &AppState) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for bubble in &state.chat {
        let color = match bubble.role {
            ChatRole::You => Color::Blue,
            ChatRole::Eva => Color::Cyan,
        };
        lines.push(Line::from(Span::styled(
            role_label(bubble.role),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        let body = if bubble.markdown {
            markdown::render(&bubble.text)
        } else {
            markdown::literal(&bubble.text)
        };
        for line in body.lines {
            let mut spans = vec![Span::raw("  ")];
            spans.extend(line.spans);
            lines.push(Line::from(spans));
        }
        lines.push(Line::default());
    }
    if state.chat_waiting {
        lines.push(Line::from(Span::styled(
            "EVA is thinking...",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(62, 70, area);
    frame.render_widget(Clear, popup_area);

    let mut text = vec![
        "EVA Terminal - Help".to_string(),
        String::new(),
        "Dashboard:".to_string(),
        "  j/k            Scroll cards".to_string(),
        "  v              Cycle series (All/Wins/Losses)".to_string(),
        "  t              Toggle boost totals/averages".to_string(),
        "  h/l or arrows  Pick a scatter point".to_string(),
        "  r              Refetch the dataset".to_string(),
        "  c / Tab        Coach screen".to_string(),
        String::new(),
        "Coach:".to_string(),
        "  Enter          Search / Analyze / Send".to_string(),
        "  Tab            Complete a name, then cycle focus".to_string(),
        "  j/k or arrows  Move in lists".to_string(),
        "  PgUp/PgDn      Scroll the report".to_string(),
        "  Esc            Step back".to_string(),
        String::new(),
        "Chat quick questions:".to_string(),
    ];
    for (i, chip) in CHAT_CHIPS.iter().enumerate() {
        text.push(format!("  {}              {chip}", i + 1));
    }
    text.push(String::new());
    text.push("  ?              Toggle help    q  Quit".to_string());

    let help = Paragraph::new(text.join("\n"))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
