use std::collections::VecDeque;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::dataset_stats;
use crate::plot_export::PlotFile;
use crate::reveal::RevealTracker;

/// Hard cap on match rows kept from a search, in server order.
pub const MAX_MATCH_ROWS: usize = 120;

const MAX_TOP_STATS: usize = 3;
const MAX_IMPROVEMENTS: usize = 3;
const MAX_STRENGTHS: usize = 18;

/// Suggestion rows shown under the player search box.
pub const MAX_SUGGESTIONS: usize = 8;

/// First message EVA posts into a fresh chat once a report is ready.
pub const ANALYSIS_READY_MD: &str = "**Analysis ready.** Ask me anything about this match.\n\n\
Try:\n\
- _Why did I lose this match?_\n\
- _What should I focus on next games?_\n\
- _Give me a training plan._";

/// Canned follow-up prompts, submitted with the number keys.
pub const CHAT_CHIPS: [&str; 3] = [
    "Why did I lose this match?",
    "What should I focus on next games?",
    "Give me a training plan.",
];

pub const NO_ANSWER_FALLBACK: &str = "No answer.";

pub const CHAT_UNREACHABLE_MD: &str =
    "I couldn't reach the server. Check the EVA server is running and nothing failed in its console.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Coach,
}

/// Coach screen state machine. Chat is available only in `Reported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoachPhase {
    Idle,
    Searching,
    Listed,
    Analyzing,
    Reported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoachFocus {
    Search,
    Matches,
    Chat,
}

/// Which scatter series is drawn highlighted on the shooting chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesView {
    All,
    Wins,
    Losses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostView {
    Total,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    You,
    Eva,
}

/// One row of the `/data` dataset after numeric coercion. Coercion happens
/// at parse time; `result` is normalized when the delta is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetRecord {
    pub result: String,
    pub shots: f64,
    pub goals: f64,
    pub shooting_pct: f64,
    pub boost_collected: f64,
    pub boost_used_supersonic: f64,
    pub boost_stolen: f64,
    pub saves: f64,
    pub demos_inflicted: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMatchRef {
    pub index: i64,
    #[serde(default)]
    pub result: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub predicted: String,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub real: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatImpact {
    pub statistics: String,
    #[serde(default)]
    pub shap_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementItem {
    pub statistics: String,
    #[serde(default)]
    pub player_value: f64,
    #[serde(default)]
    pub winner_avg: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportPlots {
    #[serde(default)]
    pub player_top3: String,
    #[serde(default)]
    pub winners_top3: String,
    #[serde(default)]
    pub player_weak: String,
    #[serde(default)]
    pub winners_weak: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchReport {
    #[serde(default)]
    pub match_index: i64,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub prediction: Prediction,
    #[serde(default)]
    pub top_statistics: Vec<StatImpact>,
    #[serde(default)]
    pub to_improve: Vec<ImprovementItem>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub plots: ReportPlots,
}

#[derive(Debug, Clone)]
pub struct ChatBubble {
    pub role: ChatRole,
    pub text: String,
    /// EVA answers render through the markdown styler; user text never does.
    pub markdown: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,

    // Dashboard
    pub dataset: Vec<DatasetRecord>,
    pub dataset_loading: bool,
    pub dataset_fetched_at: Option<SystemTime>,
    pub series_view: SeriesView,
    pub boost_view: BoostView,
    pub scatter_selected: usize,
    pub dash_scroll: u16,
    pub reveal: RevealTracker,

    // Coach
    pub coach_focus: CoachFocus,
    pub phase: CoachPhase,
    pub search_input: String,
    pub players: Vec<String>,
    pub players_loaded: bool,
    pub suggestion_selected: usize,
    pub searched_player: Option<String>,
    pub matches: Vec<PlayerMatchRef>,
    pub match_selected: usize,
    pub matches_error: Option<String>,
    pub report: Option<MatchReport>,
    pub report_error: Option<String>,
    pub plot_files: Vec<PlotFile>,
    pub report_scroll: u16,
    pub chat: Vec<ChatBubble>,
    pub chat_input: String,
    pub chat_waiting: bool,
    pub chat_scroll: u16,

    // Request generations; a delta tagged with an older value is stale.
    pub search_seq: u64,
    pub analysis_seq: u64,
    pub chat_thread: u64,

    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Dashboard,
            dataset: Vec::new(),
            dataset_loading: false,
            dataset_fetched_at: None,
            series_view: SeriesView::All,
            boost_view: BoostView::Total,
            scatter_selected: 0,
            dash_scroll: 0,
            reveal: RevealTracker::new(),
            coach_focus: CoachFocus::Search,
            phase: CoachPhase::Idle,
            search_input: String::new(),
            players: Vec::new(),
            players_loaded: false,
            suggestion_selected: 0,
            searched_player: None,
            matches: Vec::new(),
            match_selected: 0,
            matches_error: None,
            report: None,
            report_error: None,
            plot_files: Vec::new(),
            report_scroll: 0,
            chat: Vec::new(),
            chat_input: String::new(),
            chat_waiting: false,
            chat_scroll: 0,
            search_seq: 0,
            analysis_seq: 0,
            chat_thread: 0,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Chat panel only exists once a report is on screen.
    pub fn chat_visible(&self) -> bool {
        self.phase == CoachPhase::Reported
    }

    pub fn cycle_series_view(&mut self) {
        self.series_view = match self.series_view {
            SeriesView::All => SeriesView::Wins,
            SeriesView::Wins => SeriesView::Losses,
            SeriesView::Losses => SeriesView::All,
        };
        self.scatter_selected = 0;
    }

    pub fn toggle_boost_view(&mut self) {
        self.boost_view = match self.boost_view {
            BoostView::Total => BoostView::Average,
            BoostView::Average => BoostView::Total,
        };
    }

    pub fn scatter_point_count(&self) -> usize {
        dataset_stats::scatter_points(&self.dataset, self.series_view).len()
    }

    pub fn select_scatter_next(&mut self) {
        let total = self.scatter_point_count();
        if total == 0 {
            self.scatter_selected = 0;
            return;
        }
        self.scatter_selected = (self.scatter_selected + 1) % total;
    }

    pub fn select_scatter_prev(&mut self) {
        let total = self.scatter_point_count();
        if total == 0 {
            self.scatter_selected = 0;
            return;
        }
        if self.scatter_selected == 0 {
            self.scatter_selected = total - 1;
        } else {
            self.scatter_selected -= 1;
        }
    }

    pub fn select_match_next(&mut self) {
        let total = self.matches.len();
        if total == 0 {
            self.match_selected = 0;
            return;
        }
        self.match_selected = (self.match_selected + 1) % total;
    }

    pub fn select_match_prev(&mut self) {
        let total = self.matches.len();
        if total == 0 {
            self.match_selected = 0;
            return;
        }
        if self.match_selected == 0 {
            self.match_selected = total - 1;
        } else {
            self.match_selected -= 1;
        }
    }

    pub fn selected_match(&self) -> Option<&PlayerMatchRef> {
        self.matches.get(self.match_selected)
    }

    /// Directory names matching the current search text, for the suggestion list.
    pub fn visible_suggestions(&self) -> Vec<&str> {
        let query = self.search_input.trim();
        if query.is_empty() || !self.players_loaded {
            return Vec::new();
        }
        self.players
            .iter()
            .filter(|name| contains_ascii_ci(name, query))
            .take(MAX_SUGGESTIONS)
            .map(String::as_str)
            .collect()
    }

    pub fn select_suggestion_next(&mut self) {
        let total = self.visible_suggestions().len();
        if total == 0 {
            self.suggestion_selected = 0;
            return;
        }
        self.suggestion_selected = (self.suggestion_selected + 1) % total;
    }

    pub fn select_suggestion_prev(&mut self) {
        let total = self.visible_suggestions().len();
        if total == 0 {
            self.suggestion_selected = 0;
            return;
        }
        if self.suggestion_selected == 0 {
            self.suggestion_selected = total - 1;
        } else {
            self.suggestion_selected -= 1;
        }
    }

    /// Tab completion: copy the highlighted suggestion into the search box.
    pub fn accept_suggestion(&mut self) {
        let picked = self
            .visible_suggestions()
            .get(self.suggestion_selected)
            .map(|s| s.to_string());
        if let Some(name) = picked {
            self.search_input = name;
            self.suggestion_selected = 0;
        }
    }

    /// Submits the search box. Empty input is a no-op; otherwise the coach
    /// screen resets to a fresh search and the command to run is returned.
    /// Re-submitting while a search is in flight is allowed; every generation
    /// is bumped so answers to the old search, analysis or chat fall stale.
    pub fn begin_search(&mut self) -> Option<ProviderCommand> {
        let player = self.search_input.trim().to_string();
        if player.is_empty() {
            return None;
        }
        self.search_seq += 1;
        self.analysis_seq += 1;
        self.chat_thread += 1;
        self.phase = CoachPhase::Searching;
        self.searched_player = Some(player.clone());
        self.matches.clear();
        self.match_selected = 0;
        self.matches_error = None;
        self.discard_report();
        self.suggestion_selected = 0;
        self.push_log(format!("[INFO] Searching matches for {player}"));
        Some(ProviderCommand::FetchMatches {
            seq: self.search_seq,
            player,
        })
    }

    /// Starts analysis for the selected match. A new selection invalidates any
    /// in-flight analysis and the previous chat thread, so picking a different
    /// match while one is still being analyzed simply supersedes it.
    pub fn begin_analysis(&mut self) -> Option<ProviderCommand> {
        if !matches!(
            self.phase,
            CoachPhase::Listed | CoachPhase::Analyzing | CoachPhase::Reported
        ) {
            return None;
        }
        let (index, player) = {
            let m = self.selected_match()?;
            (m.index, self.searched_player.clone().unwrap_or_default())
        };
        self.analysis_seq += 1;
        self.chat_thread += 1;
        self.phase = CoachPhase::Analyzing;
        self.discard_report();
        self.push_log(format!("[INFO] Analyzing match #{index}"));
        Some(ProviderCommand::AnalyzeMatch {
            seq: self.analysis_seq,
            match_index: index,
            player,
        })
    }

    /// Submits the chat box. Empty input is a no-op; the question is appended
    /// as a literal bubble before the command goes out.
    pub fn begin_chat(&mut self) -> Option<ProviderCommand> {
        if self.phase != CoachPhase::Reported || self.chat_waiting {
            return None;
        }
        let question = self.chat_input.trim().to_string();
        if question.is_empty() {
            return None;
        }
        self.chat.push(ChatBubble {
            role: ChatRole::You,
            text: question.clone(),
            markdown: false,
        });
        self.chat_input.clear();
        self.chat_waiting = true;
        self.chat_scroll = 0;
        Some(ProviderCommand::SendChat {
            thread: self.chat_thread,
            question,
        })
    }

    /// Number-key chips fill the chat box and submit in one stroke.
    pub fn submit_chip(&mut self, chip: usize) -> Option<ProviderCommand> {
        let text = CHAT_CHIPS.get(chip)?;
        if self.phase != CoachPhase::Reported || self.chat_waiting {
            return None;
        }
        self.chat_input = text.to_string();
        self.begin_chat()
    }

    fn discard_report(&mut self) {
        self.report = None;
        self.report_error = None;
        self.plot_files.clear();
        self.report_scroll = 0;
        self.chat.clear();
        self.chat_input.clear();
        self.chat_waiting = false;
        self.chat_scroll = 0;
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetDataset(Vec<DatasetRecord>),
    DatasetFailed,
    SetPlayers(Vec<String>),
    SetMatches {
        seq: u64,
        player: String,
        matches: Vec<PlayerMatchRef>,
    },
    MatchesFailed {
        seq: u64,
        message: String,
    },
    SetReport {
        seq: u64,
        report: MatchReport,
        plots: Vec<PlotFile>,
    },
    ReportFailed {
        seq: u64,
        message: String,
    },
    SetChatAnswer {
        thread: u64,
        answer: Option<String>,
    },
    ChatFailed {
        thread: u64,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchDataset,
    FetchPlayers,
    FetchMatches {
        seq: u64,
        player: String,
    },
    AnalyzeMatch {
        seq: u64,
        match_index: i64,
        player: String,
    },
    SendChat {
        thread: u64,
        question: String,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetDataset(mut records) => {
            for record in &mut records {
                record.result = dataset_stats::normalize_result(&record.result);
            }
            state.dataset = records;
            state.dataset_loading = false;
            state.dataset_fetched_at = Some(SystemTime::now());
            state.scatter_selected = 0;
        }
        Delta::DatasetFailed => {
            state.dataset_loading = false;
        }
        Delta::SetPlayers(names) => {
            state.players = names;
            state.players_loaded = true;
            state.suggestion_selected = 0;
        }
        Delta::SetMatches {
            seq,
            player,
            mut matches,
        } => {
            if seq != state.search_seq {
                // Answer to an earlier search; discard.
                return;
            }
            matches.truncate(MAX_MATCH_ROWS);
            state.matches = matches;
            state.match_selected = 0;
            state.matches_error = None;
            state.searched_player = Some(player);
            state.phase = CoachPhase::Listed;
            if !state.matches.is_empty() {
                state.coach_focus = CoachFocus::Matches;
            }
        }
        Delta::MatchesFailed { seq, message } => {
            if seq != state.search_seq {
                return;
            }
            state.matches.clear();
            state.match_selected = 0;
            state.matches_error = Some(message);
            state.phase = CoachPhase::Idle;
        }
        Delta::SetReport { seq, report, plots } => {
            if seq != state.analysis_seq {
                // A newer selection superseded this analysis; discard.
                return;
            }
            let mut report = report;
            report.top_statistics.truncate(MAX_TOP_STATS);
            report.to_improve.truncate(MAX_IMPROVEMENTS);
            report.strengths.truncate(MAX_STRENGTHS);
            state.report = Some(report);
            state.plot_files = plots;
            state.report_error = None;
            state.report_scroll = 0;
            state.phase = CoachPhase::Reported;
            state.coach_focus = CoachFocus::Chat;
            state.chat.clear();
            state.chat.push(ChatBubble {
                role: ChatRole::Eva,
                text: ANALYSIS_READY_MD.to_string(),
                markdown: true,
            });
        }
        Delta::ReportFailed { seq, message } => {
            if seq != state.analysis_seq {
                return;
            }
            state.report = None;
            state.plot_files.clear();
            state.report_error = Some(message);
            state.phase = CoachPhase::Listed;
        }
        Delta::SetChatAnswer { thread, answer } => {
            if thread != state.chat_thread {
                // The chat this answers was discarded; drop it.
                return;
            }
            state.chat_waiting = false;
            state.chat.push(ChatBubble {
                role: ChatRole::Eva,
                text: answer.unwrap_or_else(|| NO_ANSWER_FALLBACK.to_string()),
                markdown: true,
            });
            state.chat_scroll = 0;
        }
        Delta::ChatFailed { thread } => {
            if thread != state.chat_thread {
                return;
            }
            state.chat_waiting = false;
            state.chat.push(ChatBubble {
                role: ChatRole::Eva,
                text: CHAT_UNREACHABLE_MD.to_string(),
                markdown: true,
            });
            state.chat_scroll = 0;
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn series_label(view: SeriesView) -> &'static str {
    match view {
        SeriesView::All => "All",
        SeriesView::Wins => "Wins",
        SeriesView::Losses => "Losses",
    }
}

pub fn boost_label(view: BoostView) -> &'static str {
    match view {
        BoostView::Total => "Total",
        BoostView::Average => "Avg / match",
    }
}

pub fn role_label(role: ChatRole) -> &'static str {
    match role {
        ChatRole::You => "You",
        ChatRole::Eva => "EVA",
    }
}

/// Case-insensitive ASCII substring search without allocating a lowercased copy.
fn contains_ascii_ci(haystack: &str, needle: &str) -> bool {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.len() > h.len() {
        return false;
    }
    if n.is_empty() {
        return true;
    }
    h.windows(n.len())
        .any(|window| window.iter().zip(n).all(|(a, b)| a.eq_ignore_ascii_case(b)))
}
