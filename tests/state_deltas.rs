use eva_terminal::state::{
    apply_delta, AppState, ChatRole, CoachFocus, CoachPhase, DatasetRecord, Delta, MatchReport,
    PlayerMatchRef, Prediction, ProviderCommand, StatImpact, MAX_MATCH_ROWS,
};

fn match_row(index: i64, result: &str) -> PlayerMatchRef {
    PlayerMatchRef {
        index,
        result: result.to_string(),
    }
}

fn sample_report() -> MatchReport {
    MatchReport {
        match_index: 7,
        player_name: "Vortex".to_string(),
        prediction: Prediction {
            predicted: "Win".to_string(),
            probability: 0.91,
            real: "Loss".to_string(),
        },
        top_statistics: (0..4)
            .map(|i| StatImpact {
                statistics: format!("stat {i}"),
                shap_value: 0.1 * i as f64,
            })
            .collect(),
        to_improve: Vec::new(),
        strengths: (0..20).map(|i| format!("strength {i}")).collect(),
        ..MatchReport::default()
    }
}

fn search_seq(state: &mut AppState, player: &str) -> u64 {
    state.search_input = player.to_string();
    let cmd = state.begin_search().expect("search should start");
    match cmd {
        ProviderCommand::FetchMatches { seq, .. } => seq,
        other => panic!("expected a matches fetch, got {other:?}"),
    }
}

fn analysis_seq(state: &mut AppState) -> u64 {
    let cmd = state.begin_analysis().expect("analysis should start");
    match cmd {
        ProviderCommand::AnalyzeMatch { seq, .. } => seq,
        other => panic!("expected an analyze command, got {other:?}"),
    }
}

fn listed_state(player: &str, rows: Vec<PlayerMatchRef>) -> AppState {
    let mut state = AppState::new();
    let seq = search_seq(&mut state, player);
    apply_delta(
        &mut state,
        Delta::SetMatches {
            seq,
            player: player.to_string(),
            matches: rows,
        },
    );
    state
}

fn reported_state() -> AppState {
    let mut state = listed_state("Vortex", vec![match_row(7, "Win"), match_row(9, "Loss")]);
    let seq = analysis_seq(&mut state);
    apply_delta(
        &mut state,
        Delta::SetReport {
            seq,
            report: sample_report(),
            plots: Vec::new(),
        },
    );
    state
}

#[test]
fn dataset_results_normalize_on_apply() {
    let mut state = AppState::new();
    state.dataset_loading = true;
    let records: Vec<DatasetRecord> = ["winner", "loser", "win", "draw"]
        .iter()
        .map(|label| DatasetRecord {
            result: label.to_string(),
            ..DatasetRecord::default()
        })
        .collect();
    apply_delta(&mut state, Delta::SetDataset(records));
    let labels: Vec<&str> = state.dataset.iter().map(|r| r.result.as_str()).collect();
    assert_eq!(labels, vec!["win", "loss", "win", "draw"]);
    assert!(!state.dataset_loading);
    assert!(state.dataset_fetched_at.is_some());
}

#[test]
fn match_list_caps_at_120_rows_in_server_order() {
    let rows: Vec<PlayerMatchRef> = (0..150).map(|i| match_row(i, "Win")).collect();
    let state = listed_state("Vortex", rows);
    assert_eq!(state.matches.len(), MAX_MATCH_ROWS);
    assert_eq!(state.matches[0].index, 0);
    assert_eq!(state.matches[MAX_MATCH_ROWS - 1].index, 119);
    assert_eq!(state.phase, CoachPhase::Listed);
    assert_eq!(state.coach_focus, CoachFocus::Matches);
}

#[test]
fn empty_match_list_still_reaches_listed() {
    let state = listed_state("Nobody", Vec::new());
    assert!(state.matches.is_empty());
    assert_eq!(state.phase, CoachPhase::Listed);
    assert_eq!(state.searched_player.as_deref(), Some("Nobody"));
    // Focus stays on the search box when there is nothing to select.
    assert_eq!(state.coach_focus, CoachFocus::Search);
}

#[test]
fn stale_match_response_is_discarded_after_a_newer_search() {
    let mut state = AppState::new();
    let first = search_seq(&mut state, "Aqua");
    let second = search_seq(&mut state, "Vortex");
    assert!(second > first);

    apply_delta(
        &mut state,
        Delta::SetMatches {
            seq: first,
            player: "Aqua".to_string(),
            matches: vec![match_row(1, "Win")],
        },
    );
    assert!(state.matches.is_empty());
    assert_eq!(state.phase, CoachPhase::Searching);
    assert_eq!(state.searched_player.as_deref(), Some("Vortex"));

    apply_delta(
        &mut state,
        Delta::SetMatches {
            seq: second,
            player: "Vortex".to_string(),
            matches: vec![match_row(2, "Loss")],
        },
    );
    assert_eq!(state.matches.len(), 1);
    assert_eq!(state.matches[0].index, 2);
    assert_eq!(state.phase, CoachPhase::Listed);
}

#[test]
fn failed_search_clears_rows_and_keeps_the_message() {
    let mut state = listed_state("Vortex", vec![match_row(7, "Win")]);
    let seq = search_seq(&mut state, "Aqua");
    apply_delta(
        &mut state,
        Delta::MatchesFailed {
            seq,
            message: "Error loading matches. Is the EVA server running?".to_string(),
        },
    );
    assert!(state.matches.is_empty());
    assert_eq!(
        state.matches_error.as_deref(),
        Some("Error loading matches. Is the EVA server running?")
    );
    assert_eq!(state.phase, CoachPhase::Idle);
}

#[test]
fn report_arrival_caps_lists_and_seeds_one_intro_bubble() {
    let state = reported_state();
    let report = state.report.as_ref().expect("report should be kept");
    assert_eq!(report.top_statistics.len(), 3);
    assert_eq!(report.strengths.len(), 18);
    assert_eq!(state.phase, CoachPhase::Reported);
    assert_eq!(state.coach_focus, CoachFocus::Chat);
    assert!(state.chat_visible());

    assert_eq!(state.chat.len(), 1);
    assert_eq!(state.chat[0].role, ChatRole::Eva);
    assert!(state.chat[0].markdown);
    assert!(state.chat[0].text.starts_with("**Analysis ready.**"));
}

#[test]
fn new_selection_supersedes_an_inflight_analysis() {
    let mut state = listed_state("Vortex", vec![match_row(7, "Win"), match_row(9, "Loss")]);
    let first = analysis_seq(&mut state);
    assert_eq!(state.phase, CoachPhase::Analyzing);

    // Picking another match while the first is still being analyzed starts
    // over; the older report must not land.
    state.select_match_next();
    let second = analysis_seq(&mut state);
    assert!(second > first);

    apply_delta(
        &mut state,
        Delta::SetReport {
            seq: first,
            report: sample_report(),
            plots: Vec::new(),
        },
    );
    assert!(state.report.is_none());
    assert_eq!(state.phase, CoachPhase::Analyzing);
    assert!(state.chat.is_empty());

    apply_delta(
        &mut state,
        Delta::SetReport {
            seq: second,
            report: sample_report(),
            plots: Vec::new(),
        },
    );
    assert!(state.report.is_some());
    assert_eq!(state.phase, CoachPhase::Reported);
}

#[test]
fn analysis_failure_returns_to_the_match_list() {
    let mut state = listed_state("Vortex", vec![match_row(7, "Win")]);
    let seq = analysis_seq(&mut state);
    apply_delta(
        &mut state,
        Delta::ReportFailed {
            seq,
            message: "Error analyzing match. Is the EVA server running?".to_string(),
        },
    );
    assert!(state.report.is_none());
    assert_eq!(
        state.report_error.as_deref(),
        Some("Error analyzing match. Is the EVA server running?")
    );
    assert_eq!(state.phase, CoachPhase::Listed);
    assert!(!state.chat_visible());
}

#[test]
fn chat_answer_falls_back_when_the_server_sends_none() {
    let mut state = reported_state();
    state.chat_input = "Why?".to_string();
    let cmd = state.begin_chat().expect("chat should start");
    let thread = match cmd {
        ProviderCommand::SendChat { thread, .. } => thread,
        other => panic!("expected a chat command, got {other:?}"),
    };
    assert!(state.chat_waiting);
    assert_eq!(state.chat.len(), 2);
    assert_eq!(state.chat[1].role, ChatRole::You);
    assert!(!state.chat[1].markdown);

    apply_delta(&mut state, Delta::SetChatAnswer { thread, answer: None });
    assert!(!state.chat_waiting);
    assert_eq!(state.chat.len(), 3);
    assert_eq!(state.chat[2].text, "No answer.");
}

#[test]
fn chat_failure_posts_the_unreachable_bubble() {
    let mut state = reported_state();
    state.chat_input = "Why?".to_string();
    let cmd = state.begin_chat().expect("chat should start");
    let thread = match cmd {
        ProviderCommand::SendChat { thread, .. } => thread,
        other => panic!("expected a chat command, got {other:?}"),
    };
    apply_delta(&mut state, Delta::ChatFailed { thread });
    assert!(!state.chat_waiting);
    let last = state.chat.last().expect("bubble should exist");
    assert_eq!(last.role, ChatRole::Eva);
    assert!(last.text.contains("couldn't reach the server"));
}

#[test]
fn answer_for_a_discarded_chat_thread_is_dropped() {
    let mut state = reported_state();
    state.chat_input = "Why?".to_string();
    let cmd = state.begin_chat().expect("chat should start");
    let old_thread = match cmd {
        ProviderCommand::SendChat { thread, .. } => thread,
        other => panic!("expected a chat command, got {other:?}"),
    };

    // Re-analyzing opens a new thread and clears the transcript.
    let seq = analysis_seq(&mut state);
    apply_delta(
        &mut state,
        Delta::SetReport {
            seq,
            report: sample_report(),
            plots: Vec::new(),
        },
    );
    assert_eq!(state.chat.len(), 1);

    apply_delta(
        &mut state,
        Delta::SetChatAnswer {
            thread: old_thread,
            answer: Some("too late".to_string()),
        },
    );
    assert_eq!(state.chat.len(), 1);
    assert!(!state.chat_waiting);
}

#[test]
fn log_deltas_append_to_the_console() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::Log("[INFO] Dataset loaded".to_string()));
    assert_eq!(state.logs.len(), 1);
    assert_eq!(state.logs[0], "[INFO] Dataset loaded");
}
