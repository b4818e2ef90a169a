use eva_terminal::state::{
    apply_delta, AppState, ChatRole, CoachPhase, Delta, MatchReport, PlayerMatchRef,
    ProviderCommand, CHAT_CHIPS,
};

fn match_row(index: i64, result: &str) -> PlayerMatchRef {
    PlayerMatchRef {
        index,
        result: result.to_string(),
    }
}

#[test]
fn full_flow_from_search_to_chat() {
    let mut state = AppState::new();
    assert_eq!(state.phase, CoachPhase::Idle);
    assert!(!state.chat_visible());

    // Search echoes the trimmed player name into the command.
    state.search_input = "  Vortex  ".to_string();
    let cmd = state.begin_search().expect("search should start");
    let (seq, player) = match cmd {
        ProviderCommand::FetchMatches { seq, player } => (seq, player),
        other => panic!("expected a matches fetch, got {other:?}"),
    };
    assert_eq!(player, "Vortex");
    assert_eq!(state.phase, CoachPhase::Searching);

    apply_delta(
        &mut state,
        Delta::SetMatches {
            seq,
            player,
            matches: vec![match_row(12, "Win"), match_row(43, "Loss")],
        },
    );
    assert_eq!(state.phase, CoachPhase::Listed);
    assert!(!state.chat_visible());

    // The analyze command carries the selected row's index.
    state.select_match_next();
    let cmd = state.begin_analysis().expect("analysis should start");
    let (seq, match_index, player) = match cmd {
        ProviderCommand::AnalyzeMatch {
            seq,
            match_index,
            player,
        } => (seq, match_index, player),
        other => panic!("expected an analyze command, got {other:?}"),
    };
    assert_eq!(match_index, 43);
    assert_eq!(player, "Vortex");
    assert_eq!(state.phase, CoachPhase::Analyzing);
    assert!(!state.chat_visible());

    apply_delta(
        &mut state,
        Delta::SetReport {
            seq,
            report: MatchReport {
                match_index: 43,
                player_name: "Vortex".to_string(),
                ..MatchReport::default()
            },
            plots: Vec::new(),
        },
    );
    assert_eq!(state.phase, CoachPhase::Reported);
    assert!(state.chat_visible());
    assert_eq!(state.chat.len(), 1);

    // Chat round trip.
    state.chat_input = "Why did this one slip away?".to_string();
    let cmd = state.begin_chat().expect("chat should start");
    let (thread, question) = match cmd {
        ProviderCommand::SendChat { thread, question } => (thread, question),
        other => panic!("expected a chat command, got {other:?}"),
    };
    assert_eq!(question, "Why did this one slip away?");
    assert!(state.chat_input.is_empty());

    apply_delta(
        &mut state,
        Delta::SetChatAnswer {
            thread,
            answer: Some("You stopped rotating.".to_string()),
        },
    );
    assert_eq!(state.chat.len(), 3);
    assert_eq!(state.chat[1].role, ChatRole::You);
    assert_eq!(state.chat[2].role, ChatRole::Eva);
    assert_eq!(state.chat[2].text, "You stopped rotating.");
}

#[test]
fn chips_fill_and_submit_in_one_stroke() {
    let mut state = AppState::new();
    state.search_input = "Vortex".to_string();
    let cmd = state.begin_search().expect("search should start");
    let seq = match cmd {
        ProviderCommand::FetchMatches { seq, .. } => seq,
        other => panic!("expected a matches fetch, got {other:?}"),
    };
    apply_delta(
        &mut state,
        Delta::SetMatches {
            seq,
            player: "Vortex".to_string(),
            matches: vec![match_row(7, "Win")],
        },
    );
    let cmd = state.begin_analysis().expect("analysis should start");
    let seq = match cmd {
        ProviderCommand::AnalyzeMatch { seq, .. } => seq,
        other => panic!("expected an analyze command, got {other:?}"),
    };
    apply_delta(
        &mut state,
        Delta::SetReport {
            seq,
            report: MatchReport::default(),
            plots: Vec::new(),
        },
    );

    let cmd = state.submit_chip(0).expect("chip should submit");
    let question = match cmd {
        ProviderCommand::SendChat { question, .. } => question,
        other => panic!("expected a chat command, got {other:?}"),
    };
    assert_eq!(question, CHAT_CHIPS[0]);
    let you = &state.chat[state.chat.len() - 1];
    assert_eq!(you.role, ChatRole::You);
    assert_eq!(you.text, CHAT_CHIPS[0]);

    // A second chip while the first is pending is refused.
    assert!(state.submit_chip(1).is_none());
}

#[test]
fn empty_inputs_are_no_ops() {
    let mut state = AppState::new();
    state.search_input = "   ".to_string();
    assert!(state.begin_search().is_none());
    assert_eq!(state.phase, CoachPhase::Idle);

    // No chat before a report exists.
    state.chat_input = "hello".to_string();
    assert!(state.begin_chat().is_none());

    // No analysis without a listed match.
    assert!(state.begin_analysis().is_none());
}

#[test]
fn directory_feeds_suggestions_and_tab_completion() {
    let mut state = AppState::new();
    // Nothing suggested before the directory loads.
    state.search_input = "v".to_string();
    assert!(state.visible_suggestions().is_empty());

    apply_delta(
        &mut state,
        Delta::SetPlayers(vec![
            "Vortex".to_string(),
            "Violet".to_string(),
            "Aqua".to_string(),
        ]),
    );
    assert_eq!(state.visible_suggestions(), vec!["Vortex", "Violet"]);

    state.select_suggestion_next();
    state.accept_suggestion();
    assert_eq!(state.search_input, "Violet");

    // Empty query suggests nothing even with the directory loaded.
    state.search_input.clear();
    assert!(state.visible_suggestions().is_empty());
}
