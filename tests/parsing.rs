use std::fs;
use std::path::PathBuf;

use eva_terminal::coach_fetch::{
    parse_chat_json, parse_matches_json, parse_players_json, parse_report_json, ReportOutcome,
};
use eva_terminal::dataset_fetch::parse_dataset_json;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_dataset_fixture_with_coercion() {
    let raw = read_fixture("dataset.json");
    let records = parse_dataset_json(&raw).expect("fixture should parse");
    assert_eq!(records.len(), 3);

    // Result labels stay raw at the parse boundary; normalization happens
    // when the delta is applied.
    assert_eq!(records[0].result, "winner");
    assert_eq!(records[0].shots, 7.0);
    assert_eq!(records[0].shooting_pct, 42.86);
    assert_eq!(records[0].boost_used_supersonic, 612.5);

    // Numeric strings parse, null and junk coerce to zero.
    assert_eq!(records[1].shots, 5.0);
    assert_eq!(records[1].goals, 0.0);
    assert_eq!(records[1].shooting_pct, 0.0);
    assert_eq!(records[1].boost_used_supersonic, 0.0);

    // Missing columns read as zero.
    assert_eq!(records[2].boost_used_supersonic, 0.0);
    assert_eq!(records[2].saves, 3.0);
}

#[test]
fn dataset_empty_and_null_bodies_are_empty() {
    assert!(parse_dataset_json("").expect("empty body").is_empty());
    assert!(parse_dataset_json("null").expect("null body").is_empty());
}

#[test]
fn parses_matches_fixture() {
    let raw = read_fixture("matches.json");
    let matches = parse_matches_json(&raw).expect("fixture should parse");
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0].index, 12);
    assert_eq!(matches[0].result, "Win");
    assert_eq!(matches[1].index, 43);
    assert_eq!(matches[1].result, "Loss");
}

#[test]
fn matches_without_the_field_are_empty() {
    assert!(parse_matches_json("{}").expect("bare object").is_empty());
    assert!(parse_matches_json("null").expect("null body").is_empty());
}

#[test]
fn parses_players_list() {
    let players = parse_players_json(r#"["Aqua", "Vortex"]"#).expect("players should parse");
    assert_eq!(players, vec!["Aqua".to_string(), "Vortex".to_string()]);
    assert!(parse_players_json("null").expect("null body").is_empty());
}

#[test]
fn parses_report_fixture() {
    let raw = read_fixture("report.json");
    let outcome = parse_report_json(&raw).expect("fixture should parse");
    let ReportOutcome::Report(report) = outcome else {
        panic!("expected a report, got a server error");
    };
    assert_eq!(report.match_index, 43);
    assert_eq!(report.player_name, "Vortex");
    assert_eq!(report.prediction.predicted, "Loss");
    assert!((report.prediction.probability - 0.8134).abs() < 1e-9);
    // The parse boundary keeps whatever the server sent; display caps are
    // applied when the report lands in state.
    assert_eq!(report.top_statistics.len(), 4);
    assert_eq!(report.to_improve.len(), 2);
    assert_eq!(report.strengths.len(), 3);
    assert_eq!(report.plots.player_top3, "aGVsbG8=");
    assert!(report.plots.winners_top3.is_empty());
}

#[test]
fn report_error_field_wins_over_everything_else() {
    let raw = read_fixture("report_error.json");
    let outcome = parse_report_json(&raw).expect("fixture should parse");
    let ReportOutcome::ServerError(message) = outcome else {
        panic!("expected a server error");
    };
    assert_eq!(message, "No model for this playlist.");
}

#[test]
fn parses_chat_fixture() {
    let raw = read_fixture("chat.json");
    let answer = parse_chat_json(&raw).expect("fixture should parse");
    assert_eq!(
        answer.as_deref(),
        Some("**Rotate** earlier after your third touch.")
    );
}

#[test]
fn chat_without_an_answer_is_none() {
    assert!(parse_chat_json("{}").expect("bare object").is_none());
    assert!(
        parse_chat_json(r#"{"answer": ""}"#)
            .expect("empty answer")
            .is_none()
    );
}
