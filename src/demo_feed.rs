use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::plot_export;
use crate::state::{
    Delta, DatasetRecord, ImprovementItem, MatchReport, PlayerMatchRef, Prediction,
    ProviderCommand, ReportPlots, StatImpact,
};

/// 1x1 transparent PNG, so exported demo plots are real image files.
const TINY_PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

const DEMO_PLAYERS: [&str; 8] = [
    "Aqua", "BoostLord", "Calyx", "DriftKing", "Kronos", "Nimbus", "Pyre", "Vortex",
];

/// Offline provider. Answers every command from synthesized data so the UI can
/// be exercised without the analytics server (`EVA_FEED=demo`).
pub fn spawn_demo_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let dataset = seed_dataset(&mut rng);
        let _ = tx.send(Delta::Log("[INFO] Demo feed active (no server)".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::FetchDataset => {
                    simulated_latency(&mut rng, 150, 400);
                    let _ = tx.send(Delta::Log(format!(
                        "[INFO] Dataset loaded ({} matches)",
                        dataset.len()
                    )));
                    let _ = tx.send(Delta::SetDataset(dataset.clone()));
                }
                ProviderCommand::FetchPlayers => {
                    simulated_latency(&mut rng, 100, 250);
                    let names = DEMO_PLAYERS.iter().map(|s| s.to_string()).collect();
                    let _ = tx.send(Delta::SetPlayers(names));
                }
                ProviderCommand::FetchMatches { seq, player } => {
                    simulated_latency(&mut rng, 200, 500);
                    let matches = seed_matches(&player, &mut rng);
                    let _ = tx.send(Delta::Log(format!(
                        "[INFO] {} matches for {player}",
                        matches.len()
                    )));
                    let _ = tx.send(Delta::SetMatches {
                        seq,
                        player,
                        matches,
                    });
                }
                ProviderCommand::AnalyzeMatch {
                    seq,
                    match_index,
                    player,
                } => {
                    // SHAP would take a moment; so does the demo.
                    simulated_latency(&mut rng, 600, 1400);
                    let report = seed_report(match_index, &player, &mut rng);
                    let plots = plot_export::export_report_plots(&report);
                    let _ = tx.send(Delta::SetReport { seq, report, plots });
                }
                ProviderCommand::SendChat { thread, question } => {
                    simulated_latency(&mut rng, 400, 900);
                    let _ = tx.send(Delta::SetChatAnswer {
                        thread,
                        answer: Some(canned_answer(&question)),
                    });
                }
            }
        }
    });
}

fn simulated_latency(rng: &mut impl Rng, low: u64, high: u64) {
    thread::sleep(Duration::from_millis(rng.gen_range(low..high)));
}

fn seed_dataset(rng: &mut impl Rng) -> Vec<DatasetRecord> {
    let mut records = Vec::with_capacity(160);
    for i in 0..160 {
        let win = rng.gen_bool(0.55);
        let shots = rng.gen_range(1..=12) as f64;
        let goals = if win {
            rng.gen_range(0..=4).min(shots as u32) as f64
        } else {
            rng.gen_range(0..=2).min(shots as u32) as f64
        };
        let shooting_pct = if shots > 0.0 { goals / shots * 100.0 } else { 0.0 };
        // Mix the raw labels the upstream dataset uses so normalization runs.
        let result = match (win, i % 2) {
            (true, 0) => "win",
            (true, _) => "winner",
            (false, 0) => "loss",
            (false, _) => "loser",
        };
        records.push(DatasetRecord {
            result: result.to_string(),
            shots,
            goals,
            shooting_pct,
            boost_collected: rng.gen_range(1800.0..3400.0),
            boost_used_supersonic: rng.gen_range(300.0..900.0),
            boost_stolen: rng.gen_range(150.0..650.0),
            saves: rng.gen_range(0..=5) as f64,
            demos_inflicted: rng.gen_range(0..=4) as f64,
        });
    }
    records
}

fn seed_matches(player: &str, rng: &mut impl Rng) -> Vec<PlayerMatchRef> {
    let known = DEMO_PLAYERS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(player.trim()));
    if !known {
        return Vec::new();
    }
    let count = rng.gen_range(6..=18);
    (0..count)
        .map(|i| PlayerMatchRef {
            index: 100 + i,
            result: if rng.gen_bool(0.5) { "Win" } else { "Loss" }.to_string(),
        })
        .collect()
}

fn seed_report(match_index: i64, player: &str, rng: &mut impl Rng) -> MatchReport {
    let won = rng.gen_bool(0.5);
    let label = |w: bool| if w { "Win" } else { "Loss" }.to_string();
    let tiny = TINY_PNG_B64.to_string();
    MatchReport {
        match_index,
        player_name: player.to_string(),
        prediction: Prediction {
            predicted: label(won),
            probability: rng.gen_range(0.55..0.97),
            real: label(won == rng.gen_bool(0.85)),
        },
        top_statistics: vec![
            StatImpact {
                statistics: "amount collected".to_string(),
                shap_value: rng.gen_range(0.05..0.4),
            },
            StatImpact {
                statistics: "shooting percentage".to_string(),
                shap_value: rng.gen_range(-0.3..0.3),
            },
            StatImpact {
                statistics: "saves".to_string(),
                shap_value: rng.gen_range(-0.25..-0.02),
            },
        ],
        to_improve: vec![
            ImprovementItem {
                statistics: "amount stolen".to_string(),
                player_value: rng.gen_range(80.0..220.0),
                winner_avg: rng.gen_range(260.0..420.0),
            },
            ImprovementItem {
                statistics: "demos inflicted".to_string(),
                player_value: rng.gen_range(0.0..1.2),
                winner_avg: rng.gen_range(1.4..2.4),
            },
            ImprovementItem {
                statistics: "shots".to_string(),
                player_value: rng.gen_range(2.0..5.0),
                winner_avg: rng.gen_range(5.5..8.0),
            },
        ],
        strengths: vec![
            "goals".to_string(),
            "amount collected".to_string(),
            "time supersonic speed".to_string(),
            "amount overfill".to_string(),
            "count powerslide".to_string(),
        ],
        plots: ReportPlots {
            player_top3: tiny.clone(),
            winners_top3: tiny.clone(),
            player_weak: tiny.clone(),
            winners_weak: tiny,
        },
    }
}

fn canned_answer(question: &str) -> String {
    let q = question.to_lowercase();
    if q.contains("lose") || q.contains("lost") {
        "**Short version:** you ran dry on boost in defense.\n\n\
- Your stolen boost was well under the winners' average\n\
- Most goals against came while you were below 20 boost\n\n\
Keep a small pad route on your own half and the losses tighten up."
            .to_string()
    } else if q.contains("focus") || q.contains("improve") {
        "Focus on **boost economy** first.\n\n\
- Collect small pads instead of committing to far corner boost\n\
- Steal opponent pads on every safe touch\n\
- Shooting comes second; your percentage follows from composure, not volume"
            .to_string()
    } else if q.contains("training") || q.contains("plan") {
        "Here is a 30-minute plan:\n\n\
- 10 min small-pad rotation in free play\n\
- 10 min shooting pack, only shots you would take in a game\n\
- 5 min demo awareness replays\n\
- 5 min review of this match's weak stats"
            .to_string()
    } else {
        "Good question. Compare your numbers against the winners' averages in the \
report: the gap tells you what to drill next. Ask me for a _training plan_ if \
you want something concrete."
            .to_string()
    }
}
