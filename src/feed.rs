use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::coach_fetch::{self, ReportOutcome};
use crate::dataset_fetch;
use crate::http_client::server_base;
use crate::plot_export;
use crate::state::{Delta, ProviderCommand};

/// Provider thread backed by the EVA analytics server. Commands run serially
/// in arrival order; results come back as deltas tagged with the command's
/// generation token. The thread ends when the command channel closes.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let _ = tx.send(Delta::Log(format!("[INFO] EVA server: {}", server_base())));
        while let Ok(cmd) = cmd_rx.recv() {
            run_command(&tx, cmd);
        }
    });
}

fn run_command(tx: &Sender<Delta>, cmd: ProviderCommand) {
    match cmd {
        ProviderCommand::FetchDataset => match dataset_fetch::fetch_dataset() {
            Ok(records) => {
                let _ = tx.send(Delta::Log(format!(
                    "[INFO] Dataset loaded ({} matches)",
                    records.len()
                )));
                let _ = tx.send(Delta::SetDataset(records));
            }
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Dataset fetch failed: {err:#}")));
                let _ = tx.send(Delta::DatasetFailed);
            }
        },
        ProviderCommand::FetchPlayers => match coach_fetch::fetch_players() {
            Ok(names) => {
                let _ = tx.send(Delta::SetPlayers(names));
            }
            Err(err) => {
                // The directory only feeds suggestions; its absence is not fatal.
                let _ = tx.send(Delta::Log(format!(
                    "[WARN] Player directory unavailable: {err:#}"
                )));
                let _ = tx.send(Delta::SetPlayers(Vec::new()));
            }
        },
        ProviderCommand::FetchMatches { seq, player } => {
            match coach_fetch::fetch_matches(&player) {
                Ok(matches) => {
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
                Err(err) => {
                    let _ = tx.send(Delta::Log(format!("[WARN] Match search failed: {err:#}")));
                    let _ = tx.send(Delta::MatchesFailed {
                        seq,
                        message: offline_hint("loading matches"),
                    });
                }
            }
        }
        ProviderCommand::AnalyzeMatch {
            seq, match_index, ..
        } => match coach_fetch::request_analysis(match_index) {
            Ok(ReportOutcome::Report(report)) => {
                let plots = plot_export::export_report_plots(&report);
                for plot in &plots {
                    if let Some(error) = &plot.error {
                        let _ = tx.send(Delta::Log(format!(
                            "[WARN] Plot \"{}\": {error}",
                            plot.caption
                        )));
                    }
                }
                let _ = tx.send(Delta::SetReport { seq, report, plots });
            }
            Ok(ReportOutcome::ServerError(message)) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Analyze refused: {message}")));
                let _ = tx.send(Delta::ReportFailed { seq, message });
            }
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Analyze failed: {err:#}")));
                let _ = tx.send(Delta::ReportFailed {
                    seq,
                    message: offline_hint("analyzing match"),
                });
            }
        },
        ProviderCommand::SendChat { thread, question } => {
            match coach_fetch::send_chat(&question) {
                Ok(answer) => {
                    let _ = tx.send(Delta::SetChatAnswer { thread, answer });
                }
                Err(err) => {
                    let _ = tx.send(Delta::Log(format!("[WARN] Chat failed: {err:#}")));
                    let _ = tx.send(Delta::ChatFailed { thread });
                }
            }
        }
    }
}

fn offline_hint(action: &str) -> String {
    format!(
        "Error {action}. Is the EVA server running at {}?",
        server_base()
    )
}
