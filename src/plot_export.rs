use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Local;

use crate::state::{MatchReport, ReportPlots};

const PLOTS_DIR: &str = "eva_terminal";

/// Where one report plot ended up on disk, or why it did not.
#[derive(Debug, Clone)]
pub struct PlotFile {
    pub caption: &'static str,
    pub path: Option<String>,
    pub bytes: u64,
    pub error: Option<String>,
}

/// Decodes the four report plots and writes them under the plots directory.
/// One bad plot never sinks the others; its entry carries the error instead.
pub fn export_report_plots(report: &MatchReport) -> Vec<PlotFile> {
    match plots_dir(report.match_index) {
        Ok(dir) => export_into(&dir, &report.plots),
        Err(err) => {
            let reason = format!("{err:#}");
            captioned_sources(&report.plots)
                .into_iter()
                .map(|(caption, _, _)| PlotFile {
                    caption,
                    path: None,
                    bytes: 0,
                    error: Some(reason.clone()),
                })
                .collect()
        }
    }
}

fn export_into(dir: &Path, plots: &ReportPlots) -> Vec<PlotFile> {
    captioned_sources(plots)
        .into_iter()
        .map(|(caption, stem, encoded)| match write_plot(dir, stem, encoded) {
            Ok((path, bytes)) => PlotFile {
                caption,
                path: Some(path),
                bytes,
                error: None,
            },
            Err(err) => PlotFile {
                caption,
                path: None,
                bytes: 0,
                error: Some(format!("{err:#}")),
            },
        })
        .collect()
}

fn captioned_sources(plots: &ReportPlots) -> [(&'static str, &'static str, &str); 4] {
    [
        (
            "Your top influential stats",
            "player_top3",
            plots.player_top3.as_str(),
        ),
        (
            "Winners avg on the same stats",
            "winners_top3",
            plots.winners_top3.as_str(),
        ),
        (
            "Your weakest stats (vs winners)",
            "player_weak",
            plots.player_weak.as_str(),
        ),
        (
            "Winners avg on those weak stats",
            "winners_weak",
            plots.winners_weak.as_str(),
        ),
    ]
}

fn write_plot(dir: &Path, stem: &str, encoded: &str) -> Result<(String, u64)> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        bail!("plot missing from the report");
    }
    let bytes = STANDARD
        .decode(encoded)
        .context("plot was not valid base64")?;
    fs::create_dir_all(dir).context("create plots dir")?;
    let path = dir.join(format!("{stem}.png"));
    let tmp = dir.join(format!("{stem}.png.tmp"));
    fs::write(&tmp, &bytes).context("write plot file")?;
    fs::rename(&tmp, &path).context("swap plot file")?;
    Ok((path.display().to_string(), bytes.len() as u64))
}

fn plots_dir(match_index: i64) -> Result<PathBuf> {
    let base =
        plots_base().context("no writable plots location (set EVA_PLOTS_DIR or HOME)")?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    Ok(base.join(format!("match-{match_index}-{stamp}")))
}

fn plots_base() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("EVA_PLOTS_DIR") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(PLOTS_DIR).join("plots"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(PLOTS_DIR)
            .join("plots"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_plot_decodes_and_lands_the_file() {
        let dir = std::env::temp_dir().join(format!("eva-plot-write-{}", std::process::id()));
        let (path, bytes) = write_plot(&dir, "player_top3", "aGVsbG8=").expect("write plot");
        assert_eq!(bytes, 5);
        assert!(Path::new(&path).exists());
        assert!(path.ends_with("player_top3.png"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn bad_base64_is_an_error_not_a_file() {
        let dir = std::env::temp_dir().join(format!("eva-plot-bad-{}", std::process::id()));
        assert!(write_plot(&dir, "winners_top3", "!!!not-base64!!!").is_err());
        assert!(!dir.join("winners_top3.png").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_plot_data_is_an_error() {
        let dir = std::env::temp_dir().join("eva-plot-empty");
        assert!(write_plot(&dir, "player_weak", "   ").is_err());
    }

    #[test]
    fn one_bad_plot_does_not_sink_the_rest() {
        let dir = std::env::temp_dir().join(format!("eva-plot-mixed-{}", std::process::id()));
        let plots = ReportPlots {
            player_top3: "aGVsbG8=".to_string(),
            winners_top3: "!!!".to_string(),
            player_weak: "aGVsbG8=".to_string(),
            winners_weak: String::new(),
        };
        let files = export_into(&dir, &plots);
        assert_eq!(files.len(), 4);
        assert!(files[0].error.is_none() && files[0].bytes == 5);
        assert!(files[1].error.is_some());
        assert!(files[2].error.is_none());
        assert!(files[3].error.is_some());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn captions_cover_all_four_plots() {
        let report = MatchReport::default();
        let sources = captioned_sources(&report.plots);
        assert_eq!(sources[0].0, "Your top influential stats");
        assert_eq!(sources[3].1, "winners_weak");
    }
}
