use crate::state::{DatasetRecord, SeriesView};

/// Normalizes the dataset's `result` labels. The upstream dataset mixes
/// "winner"/"loser" with "win"/"loss"; anything else passes through.
pub fn normalize_result(raw: &str) -> String {
    match raw {
        "winner" => "win".to_string(),
        "loser" => "loss".to_string(),
        other => other.to_string(),
    }
}

pub fn is_win(record: &DatasetRecord) -> bool {
    record.result == "win"
}

pub fn is_loss(record: &DatasetRecord) -> bool {
    record.result == "loss"
}

/// Splits records into (wins, losses). Records with any other result label
/// appear in neither subset, only in the full set.
pub fn partition(records: &[DatasetRecord]) -> (Vec<&DatasetRecord>, Vec<&DatasetRecord>) {
    let wins = records.iter().filter(|r| is_win(r)).collect();
    let losses = records.iter().filter(|r| is_loss(r)).collect();
    (wins, losses)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostTotals {
    pub collected: f64,
    pub used_supersonic: f64,
    pub stolen: f64,
}

pub fn boost_totals(records: &[DatasetRecord]) -> BoostTotals {
    let mut totals = BoostTotals {
        collected: 0.0,
        used_supersonic: 0.0,
        stolen: 0.0,
    };
    for r in records {
        totals.collected += r.boost_collected;
        totals.used_supersonic += r.boost_used_supersonic;
        totals.stolen += r.boost_stolen;
    }
    totals
}

pub fn boost_averages(records: &[DatasetRecord]) -> BoostTotals {
    let totals = boost_totals(records);
    if records.is_empty() {
        return totals;
    }
    let n = records.len() as f64;
    BoostTotals {
        collected: totals.collected / n,
        used_supersonic: totals.used_supersonic / n,
        stolen: totals.stolen / n,
    }
}

/// Per-match means of the four "what drives winning" metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverMeans {
    pub goals: f64,
    pub shots: f64,
    pub saves: f64,
    pub demos: f64,
}

pub fn driver_means(subset: &[&DatasetRecord]) -> DriverMeans {
    let mut means = DriverMeans {
        goals: 0.0,
        shots: 0.0,
        saves: 0.0,
        demos: 0.0,
    };
    if subset.is_empty() {
        return means;
    }
    for r in subset {
        means.goals += r.goals;
        means.shots += r.shots;
        means.saves += r.saves;
        means.demos += r.demos_inflicted;
    }
    let n = subset.len() as f64;
    means.goals /= n;
    means.shots /= n;
    means.saves /= n;
    means.demos /= n;
    means
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub shots: f64,
    pub goals: f64,
    pub shooting_pct: f64,
    pub win: bool,
}

/// Points for the shooting chart under the selected series. `All` keeps every
/// record, including ones whose result label is neither win nor loss.
pub fn scatter_points(records: &[DatasetRecord], view: SeriesView) -> Vec<ScatterPoint> {
    records
        .iter()
        .filter(|r| match view {
            SeriesView::All => true,
            SeriesView::Wins => is_win(r),
            SeriesView::Losses => is_loss(r),
        })
        .map(|r| ScatterPoint {
            shots: r.shots,
            goals: r.goals,
            shooting_pct: r.shooting_pct,
            win: is_win(r),
        })
        .collect()
}

pub fn hover_text(point: &ScatterPoint) -> String {
    format!(
        "Shots: {}  Goals: {}  Shooting %: {}",
        fmt_value(point.shots),
        fmt_value(point.goals),
        fmt_value(point.shooting_pct)
    )
}

/// Integral values print without a fraction, everything else with two decimals.
pub fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}
