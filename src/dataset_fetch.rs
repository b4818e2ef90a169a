use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::http_client::{http_client, server_url};
use crate::state::DatasetRecord;

pub fn fetch_dataset() -> Result<Vec<DatasetRecord>> {
    let client = http_client()?;
    let url = server_url("/data");
    let resp = client.get(&url).send().context("dataset request failed")?;
    if !resp.status().is_success() {
        bail!("dataset request returned {}", resp.status());
    }
    let body = resp.text().context("dataset body was not readable")?;
    parse_dataset_json(&body)
}

/// Parses the `/data` payload: a JSON array of match rows keyed by the
/// server's column names ("shooting percentage", "amount collected", ...).
pub fn parse_dataset_json(raw: &str) -> Result<Vec<DatasetRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let rows: Vec<Value> =
        serde_json::from_str(trimmed).context("dataset json was not an array")?;
    Ok(rows.iter().map(record_from_row).collect())
}

fn record_from_row(row: &Value) -> DatasetRecord {
    DatasetRecord {
        result: row
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        shots: num_field(row, "shots"),
        goals: num_field(row, "goals"),
        shooting_pct: num_field(row, "shooting percentage"),
        boost_collected: num_field(row, "amount collected"),
        boost_used_supersonic: num_field(row, "amount used while supersonic"),
        boost_stolen: num_field(row, "amount stolen"),
        saves: num_field(row, "saves"),
        demos_inflicted: num_field(row, "demos inflicted"),
    }
}

fn num_field(row: &Value, key: &str) -> f64 {
    row.get(key).map(coerce_num).unwrap_or(0.0)
}

/// Numeric coercion for dataset cells: numbers pass through, numeric strings
/// parse, everything else (null, booleans, objects, junk text) counts as zero.
/// Records never fail to parse over a bad cell.
pub fn coerce_num(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}
