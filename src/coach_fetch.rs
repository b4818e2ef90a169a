use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http_client::{http_client, server_url};
use crate::state::{MatchReport, PlayerMatchRef};

/// A successful `/api/analyze` call either carries a report or an `error`
/// string the server wants shown verbatim.
#[derive(Debug, Clone)]
pub enum ReportOutcome {
    Report(MatchReport),
    ServerError(String),
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest {
    match_index: i64,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    question: String,
}

#[derive(Debug, Deserialize)]
struct MatchesEnvelope {
    #[serde(default)]
    matches: Vec<PlayerMatchRef>,
}

pub fn fetch_players() -> Result<Vec<String>> {
    let client = http_client()?;
    let url = server_url("/api/players");
    let resp = client.get(&url).send().context("players request failed")?;
    if !resp.status().is_success() {
        bail!("players request returned {}", resp.status());
    }
    let body = resp.text().context("players body was not readable")?;
    parse_players_json(&body)
}

pub fn fetch_matches(player: &str) -> Result<Vec<PlayerMatchRef>> {
    let client = http_client()?;
    let url = server_url("/api/matches");
    let resp = client
        .get(&url)
        .query(&[("player", player)])
        .send()
        .context("matches request failed")?;
    if !resp.status().is_success() {
        bail!("matches request returned {}", resp.status());
    }
    let body = resp.text().context("matches body was not readable")?;
    parse_matches_json(&body)
}

pub fn request_analysis(match_index: i64) -> Result<ReportOutcome> {
    let client = http_client()?;
    let url = server_url("/api/analyze");
    let resp = client
        .post(&url)
        .json(&AnalyzeRequest { match_index })
        .send()
        .context("analyze request failed")?;
    let status = resp.status();
    let body = resp.text().context("analyze body was not readable")?;
    match parse_report_json(&body) {
        Ok(outcome) => Ok(outcome),
        // The server reports analysis problems through the error field; only
        // bail on bodies that carry neither a report nor one of those.
        Err(err) if !status.is_success() => Err(err.context(format!("analyze returned {status}"))),
        Err(err) => Err(err),
    }
}

pub fn send_chat(question: &str) -> Result<Option<String>> {
    let client = http_client()?;
    let url = server_url("/api/chat");
    let resp = client
        .post(&url)
        .json(&ChatRequest {
            question: question.to_string(),
        })
        .send()
        .context("chat request failed")?;
    if !resp.status().is_success() {
        bail!("chat request returned {}", resp.status());
    }
    let body = resp.text().context("chat body was not readable")?;
    parse_chat_json(&body)
}

pub fn parse_players_json(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let names: Vec<String> =
        serde_json::from_str(trimmed).context("players json was not an array of names")?;
    Ok(names)
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<PlayerMatchRef>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let envelope: MatchesEnvelope =
        serde_json::from_str(trimmed).context("invalid matches json")?;
    Ok(envelope.matches)
}

pub fn parse_report_json(raw: &str) -> Result<ReportOutcome> {
    let trimmed = raw.trim();
    let root: Value = serde_json::from_str(trimmed).context("invalid analyze json")?;
    if let Some(error) = root.get("error").and_then(Value::as_str)
        && !error.is_empty()
    {
        return Ok(ReportOutcome::ServerError(error.to_string()));
    }
    let report: MatchReport =
        serde_json::from_value(root).context("analyze json did not match the report shape")?;
    Ok(ReportOutcome::Report(report))
}

/// The chat endpoint answers `{"answer": ...}`. A missing or empty answer is
/// `None`; the caller substitutes the fallback line.
pub fn parse_chat_json(raw: &str) -> Result<Option<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid chat json")?;
    Ok(root
        .get("answer")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}
