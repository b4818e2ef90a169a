use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Local development address of the EVA analytics server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client for all EVA endpoints.
pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Base URL of the analytics server, `EVA_SERVER_URL` or the local default.
pub fn server_base() -> String {
    let base = std::env::var("EVA_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    base.trim_end_matches('/').to_string()
}

/// Joins `path` (leading slash expected) onto the server base URL.
pub fn server_url(path: &str) -> String {
    format!("{}{}", server_base(), path)
}
