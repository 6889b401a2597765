// src/utils.rs
use log::debug;
use reqwest::{ Client, StatusCode };
use serde::de::DeserializeOwned;
use std::fmt;

/// Failure of one outbound status request. Never leaves the proxy or the poller.
#[derive(Debug)]
pub enum FetchError {
    Transport(reqwest::Error),
    Status(StatusCode),
    Decode(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Request failed: {}", e),
            Self::Status(status) => write!(f, "Unexpected response status: {}", status),
            Self::Decode(msg) => write!(f, "Invalid response body: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e)
        }
    }
}

/// Single GET attempt, decoding the body as `T`. Non-success statuses are errors.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, FetchError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    debug!("GET {} -> {}", url, status);
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
}
