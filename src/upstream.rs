// src/upstream.rs
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::config::Config;
use crate::models::status::UpstreamStatus;
use crate::utils::{ get_json, FetchError };

/// The third-party status API the proxy answers from.
pub trait StatusSource: Send + Sync + 'static {
    /// Identifies the upstream request; used as the cache key.
    fn request_key(&self) -> String;

    fn fetch_status(&self) -> impl Future<Output = Result<UpstreamStatus, FetchError>> + Send;
}

impl<S: StatusSource> StatusSource for Arc<S> {
    fn request_key(&self) -> String {
        self.as_ref().request_key()
    }

    fn fetch_status(&self) -> impl Future<Output = Result<UpstreamStatus, FetchError>> + Send {
        self.as_ref().fetch_status()
    }
}

/// Client for the mcapi.us status endpoint, pinned to one server.
#[derive(Clone)]
pub struct McApiClient {
    client: Client,
    url: String,
}

impl McApiClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.upstream_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: config.status_query_url(),
        })
    }
}

impl StatusSource for McApiClient {
    fn request_key(&self) -> String {
        self.url.clone()
    }

    async fn fetch_status(&self) -> Result<UpstreamStatus, FetchError> {
        debug!("Querying upstream status API: {}", self.url);
        let body: Value = get_json(&self.client, &self.url).await?;
        Ok(UpstreamStatus::from_json(&body))
    }
}
