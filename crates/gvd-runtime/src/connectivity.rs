//! HTTP reachability check run before a job is spawned.

use std::time::Duration;

use async_trait::async_trait;
use gvd_core::ConnectivityProbe;
use gvd_core::settings::{DEFAULT_CONNECTIVITY_TIMEOUT_SECS, DEFAULT_CONNECTIVITY_URL};
use reqwest::Client;
use tracing::debug;

/// Considers the network reachable when `url` answers any HTTP response
/// within `timeout`.
#[derive(Debug, Clone)]
pub struct HttpConnectivityProbe {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpConnectivityProbe {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

impl Default for HttpConnectivityProbe {
    fn default() -> Self {
        Self::new(
            Client::new(),
            DEFAULT_CONNECTIVITY_URL,
            Duration::from_secs(DEFAULT_CONNECTIVITY_TIMEOUT_SECS),
        )
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn is_online(&self) -> bool {
        match self.client.get(&self.url).timeout(self.timeout).send().await {
            Ok(response) => {
                debug!(url = %self.url, status = %response.status(), "Connectivity check answered");
                true
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Connectivity check failed");
                false
            }
        }
    }
}
