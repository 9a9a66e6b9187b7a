use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct LoginEvent {
    user_id: String,
    name: String,
    logged_in_at: DateTime<Utc>,
}

/// Fire-and-forget shipper for login-history events. The login flow never
/// waits on it; outcomes are only observed for diagnostics.
#[derive(Clone)]
pub struct RemoteLogClient {
    http_client: Client,
    url: Option<String>,
}

impl RemoteLogClient {
    pub fn new(url: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            url,
        }
    }

    /// Dispatches the event on a detached task. There is no cancellation; the
    /// request may finish after the caller has moved on.
    pub fn spawn_login_event(&self, user_id: &str, name: &str) {
        let Some(url) = self.url.clone() else {
            return;
        };

        let client = self.http_client.clone();
        let event = LoginEvent {
            user_id: user_id.to_string(),
            name: name.to_string(),
            logged_in_at: Utc::now(),
        };

        tokio::spawn(async move {
            let result = client
                .post(&url)
                .json(&event)
                .timeout(Duration::from_secs(5))
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!("Remote login log stored for user {}", event.user_id);
                }
                Ok(response) => {
                    tracing::warn!(
                        "Remote login log rejected with status {}",
                        response.status()
                    );
                }
                Err(e) => {
                    tracing::warn!("Remote login log failed: {}", e);
                }
            }
        });
    }
}
