use crate::notifier::Notifier;
use crate::sink::SinkError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

const GRAPH_URL: &str = "https://graph.facebook.com/v15.0";

/// Workplace bot client that posts to a group chat thread via the Graph API.
#[derive(Clone)]
pub struct WorkplaceNotifier {
    client: Client,
    token: String,
    base_url: String,
}

impl WorkplaceNotifier {
    pub fn new(token: impl Into<String>) -> Self {
        WorkplaceNotifier {
            client: Client::new(),
            token: token.into(),
            base_url: GRAPH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/me/messages?access_token={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.token)
        )
    }
}

#[async_trait]
impl Notifier for WorkplaceNotifier {
    async fn notify(&self, destination: &str, message: &str) -> Result<(), SinkError> {
        let body = json!({
            "recipient": { "thread_key": destination },
            "message": { "text": message },
        });

        let resp = self.client.post(self.endpoint()).json(&body).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("Workplace notify failed with status {}: {}", status, text).into())
        }
    }
}
