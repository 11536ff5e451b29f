use crate::notifier::Notifier;
use crate::sink::SinkError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Slack bot client posting entries as message attachments.
#[derive(Clone)]
pub struct SlackNotifier {
    client: Client,
    token: String,
    url: String,
}

impl SlackNotifier {
    pub fn new(token: impl Into<String>) -> Self {
        SlackNotifier {
            client: Client::new(),
            token: token.into(),
            url: POST_MESSAGE_URL.to_string(),
        }
    }

    /// Point the client at a different API endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    attachments: [Attachment<'a>; 1],
}

#[derive(Serialize)]
struct Attachment<'a> {
    pretext: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, destination: &str, message: &str) -> Result<(), SinkError> {
        let body = PostMessage {
            channel: destination,
            attachments: [Attachment {
                pretext: "Logger",
                text: message,
            }],
        };

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(format!("Slack post failed with status {}: {}", status, text).into());
        }

        let reply: PostMessageResponse = resp.json().await?;
        if reply.ok {
            Ok(())
        } else {
            let reason = reply.error.unwrap_or_else(|| "unknown error".to_string());
            Err(format!("Slack rejected message: {}", reason).into())
        }
    }
}
