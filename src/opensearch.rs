use crate::sink::SinkError;
use crate::store::{DocumentStore, StoreRecord};
use async_trait::async_trait;
use reqwest::Client;

/// OpenSearch document store writing one record per bulk request.
#[derive(Clone)]
pub struct OpenSearchStore {
    client: Client,
    /// Base URL of the cluster, e.g. "http://localhost:9200".
    base_url: String,
    index: String,
}

impl OpenSearchStore {
    pub fn new(base_url: impl Into<String>, index: impl Into<String>) -> Self {
        OpenSearchStore {
            client: Client::new(),
            base_url: base_url.into(),
            index: index.into(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn bulk_body(&self, record: &StoreRecord) -> Result<String, serde_json::Error> {
        let action = serde_json::json!({ "index": { "_index": self.index } });
        Ok(format!("{}\n{}\n", action, serde_json::to_string(record)?))
    }
}

#[async_trait]
impl DocumentStore for OpenSearchStore {
    async fn insert(&self, record: &StoreRecord) -> Result<(), SinkError> {
        let body = self.bulk_body(record)?;
        let url = format!("{}/_bulk", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("OpenSearch bulk insert failed with status {}: {}", status, text).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::level::Level;
    use crate::store::ExpirationLevels;

    #[test]
    fn bulk_body_is_two_ndjson_lines() {
        let store = OpenSearchStore::new("http://localhost:9200/", "logs");
        let record = StoreRecord::from_entry(&Entry::new(Level::Warn, "slow"), "api", &ExpirationLevels::empty());
        let body = store.bulk_body(&record).unwrap();

        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"index":{"_index":"logs"}}"#);
        assert!(lines[1].contains(r#""level":"warning""#));
    }
}
