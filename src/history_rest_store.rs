use async_trait::async_trait;

use crate::history::{PredictionRecord, PredictionStorage, Result};

/// History storage backed by a document database reached over its REST
/// surface. Records live in a single `predictions` collection, one document
/// per record, keyed by the record id.
pub struct RestPredictionStorage {
    client: reqwest::Client,
    base_url: String,
}

impl RestPredictionStorage {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/predictions", self.base_url)
    }
}

#[async_trait]
impl PredictionStorage for RestPredictionStorage {
    async fn save(&self, record: &PredictionRecord) -> Result<()> {
        let url = format!("{}/{}", self.collection_url(), record.id);
        self.client
            .put(&url)
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PredictionRecord>> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Vec<PredictionRecord>>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized() {
        let client = reqwest::Client::new();
        let store = RestPredictionStorage::new(client, "http://db.internal/v1/");
        assert_eq!(store.collection_url(), "http://db.internal/v1/predictions");
    }
}
