use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::predictor::Label;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted outcome of one prediction request. Created exactly once per
/// successful prediction; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub id: RecordId,
    pub result: Label,
    pub suggestion: String,
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(result: Label) -> Self {
        Self {
            id: RecordId::new(),
            result,
            suggestion: result.suggestion().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Result alias for history storage operations
pub type Result<T> = std::result::Result<T, HistoryStoreError>;

/// Error type for history storage operations
#[derive(Debug, thiserror::Error)]
pub enum HistoryStoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for HistoryStoreError {
    fn from(value: reqwest::Error) -> Self {
        HistoryStoreError::Storage(value.to_string())
    }
}

/// Trait describing the append-only interface for prediction history backends
#[async_trait]
pub trait PredictionStorage: Send + Sync + 'static {
    /// Durable write, keyed by `record.id`.
    async fn save(&self, record: &PredictionRecord) -> Result<()>;

    /// Full scan; no ordering guarantee beyond returning every stored record.
    async fn list_all(&self) -> Result<Vec<PredictionRecord>>;
}

/// Shared pointer alias for prediction history storage
pub type SharedPredictionStorage = Arc<dyn PredictionStorage>;
