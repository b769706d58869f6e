use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::history::{PredictionRecord, PredictionStorage, RecordId, Result};

/// In-memory history storage used for development and tests
#[derive(Default, Clone)]
pub struct MemoryPredictionStorage {
    inner: Arc<RwLock<HashMap<RecordId, PredictionRecord>>>,
}

impl MemoryPredictionStorage {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl PredictionStorage for MemoryPredictionStorage {
    async fn save(&self, record: &PredictionRecord) -> Result<()> {
        self.inner
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PredictionRecord>> {
        Ok(self.inner.read().values().cloned().collect())
    }
}
