use serde::{Deserialize, Serialize};

use crate::history::{PredictionRecord, RecordId};

/// Envelope returned for every failure, regardless of status code. Internal
/// error detail stays in the server log.
#[derive(Debug, Serialize, Deserialize)]
pub struct FailBody {
    pub status: String,
    pub message: String,
}

impl FailBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "fail".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictBody {
    pub status: String,
    pub message: String,
    pub data: PredictionRecord,
}

impl PredictBody {
    pub fn new(message: impl Into<String>, data: PredictionRecord) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }
}

/// One history listing entry; the outer `id` mirrors the record's own id.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: RecordId,
    pub history: PredictionRecord,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoriesBody {
    pub status: String,
    pub data: Vec<HistoryEntry>,
}

impl HistoriesBody {
    pub fn new(records: Vec<PredictionRecord>) -> Self {
        let data = records
            .into_iter()
            .map(|record| HistoryEntry {
                id: record.id.clone(),
                history: record,
            })
            .collect();
        Self {
            status: "success".to_string(),
            data,
        }
    }
}
