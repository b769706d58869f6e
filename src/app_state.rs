use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};

use crate::history::SharedPredictionStorage;
use crate::history_memory_store::MemoryPredictionStorage;
use crate::history_rest_store::RestPredictionStorage;
use crate::model_cache::{ModelCache, RemoteModelSource};
use crate::predictor::{Classifier, Predictor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HistoryBackend {
    Memory,
    Rest,
}

impl fmt::Display for HistoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryBackend::Memory => f.write_str("memory"),
            HistoryBackend::Rest => f.write_str("rest"),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "oncodetect",
    about = "HTTP service that classifies uploaded images and records every verdict"
)]
pub struct AppConfig {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Remote path prefix holding model.json and its shard files.
    #[arg(long, default_value = "http://localhost:9000/model")]
    pub model_url: String,

    /// Local staging directory for downloaded model artifacts. Defaults to a
    /// directory under the system temp dir.
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Decision threshold: scores strictly above it classify as Cancer.
    #[arg(long, default_value_t = 0.58)]
    pub threshold: f32,

    #[arg(long, default_value_t = 1_000_000)]
    pub max_upload_bytes: usize,

    /// Single origin allowed by CORS; all origins when unset.
    #[arg(long)]
    pub cors_origin: Option<String>,

    #[arg(long, value_enum, default_value_t = HistoryBackend::Memory)]
    pub history_backend: HistoryBackend,

    /// Base URL of the document-database REST surface (rest backend only).
    #[arg(long, default_value = "http://localhost:9100")]
    pub history_url: String,

    /// Timeout for outbound HTTP calls, in seconds.
    #[arg(long, default_value_t = 600)]
    pub timeout_secs: u64,
}

/// Dependencies the request handlers work against, constructed once at
/// startup and cloned per worker.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub history: SharedPredictionStorage,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let source =
            RemoteModelSource::new(client.clone(), &config.model_url, config.scratch_dir.clone());
        let predictor = Predictor::new(ModelCache::new(source), config.threshold);
        let history: SharedPredictionStorage = match config.history_backend {
            HistoryBackend::Memory => Arc::new(MemoryPredictionStorage::new()),
            HistoryBackend::Rest => {
                Arc::new(RestPredictionStorage::new(client, &config.history_url))
            }
        };
        Ok(Self {
            classifier: Arc::new(predictor),
            history,
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}
