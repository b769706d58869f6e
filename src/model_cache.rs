use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tract_onnx::prelude::*;

use crate::error::ModelLoadError;
use crate::preprocess::{CHANNELS, IMAGE_SIZE};

/// Optimized, runnable inference plan. Running it takes `&self`, so one
/// loaded plan serves all concurrent requests without locking.
pub type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Where a model comes from. Generic so tests can count and fail loads.
#[async_trait]
pub trait ModelSource: Send + Sync + 'static {
    type Model: Send + Sync + 'static;

    async fn load(&self) -> Result<Self::Model, ModelLoadError>;
}

/// Holds at most one loaded model per process.
///
/// OnceCell provides lock-free reads after initialization and serializes
/// concurrent first calls, so at most one load is in flight and every caller
/// receives the same completed model. A failed load caches nothing; the next
/// call retries the full load.
pub struct ModelCache<S: ModelSource> {
    source: S,
    cell: OnceCell<Arc<S::Model>>,
}

impl<S: ModelSource> ModelCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<Arc<S::Model>, ModelLoadError> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                Ok::<_, ModelLoadError>(Arc::new(self.source.load().await?))
            })
            .await?;
        Ok(Arc::clone(model))
    }
}

/// Descriptor file listing the binary partitions of the model graph.
#[derive(Debug, Deserialize)]
struct ModelManifest {
    shards: Vec<String>,
}

fn parse_manifest(bytes: &[u8]) -> Result<ModelManifest, ModelLoadError> {
    let manifest: ModelManifest =
        serde_json::from_slice(bytes).map_err(|e| ModelLoadError::Manifest(e.to_string()))?;
    if manifest.shards.is_empty() {
        return Err(ModelLoadError::Manifest(
            "descriptor lists no shard files".to_string(),
        ));
    }
    Ok(manifest)
}

/// Fetches `model.json` plus its shard files from a remote path prefix into
/// a local scratch directory, then builds the inference plan from the
/// reassembled graph bytes.
pub struct RemoteModelSource {
    client: reqwest::Client,
    base_url: String,
    scratch_dir: PathBuf,
}

impl RemoteModelSource {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        scratch_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            scratch_dir: scratch_dir
                .unwrap_or_else(|| std::env::temp_dir().join("oncodetect-model")),
        }
    }

    async fn fetch(&self, name: &str) -> Result<bytes::Bytes, ModelLoadError> {
        let url = format!("{}/{}", self.base_url, name);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl ModelSource for RemoteModelSource {
    type Model = OnnxPlan;

    async fn load(&self) -> Result<OnnxPlan, ModelLoadError> {
        let manifest = parse_manifest(&self.fetch("model.json").await?)?;
        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        let mut staged = Vec::with_capacity(manifest.shards.len());
        for shard in &manifest.shards {
            let file_name = Path::new(shard)
                .file_name()
                .ok_or_else(|| ModelLoadError::Manifest(format!("invalid shard name: {shard}")))?;
            let dest = self.scratch_dir.join(file_name);
            let bytes = self.fetch(shard).await?;
            tokio::fs::write(&dest, &bytes).await?;
            staged.push(dest);
        }

        let mut graph = Vec::new();
        for path in &staged {
            graph.extend(tokio::fs::read(path).await?);
        }
        log::info!(
            "staged model: {} shard(s), {} bytes",
            staged.len(),
            graph.len()
        );

        (|| -> TractResult<OnnxPlan> {
            tract_onnx::onnx()
                .model_for_read(&mut Cursor::new(graph))?
                .with_input_fact(
                    0,
                    InferenceFact::dt_shape(
                        f32::datum_type(),
                        tvec!(1, IMAGE_SIZE, IMAGE_SIZE, CHANNELS),
                    ),
                )?
                .into_optimized()?
                .into_runnable()
        })()
        .map_err(|e| ModelLoadError::Build(e.to_string()))
    }
}
