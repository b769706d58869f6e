use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tract_onnx::prelude::*;

use crate::error::PredictError;
use crate::model_cache::{ModelCache, RemoteModelSource};
use crate::preprocess::preprocess;

/// Binary classification verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Cancer,
    #[serde(rename = "Non-cancer")]
    NonCancer,
}

impl Label {
    /// `Cancer` iff the raw model score is strictly greater than the
    /// threshold.
    pub fn from_score(score: f32, threshold: f32) -> Self {
        if score > threshold {
            Label::Cancer
        } else {
            Label::NonCancer
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            Label::Cancer => "Please consult a doctor immediately!",
            Label::NonCancer => "No signs of cancer were detected.",
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Cancer => f.write_str("Cancer"),
            Label::NonCancer => f.write_str("Non-cancer"),
        }
    }
}

/// The seam the HTTP layer depends on, so tests can substitute a stub.
#[async_trait]
pub trait Classifier: Send + Sync + 'static {
    async fn classify(&self, image_bytes: &[u8]) -> Result<Label, PredictError>;
}

/// Turns an image buffer into a label: model via cache, preprocess, forward
/// pass, fixed decision threshold. Errors propagate unchanged.
pub struct Predictor {
    cache: ModelCache<RemoteModelSource>,
    threshold: f32,
}

impl Predictor {
    pub fn new(cache: ModelCache<RemoteModelSource>, threshold: f32) -> Self {
        Self { cache, threshold }
    }
}

#[async_trait]
impl Classifier for Predictor {
    async fn classify(&self, image_bytes: &[u8]) -> Result<Label, PredictError> {
        let model = self.cache.get().await?;
        let input = preprocess(image_bytes)?;
        let outputs = model
            .run(tvec!(input.into_tensor().into()))
            .map_err(|e| PredictError::Inference(e.to_string()))?;
        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| PredictError::Inference(e.to_string()))?;
        let score = view
            .iter()
            .copied()
            .next()
            .ok_or_else(|| PredictError::Inference("model produced an empty output".to_string()))?;
        log::debug!("raw model score: {score}");
        Ok(Label::from_score(score, self.threshold))
    }
}
