use actix_web::http::StatusCode;

/// Rejections produced while validating a multipart upload, before any
/// prediction work starts.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Only image files are allowed")]
    NotAnImage,

    #[error("Payload content length greater than maximum allowed: {0}")]
    TooLarge(usize),

    #[error("Invalid file upload")]
    Malformed(String),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Failures while fetching model artifacts or building the inference plan.
/// A failed load caches nothing; the next call retries from scratch.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to fetch model artifact: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("failed to stage model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model descriptor: {0}")]
    Manifest(String),

    #[error("failed to build inference plan: {0}")]
    Build(String),
}

/// Anything that can go wrong between receiving image bytes and producing a
/// label. Model-cache and preprocessing errors propagate through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("inference failed: {0}")]
    Inference(String),
}
