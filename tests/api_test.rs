use std::io::Cursor;
use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use async_trait::async_trait;

use oncodetect::app_state::AppState;
use oncodetect::error::PredictError;
use oncodetect::history::{
    HistoryStoreError, PredictionRecord, PredictionStorage, Result as StoreResult,
    SharedPredictionStorage,
};
use oncodetect::history_memory_store::MemoryPredictionStorage;
use oncodetect::io_struct::{FailBody, HistoriesBody, PredictBody};
use oncodetect::predictor::{Classifier, Label};
use oncodetect::server;

const MAX_UPLOAD_BYTES: usize = 1_000_000;

struct FixedClassifier(Label);

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _image_bytes: &[u8]) -> Result<Label, PredictError> {
        Ok(self.0)
    }
}

struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _image_bytes: &[u8]) -> Result<Label, PredictError> {
        Err(PredictError::Inference("stubbed failure".to_string()))
    }
}

struct FailingStorage;

#[async_trait]
impl PredictionStorage for FailingStorage {
    async fn save(&self, _record: &PredictionRecord) -> StoreResult<()> {
        Err(HistoryStoreError::Storage("stubbed outage".to_string()))
    }

    async fn list_all(&self) -> StoreResult<Vec<PredictionRecord>> {
        Err(HistoryStoreError::Storage("stubbed outage".to_string()))
    }
}

fn test_state(classifier: Arc<dyn Classifier>, history: SharedPredictionStorage) -> AppState {
    AppState {
        classifier,
        history,
        max_upload_bytes: MAX_UPLOAD_BYTES,
    }
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .service(server::predict)
                .service(server::histories),
        )
        .await
    };
}

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post().uri(uri).insert_header((
        "content-type",
        format!("multipart/form-data; boundary={BOUNDARY}"),
    ))
    .set_payload(body)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[actix_web::test]
async fn missing_file_is_rejected() {
    let app = init_app!(test_state(
        Arc::new(FixedClassifier(Label::Cancer)),
        Arc::new(MemoryPredictionStorage::new()),
    ));
    let body = multipart_body("avatar", "x.png", "image/png", &png_bytes(8, 8));
    let resp = test::call_service(&app, multipart_request("/predict", body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: FailBody = test::read_body_json(resp).await;
    assert_eq!(body.status, "fail");
    assert_eq!(body.message, "No file uploaded");
}

#[actix_web::test]
async fn non_image_upload_is_rejected() {
    let app = init_app!(test_state(
        Arc::new(FixedClassifier(Label::Cancer)),
        Arc::new(MemoryPredictionStorage::new()),
    ));
    let body = multipart_body("image", "notes.txt", "text/plain", b"hello");
    let resp = test::call_service(&app, multipart_request("/predict", body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: FailBody = test::read_body_json(resp).await;
    assert_eq!(body.status, "fail");
    assert_eq!(body.message, "Only image files are allowed");
}

#[actix_web::test]
async fn oversized_upload_is_rejected_with_413() {
    let app = init_app!(test_state(
        Arc::new(FixedClassifier(Label::Cancer)),
        Arc::new(MemoryPredictionStorage::new()),
    ));
    let oversized = vec![0u8; 1_500_000];
    let body = multipart_body("image", "big.png", "image/png", &oversized);
    let resp = test::call_service(&app, multipart_request("/predict", body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: FailBody = test::read_body_json(resp).await;
    assert_eq!(body.status, "fail");
    assert_eq!(
        body.message,
        format!("Payload content length greater than maximum allowed: {MAX_UPLOAD_BYTES}")
    );
}

#[actix_web::test]
async fn valid_upload_is_predicted_and_persisted() {
    let store = Arc::new(MemoryPredictionStorage::new());
    let app = init_app!(test_state(
        Arc::new(FixedClassifier(Label::Cancer)),
        store.clone(),
    ));
    let body = multipart_body("image", "lesion.png", "image/png", &png_bytes(128, 128));
    let resp = test::call_service(&app, multipart_request("/predict", body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: PredictBody = test::read_body_json(resp).await;
    assert_eq!(body.status, "success");
    assert!(!body.message.is_empty());
    assert_eq!(body.data.result, Label::Cancer);
    assert!(!body.data.suggestion.is_empty());
    assert!(uuid::Uuid::parse_str(&body.data.id.to_string()).is_ok());

    let stored = store.list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, body.data.id);
}

#[actix_web::test]
async fn prediction_failure_maps_to_400() {
    let store = Arc::new(MemoryPredictionStorage::new());
    let app = init_app!(test_state(Arc::new(FailingClassifier), store.clone()));
    let body = multipart_body("image", "lesion.png", "image/png", &png_bytes(32, 32));
    let resp = test::call_service(&app, multipart_request("/predict", body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: FailBody = test::read_body_json(resp).await;
    assert_eq!(body.status, "fail");
    // nothing persisted when prediction fails
    assert!(store.list_all().await.unwrap().is_empty());
}

#[actix_web::test]
async fn persistence_failure_folds_into_400() {
    let app = init_app!(test_state(
        Arc::new(FixedClassifier(Label::NonCancer)),
        Arc::new(FailingStorage),
    ));
    let body = multipart_body("image", "lesion.png", "image/png", &png_bytes(32, 32));
    let resp = test::call_service(&app, multipart_request("/predict", body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: FailBody = test::read_body_json(resp).await;
    assert_eq!(body.status, "fail");
}

#[actix_web::test]
async fn empty_histories_report_not_found() {
    let app = init_app!(test_state(
        Arc::new(FixedClassifier(Label::Cancer)),
        Arc::new(MemoryPredictionStorage::new()),
    ));
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/predict/histories").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: FailBody = test::read_body_json(resp).await;
    assert_eq!(body.status, "fail");
}

#[actix_web::test]
async fn histories_list_every_stored_record() {
    let store = Arc::new(MemoryPredictionStorage::new());
    let first = PredictionRecord::new(Label::Cancer);
    let second = PredictionRecord::new(Label::NonCancer);
    store.save(&first).await.unwrap();
    store.save(&second).await.unwrap();

    let app = init_app!(test_state(
        Arc::new(FixedClassifier(Label::Cancer)),
        store,
    ));
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/predict/histories").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: HistoriesBody = test::read_body_json(resp).await;
    assert_eq!(body.status, "success");
    assert_eq!(body.data.len(), 2);
    for entry in &body.data {
        assert_eq!(entry.id, entry.history.id);
    }
}

#[actix_web::test]
async fn store_outage_on_listing_maps_to_500() {
    let app = init_app!(test_state(
        Arc::new(FixedClassifier(Label::Cancer)),
        Arc::new(FailingStorage),
    ));
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/predict/histories").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: FailBody = test::read_body_json(resp).await;
    assert_eq!(body.status, "fail");
}
