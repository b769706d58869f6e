use std::io::Write;

use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, HttpServer, get, http::header, post, web};
use futures_util::TryStreamExt;

use crate::app_state::{AppConfig, AppState};
use crate::error::UploadError;
use crate::history::PredictionRecord;
use crate::io_struct::{FailBody, HistoriesBody, PredictBody};

const PREDICTION_FAILED_MSG: &str = "An error occurred while making the prediction";
const HISTORIES_FAILED_MSG: &str = "An error occurred while fetching prediction histories";

/// Reads the `image` multipart field, enforcing the MIME and size checks
/// while streaming, before any prediction work starts.
async fn read_image_field(mut payload: Multipart, max_bytes: usize) -> Result<Vec<u8>, UploadError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| UploadError::Malformed(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let is_image = field
            .content_type()
            .is_some_and(|mime| mime.essence_str().starts_with("image/"));
        if !is_image {
            return Err(UploadError::NotAnImage);
        }
        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| UploadError::Malformed(e.to_string()))?
        {
            if data.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge(max_bytes));
            }
            data.extend_from_slice(&chunk);
        }
        if data.is_empty() {
            return Err(UploadError::MissingFile);
        }
        return Ok(data);
    }
    Err(UploadError::MissingFile)
}

#[post("/predict")]
pub async fn predict(payload: Multipart, app_state: web::Data<AppState>) -> HttpResponse {
    let image = match read_image_field(payload, app_state.max_upload_bytes).await {
        Ok(image) => image,
        Err(err) => {
            log::warn!("rejected upload: {err:?}");
            return HttpResponse::build(err.status_code()).json(FailBody::new(err.to_string()));
        }
    };

    let label = match app_state.classifier.classify(&image).await {
        Ok(label) => label,
        Err(err) => {
            log::error!("prediction failed: {err}");
            return HttpResponse::BadRequest().json(FailBody::new(PREDICTION_FAILED_MSG));
        }
    };

    let record = PredictionRecord::new(label);
    if let Err(err) = app_state.history.save(&record).await {
        log::error!("failed to persist prediction {}: {err}", record.id);
        return HttpResponse::BadRequest().json(FailBody::new(PREDICTION_FAILED_MSG));
    }

    log::info!("prediction {} stored: {label}", record.id);
    HttpResponse::Created().json(PredictBody::new("Model is predicted successfully", record))
}

#[get("/predict/histories")]
pub async fn histories(app_state: web::Data<AppState>) -> HttpResponse {
    match app_state.history.list_all().await {
        Ok(records) if records.is_empty() => {
            HttpResponse::NotFound().json(FailBody::new("No predictions found"))
        }
        Ok(records) => HttpResponse::Ok().json(HistoriesBody::new(records)),
        Err(err) => {
            log::error!("failed to fetch prediction histories: {err}");
            HttpResponse::InternalServerError().json(FailBody::new(HISTORIES_FAILED_MSG))
        }
    }
}

fn cors_layer(allowed_origin: Option<&str>) -> Cors {
    match allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600),
        None => Cors::permissive(),
    }
}

pub async fn startup(config: AppConfig, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    println!("Starting server at {}:{}", config.host, config.port);

    // default level is info
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info)
        .init();

    let bind_addr = (config.host.clone(), config.port);
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(cors_layer(config.cors_origin.as_deref()))
            .app_data(app_state.clone())
            .service(predict)
            .service(histories)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    std::io::Result::Ok(())
}
