mod logs;
mod state;

pub use logs::{add_log, add_log_entry, snapshot, LogEntry, SharedLogs};
pub use state::AppState;

use actix_cors::Cors;
use actix_web::{
    delete, dev::Server, get, http::StatusCode, post, web, App, HttpResponse, HttpResponseBuilder,
    HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::domain::entity::EntityKind;
use crate::domain::error::AppError;
use crate::domain::import::ImportReport;
use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::spreadsheet::SpreadsheetSource;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: SharedLogs,
}

#[derive(Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub summary: String,
    #[serde(flatten)]
    pub report: ImportReport,
}

fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::ValidationError(_) | AppError::UnreadableFile(_) | AppError::EmptyFile => {
            StatusCode::BAD_REQUEST
        }
        AppError::MissingColumns(_) | AppError::NoValidData { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::ImportInProgress(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::DatabaseError(_) | AppError::Upsert(_) => StatusCode::BAD_GATEWAY,
        AppError::Internal(_) | AppError::IoError(_) | AppError::ConfigError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: &AppError) -> HttpResponse {
    HttpResponseBuilder::new(status_for(error)).json(json!({ "error": error.to_string() }))
}

/// Resolve the `{entity}` path segment or build the 404 response.
fn entity_kind(segment: &str) -> Result<EntityKind, HttpResponse> {
    segment.parse::<EntityKind>().map_err(|e| error_response(&e))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[get("/statistics")]
async fn statistics(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.statistics_use_case.summary().await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => error_response(&e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(snapshot(&data.logs))
}

#[get("/{entity}")]
async fn list_records(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let kind = match entity_kind(&path) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match data.app_state.directory_use_case.list(kind).await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => error_response(&e),
    }
}

#[post("/{entity}")]
async fn save_record(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> impl Responder {
    let kind = match entity_kind(&path) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match data.app_state.directory_use_case.save(kind, &body).await {
        Ok(record) => {
            add_log(
                &data.logs,
                "INFO",
                "Directory",
                &format!("Saved {} record {}", kind, record.id.unwrap_or_default()),
            );
            HttpResponse::Ok().json(record)
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Directory",
                &format!("Saving {} record failed: {}", kind, e),
            );
            error_response(&e)
        }
    }
}

#[get("/{entity}/export")]
async fn export_records(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let kind = match entity_kind(&path) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match data.app_state.export_use_case.export(kind).await {
        Ok(file) => {
            add_log(
                &data.logs,
                "INFO",
                "Export",
                &format!("Exported {} to {}", kind, file.file_name),
            );
            HttpResponse::Ok()
                .content_type(XLSX_CONTENT_TYPE)
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", file.file_name),
                ))
                .body(file.bytes)
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Export",
                &format!("Export of {} failed: {}", kind, e),
            );
            error_response(&e)
        }
    }
}

#[post("/{entity}/import")]
async fn import_records(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<ImportQuery>,
    body: web::Bytes,
) -> impl Responder {
    let kind = match entity_kind(&path) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let source = SpreadsheetSource::from_bytes(body.to_vec(), query.into_inner().filename);
    match data
        .app_state
        .import_pipeline
        .run(kind, source, &data.logs)
        .await
    {
        Ok(report) => HttpResponse::Ok().json(ImportResponse {
            summary: report.summary(),
            report,
        }),
        Err(e) => error_response(&e),
    }
}

#[get("/{entity}/{id:\\d+}")]
async fn get_record(data: web::Data<HttpState>, path: web::Path<(String, i64)>) -> impl Responder {
    let (segment, id) = path.into_inner();
    let kind = match entity_kind(&segment) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match data.app_state.directory_use_case.get(kind, id).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => error_response(&e),
    }
}

#[delete("/{entity}/{id:\\d+}")]
async fn delete_record(data: web::Data<HttpState>, path: web::Path<(String, i64)>) -> impl Responder {
    let (segment, id) = path.into_inner();
    let kind = match entity_kind(&segment) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match data.app_state.directory_use_case.delete(kind, id).await {
        Ok(()) => {
            add_log(
                &data.logs,
                "INFO",
                "Directory",
                &format!("Deleted {} record {}", kind, id),
            );
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response(&e),
    }
}

/// Route table. Fixed segments are registered before `{entity}` patterns.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::scope("/api")
            .service(statistics)
            .service(get_logs)
            .service(export_records)
            .service(import_records)
            .service(get_record)
            .service(delete_record)
            .service(list_records)
            .service(save_record),
    );
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: SharedLogs,
    server: &ServerConfig,
) -> std::io::Result<Server> {
    let payload_limit = app_state.max_upload_bytes;
    let state = web::Data::new(HttpState { app_state, logs });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Dashboard runs on another origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(payload_limit))
            .configure(configure)
    })
    .bind((server.host.as_str(), server.port))?
    .run();

    Ok(server)
}
