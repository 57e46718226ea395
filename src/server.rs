//! HTTP surface: a thin JSON façade over [`Executor`].
//!
//! All request vetting (required fields, language dispatch, run count) lives
//! here so the orchestrator only ever sees well-formed requests.

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{dev::Server, middleware, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use std::net::ToSocketAddrs;
use std::sync::Arc;
use tracing::info;

use crate::executor::Executor;
use crate::types::{ExecutionRequest, Language, DEFAULT_RUNS};

/// Wire shape of an execution request. `language` stays a plain string so an
/// unknown name produces our 400 with the supported list rather than a
/// deserialization error.
#[derive(Debug, Deserialize)]
pub struct RunPayload {
    #[serde(default)]
    solution: String,
    #[serde(default)]
    tests: String,
    #[serde(default)]
    language: String,
    runs: Option<u32>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

fn vet_payload(payload: RunPayload) -> Result<ExecutionRequest, HttpResponse> {
    if payload.solution.is_empty() || payload.tests.is_empty() || payload.language.is_empty() {
        return Err(HttpResponse::BadRequest().json(ErrorResponse::new(
            "Missing required fields: solution, tests, language",
        )));
    }

    let language: Language = match payload.language.parse() {
        Ok(language) => language,
        Err(e) => return Err(HttpResponse::BadRequest().json(ErrorResponse::new(e.to_string()))),
    };

    let runs = payload.runs.unwrap_or(DEFAULT_RUNS);
    if runs == 0 {
        return Err(HttpResponse::BadRequest()
            .json(ErrorResponse::new("runs must be greater than zero")));
    }

    Ok(ExecutionRequest {
        solution: payload.solution,
        tests: payload.tests,
        language,
        runs,
    })
}

async fn run_handler(
    executor: web::Data<Arc<Executor>>,
    payload: web::Json<RunPayload>,
) -> impl Responder {
    let request = match vet_payload(payload.into_inner()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = executor.execute_and_measure(&request).await;
    HttpResponse::Ok().json(result)
}

async fn validate_handler(
    executor: web::Data<Arc<Executor>>,
    payload: web::Json<RunPayload>,
) -> impl Responder {
    let request = match vet_payload(payload.into_inner()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match executor.validate_only(&request).await {
        Ok(validation) => HttpResponse::Ok().json(validation),
        Err(e) => HttpResponse::InternalServerError().json(ErrorResponse::new(format!("{e:#}"))),
    }
}

async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Malformed JSON gets the same `{"error": ...}` envelope as everything else.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response =
        HttpResponse::BadRequest().json(ErrorResponse::new(format!("Invalid request body: {err}")));
    InternalError::from_response(err, response).into()
}

/// Route table, shared between the real server and the in-process test app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/execute")
            .route("/run", web::post().to(run_handler))
            .route("/validate", web::post().to(validate_handler)),
    )
    .route("/health", web::get().to(health_handler));
}

/// Bind and return the server future; the caller awaits it.
pub fn build_server(executor: Arc<Executor>, addr: impl ToSocketAddrs) -> std::io::Result<Server> {
    let executor = web::Data::new(executor);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(executor.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(addr)?
    .run();

    info!("server listening");
    Ok(server)
}
