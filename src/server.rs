//!
//! planchecker HTTP server
//! -----------------------
//! Axum router for the plan checker. Plans are pasted or uploaded to
//! `POST /plan/` and either rendered straight away (`action=parse`) or saved
//! under a reference code (`action=save`); saved plans are viewed through
//! `GET /plan/{ref}`.
//!
//! Every failure is rendered at the request boundary: page flows answer with an
//! HTML error fragment, the save flow with a `status`/`msg` JSON object.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::checks;
use crate::config::{Config, ReportConfig};
use crate::error::PlanError;
use crate::parser::parse_explain;
use crate::report::{render_html, render_json, Report, ReportAssembler};
use crate::store::PlanStore;

pub mod pages;
pub mod submission;

use submission::{Action, PlanSubmission};

const LOAD_FAILED: &str = "Error loading plan from database:";
const PARSE_FAILED: &str = "Oops... we had a problem parsing the plan:";
const NO_ACTION: &str = "Oops... no action specified";

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PlanStore>,
    pub report: ReportConfig,
}

impl AppState {
    pub fn new(store: PlanStore, report: ReportConfig) -> Self {
        Self { store: Arc::new(store), report }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/plan/", post(submit_plan))
        .route("/plan/{plan_ref}", get(show_plan).fallback(method_not_supported))
        .route("/plan/{plan_ref}/json", get(show_plan_json))
        .with_state(state)
}

/// Serve on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await.context("HTTP server failed")
}

pub async fn run(config: &Config, store: PlanStore) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", config.port))?;
    info!("planchecker listening on http://{}", addr);
    serve(listener, AppState::new(store, config.report)).await
}

fn error_status(err: &PlanError) -> StatusCode {
    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn index() -> Html<String> {
    Html(pages::index_page(&checks::catalog()))
}

async fn method_not_supported() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, Json(json!({"status": "HTTP method not supported"})))
}

async fn show_plan(State(state): State<AppState>, Path(plan_ref): Path<String>) -> Response {
    let record = match state.store.fetch_by_ref(&plan_ref).await {
        Ok(r) => r,
        Err(e) => {
            warn!(plan_ref = %plan_ref, "load failed: {}", e);
            return (error_status(&e), Html(pages::error_fragment(LOAD_FAILED, &e.to_string()))).into_response();
        }
    };
    render_plan_page(&state, &record.text, &record.plan_ref)
}

async fn show_plan_json(State(state): State<AppState>, Path(plan_ref): Path<String>) -> Response {
    let result = match state.store.fetch_by_ref(&plan_ref).await {
        Ok(record) => parse_explain(&record.text).map(|explain| (record, explain)),
        Err(e) => Err(e),
    };
    match result {
        Ok((record, explain)) => {
            let report = ReportAssembler::new(&state.report).build(&explain);
            let mut body = render_json(&report);
            body["ref"] = json!(record.plan_ref);
            body["created_at"] = json!(record.created_at);
            Json(body).into_response()
        }
        Err(e) => (
            error_status(&e),
            Json(json!({"status": "failure", "code": e.code_str(), "msg": e.to_string()})),
        )
            .into_response(),
    }
}

async fn submit_plan(State(state): State<AppState>, submission: PlanSubmission) -> Response {
    match submission.action {
        Some(Action::Save) => save_plan(&state, &submission).await,
        Some(Action::Parse) => render_plan_page(&state, &submission.plantext, ""),
        None => (StatusCode::BAD_REQUEST, NO_ACTION).into_response(),
    }
}

async fn save_plan(state: &AppState, submission: &PlanSubmission) -> Response {
    let saved = match submission.decoded_plantext() {
        Ok(text) => state.store.insert(&text).await,
        Err(e) => Err(e),
    };
    let body = match saved {
        Ok(record) => {
            info!(plan_ref = %record.plan_ref, "saved plan");
            json!({"status": "success", "ref": record.plan_ref})
        }
        Err(e) => {
            warn!("save failed: {}", e);
            json!({"status": "failure", "msg": e.to_string()})
        }
    };
    Json(body).into_response()
}

fn render_plan_page(state: &AppState, text: &str, plan_ref: &str) -> Response {
    let report: Report = match parse_explain(text) {
        Ok(explain) => ReportAssembler::new(&state.report).build(&explain),
        Err(e) => {
            warn!("parse failed: {}", e);
            return (error_status(&e), Html(pages::error_fragment(PARSE_FAILED, &e.to_string()))).into_response();
        }
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    Html(pages::plan_page(&render_html(&report), &encoded, plan_ref)).into_response()
}
