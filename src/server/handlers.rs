//! Route handlers.
//!
//! Each report route resolves its request parameters, builds the report
//! against the tracker, and renders it as HTML or JSON. Report building
//! never fails; degraded sections travel inside the report.

use crate::report::{
    build_accepted_report, build_features_report, build_status_report, generate_features_page,
    generate_index_page, generate_json_report, generate_status_page, OutputFormat,
    ReportParams, ReportRequest,
};
use crate::server::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use chrono::Local;
use serde::Serialize;
use tracing::{error, info};

impl AppState {
    fn report_request(&self, projects: &str, api_key: &str, params: &ReportParams) -> ReportRequest {
        let today = Local::now().date_naive();
        ReportRequest::new(projects, api_key, params, today, &self.report)
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// `GET /{projects}/{api_key}`
pub async fn accepted_report(
    State(state): State<AppState>,
    Path((projects, api_key)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = ReportParams::from_pairs(pairs);
    let request = state.report_request(&projects, &api_key, &params);
    info!(
        "Accepted report for projects {:?}, last {} days",
        request.projects, request.days_ago
    );

    let report = build_accepted_report(state.tracker.as_ref(), &request).await;
    render(params.output_format(), &report, generate_index_page)
}

/// `GET /features/{projects}/{api_key}`
pub async fn features_report(
    State(state): State<AppState>,
    Path((projects, api_key)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = ReportParams::from_pairs(pairs);
    let request = state.report_request(&projects, &api_key, &params);
    info!("Features report for projects {:?}", request.projects);

    let report = build_features_report(state.tracker.as_ref(), &request).await;
    render(params.output_format(), &report, generate_features_page)
}

/// `GET /status/{projects}/{api_key}`
pub async fn status_report(
    State(state): State<AppState>,
    Path((projects, api_key)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = ReportParams::from_pairs(pairs);
    let request = state.report_request(&projects, &api_key, &params);
    info!(
        "Status report for projects {:?} (done={}, backlog={}, icebox={})",
        request.projects, request.include_done, request.include_backlog, request.include_icebox
    );

    let report = build_status_report(state.tracker.as_ref(), &request).await;
    render(params.output_format(), &report, generate_status_page)
}

fn render<R: Serialize>(format: OutputFormat, report: &R, page: fn(&R) -> String) -> Response {
    match format {
        OutputFormat::Html => Html(page(report)).into_response(),
        OutputFormat::Json => match generate_json_report(report) {
            Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to serialize report").into_response()
            }
        },
    }
}
