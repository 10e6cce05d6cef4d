//! API routes for the ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use provlog_core::{Event, EventDraft};
use provlog_persist::{EventFilter, Page};

use crate::error::{ApiError, ApiResult};
use crate::export;
use crate::state::AppState;
use crate::validate::{normalize_digest, validate_agent_id, validate_label, validate_opt_label};

/// Event creation request
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub agent_id: String,
    pub action_type: String,
    pub tool_name: Option<String>,
    pub environment: Option<String>,
    pub model_version: Option<String>,
    pub prompt_version: Option<String>,
    pub input_hash: String,
    pub output_hash: String,
}

impl CreateEventRequest {
    fn into_draft(self) -> Result<EventDraft, ApiError> {
        validate_agent_id(&self.agent_id).map_err(ApiError::Validation)?;
        validate_label("action_type", &self.action_type, 100).map_err(ApiError::Validation)?;
        validate_opt_label("tool_name", &self.tool_name, 255).map_err(ApiError::Validation)?;
        validate_opt_label("environment", &self.environment, 100).map_err(ApiError::Validation)?;
        validate_opt_label("model_version", &self.model_version, 100)
            .map_err(ApiError::Validation)?;
        validate_opt_label("prompt_version", &self.prompt_version, 100)
            .map_err(ApiError::Validation)?;
        let input_hash =
            normalize_digest("input_hash", &self.input_hash).map_err(ApiError::Validation)?;
        let output_hash =
            normalize_digest("output_hash", &self.output_hash).map_err(ApiError::Validation)?;

        Ok(EventDraft {
            agent_id: self.agent_id,
            action_type: self.action_type,
            tool_name: self.tool_name,
            environment: self.environment,
            model_version: self.model_version,
            prompt_version: self.prompt_version,
            input_hash,
            output_hash,
        })
    }
}

/// Create a new event in the ledger.
///
/// Events are append-only and hash-chained per `agent_id`. The timestamp is
/// server-generated UTC, never client-provided.
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let draft = request.into_draft()?;
    let event = state.appender().append(draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    50
}

/// List query filters and pagination
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub agent_id: Option<String>,
    pub action_type: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl ListQuery {
    fn filter(&self) -> EventFilter {
        EventFilter {
            agent_id: self.agent_id.clone(),
            action_type: self.action_type.clone(),
            start_micros: self.start_time.map(|t| t.timestamp_micros()),
            end_micros: self.end_time.map(|t| t.timestamp_micros()),
        }
    }
}

/// Event list response
#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<Event>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// List events with optional filters, newest first.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<EventListResponse>> {
    if query.page < 1 {
        return Err(ApiError::Validation("page must be >= 1".to_string()));
    }
    if query.page_size < 1 || query.page_size > 1000 {
        return Err(ApiError::Validation(
            "page_size must be between 1 and 1000".to_string(),
        ));
    }

    let (events, total) = state
        .store()
        .list(
            &query.filter(),
            Page {
                page: query.page,
                page_size: query.page_size,
            },
        )
        .await?;

    Ok(Json(EventListResponse {
        events,
        total,
        page: query.page,
        page_size: query.page_size,
    }))
}

/// Get a single event by ID.
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Event>> {
    let parsed = Uuid::parse_str(&event_id)
        .map_err(|_| ApiError::NotFound(format!("Event {} not found", event_id)))?;

    let event = state
        .store()
        .get(parsed)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event {} not found", event_id)))?;

    Ok(Json(event))
}

/// Chain verification query
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub agent_id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Chain verification response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub agent_id: String,
    pub is_valid: bool,
    pub events_checked: u64,
    pub first_invalid_event_id: Option<Uuid>,
    pub error_message: Option<String>,
}

/// Verify the integrity of an agent's event chain.
///
/// A broken chain is data, not an error: this always answers 200 with a
/// structured verdict.
pub async fn verify_chain(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<Json<VerifyResponse>> {
    let verdict = state
        .verifier()
        .verify_chain(&query.agent_id, query.start_time, query.end_time)
        .await?;

    Ok(Json(VerifyResponse {
        agent_id: query.agent_id,
        is_valid: verdict.is_valid,
        events_checked: verdict.events_checked,
        first_invalid_event_id: verdict.first_invalid_event_id,
        error_message: verdict.error_message,
    }))
}

/// Archive verification query
#[derive(Debug, Deserialize)]
pub struct ArchiveVerifyQuery {
    pub agent_id: String,
    /// YYYY-MM-DD
    pub date: String,
}

/// Archive reconciliation response
#[derive(Debug, Serialize)]
pub struct ArchiveVerifyResponse {
    pub agent_id: String,
    pub date: String,
    pub is_valid: bool,
    pub db_events: u64,
    pub archive_events: u64,
    pub mismatches: u64,
    pub missing_in_archive: u64,
    pub error_message: Option<String>,
}

/// Cross-check primary-store rows against the archive for one agent-day.
pub async fn verify_archive(
    State(state): State<AppState>,
    Query(query): Query<ArchiveVerifyQuery>,
) -> ApiResult<Json<ArchiveVerifyResponse>> {
    let date = match NaiveDate::parse_from_str(&query.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return Ok(Json(ArchiveVerifyResponse {
                agent_id: query.agent_id,
                date: query.date,
                is_valid: false,
                db_events: 0,
                archive_events: 0,
                mismatches: 0,
                missing_in_archive: 0,
                error_message: Some("Invalid date format. Use YYYY-MM-DD.".to_string()),
            }))
        }
    };

    let report = state.reconciler().reconcile(&query.agent_id, date).await?;

    Ok(Json(ArchiveVerifyResponse {
        agent_id: report.agent_id,
        date: report.date,
        is_valid: report.is_valid,
        db_events: report.db_events,
        archive_events: report.archive_events,
        mismatches: report.mismatches,
        missing_in_archive: report.missing_in_archive,
        error_message: report.error_message,
    }))
}

/// Export format
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    #[default]
    Json,
}

/// Export query filters
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    pub agent_id: Option<String>,
    pub action_type: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Export events as a downloadable CSV or JSON file, oldest first.
pub async fn export_events(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let filter = EventFilter {
        agent_id: query.agent_id.clone(),
        action_type: query.action_type.clone(),
        start_micros: query.start_time.map(|t| t.timestamp_micros()),
        end_micros: query.end_time.map(|t| t.timestamp_micros()),
    };
    let events = state.store().export_range(&filter).await?;

    let now = Utc::now();
    let (content_type, filename, body) = match query.format {
        ExportFormat::Csv => (
            "text/csv",
            export::export_filename(now, "csv"),
            export::to_csv(&events)?,
        ),
        ExportFormat::Json => (
            "application/json",
            export::export_filename(now, "json"),
            export::to_json(&events)?,
        ),
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub archive: String,
}

/// Health check: verifies database and archive availability.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.store().is_healthy().await {
        "healthy".to_string()
    } else {
        "unhealthy: database check failed".to_string()
    };

    let archive = if state.archive().check_health().await {
        "healthy".to_string()
    } else {
        "unhealthy: cannot write to archive".to_string()
    };

    let status = if database == "healthy" && archive == "healthy" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        database,
        archive,
    })
}

/// Root endpoint with API information.
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Provlog",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "events": "/events",
            "verify": "/verify",
            "export": "/export",
            "health": "/health"
        }
    }))
}

/// Build the API router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/events", post(create_event).get(list_events))
        .route("/events/{id}", get(get_event))
        .route("/verify", get(verify_chain))
        .route("/verify/archive", get(verify_archive))
        .route("/export", get(export_events))
        .with_state(state)
}
