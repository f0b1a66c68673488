use crate::auth::require_admin;
use crate::config::Config;
use crate::db_storage::{LeadMetricsStorage, LeadStorage};
use crate::errors::AppError;
use crate::models::*;
use crate::scoring::{rank_leads, score_lead, LeadRecord, LeadScore};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

const DEFAULT_PAGE_LIMIT: i64 = 100;
const MAX_PAGE_LIMIT: i64 = 500;

/// Upper bounds for text columns; longer values are rejected before they reach the database.
const SHORT_TEXT_MAX: usize = 255;
const ROLE_MAX: usize = 100;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
}

impl AppState {
    fn leads(&self) -> LeadStorage {
        LeadStorage::new(self.db.clone())
    }

    fn metrics(&self) -> LeadMetricsStorage {
        LeadMetricsStorage::new(self.db.clone())
    }
}

impl PageParams {
    /// Validated `(skip, limit)`: `skip >= 0`, `1 <= limit <= 500`.
    pub fn resolve(self) -> Result<(i64, i64), AppError> {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        if skip < 0 {
            return Err(AppError::BadRequest(
                "skip must be greater than or equal to 0".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok((skip, limit))
    }
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}

fn validate_new_lead(lead: &CreateLeadRequest) -> Result<(), AppError> {
    require_text("name", &lead.name)?;
    require_text("surname", &lead.surname)?;

    let short_fields = [
        ("name", Some(lead.name.as_str())),
        ("surname", Some(lead.surname.as_str())),
        ("patronymic", lead.patronymic.as_deref()),
        ("budget", lead.budget.as_deref()),
        ("contact_method", lead.contact_method.as_deref()),
        ("niche", lead.niche.as_deref()),
        ("company_size", lead.company_size.as_deref()),
        ("task_volume", lead.task_volume.as_deref()),
        ("business_size", lead.business_size.as_deref()),
        ("need_volume", lead.need_volume.as_deref()),
        ("deadline", lead.deadline.as_deref()),
        ("task_type", lead.task_type.as_deref()),
        ("product_interest", lead.product_interest.as_deref()),
        ("preferred_contact_method", lead.preferred_contact_method.as_deref()),
        ("convenient_time", lead.convenient_time.as_deref()),
        ("service", lead.service.as_deref()),
    ];
    for (field, value) in short_fields {
        check_length(field, value, SHORT_TEXT_MAX)?;
    }
    check_length("role", lead.role.as_deref(), ROLE_MAX)
}

fn validate_lead_patch(patch: &UpdateLeadRequest) -> Result<(), AppError> {
    if let Some(name) = &patch.name {
        require_text("name", name)?;
    }
    if let Some(surname) = &patch.surname {
        require_text("surname", surname)?;
    }

    fn flat(value: &Option<Option<String>>) -> Option<&str> {
        value.as_ref().and_then(|inner| inner.as_deref())
    }

    let short_fields = [
        ("name", patch.name.as_deref()),
        ("surname", patch.surname.as_deref()),
        ("patronymic", flat(&patch.patronymic)),
        ("budget", flat(&patch.budget)),
        ("contact_method", flat(&patch.contact_method)),
        ("niche", flat(&patch.niche)),
        ("company_size", flat(&patch.company_size)),
        ("task_volume", flat(&patch.task_volume)),
        ("business_size", flat(&patch.business_size)),
        ("need_volume", flat(&patch.need_volume)),
        ("deadline", flat(&patch.deadline)),
        ("task_type", flat(&patch.task_type)),
        ("product_interest", flat(&patch.product_interest)),
        ("preferred_contact_method", flat(&patch.preferred_contact_method)),
        ("convenient_time", flat(&patch.convenient_time)),
        ("service", flat(&patch.service)),
    ];
    for (field, value) in short_fields {
        check_length(field, value, SHORT_TEXT_MAX)?;
    }
    check_length("role", flat(&patch.role), ROLE_MAX)
}

fn lead_not_found() -> AppError {
    AppError::NotFound("Lead not found".to_string())
}

fn metrics_already_exist() -> AppError {
    AppError::BadRequest("Metrics for this lead already exist".to_string())
}

fn metrics_not_found() -> AppError {
    AppError::NotFound("Lead metrics not found".to_string())
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

// ============ Leads ============

/// POST /api/leads
///
/// Public intake form submission.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLeadRequest>,
) -> Result<Json<Lead>, AppError> {
    validate_new_lead(&payload)?;
    let lead = state.leads().create(&payload).await?;
    Ok(Json(lead))
}

/// GET /api/leads
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Lead>>, AppError> {
    let (skip, limit) = params.resolve()?;
    let leads = state.leads().list(skip, limit).await?;
    Ok(Json(leads))
}

/// GET /api/leads/scored
///
/// Admin only. Loads the first batch of leads, scores each one and returns a
/// page of the hottest-first ordering. `skip`/`limit` apply after sorting.
pub async fn list_scored_leads(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<ScoredLead>>, AppError> {
    require_admin(&state.config, &headers)?;
    let (skip, limit) = params.resolve()?;

    let leads = state
        .leads()
        .list(0, state.config.scored_fetch_limit)
        .await?;
    let fetched = leads.len();

    let page = rank_leads(leads, skip as usize, limit as usize);

    tracing::info!(
        "Scored {} lead(s), returning {} (skip={}, limit={})",
        fetched,
        page.len(),
        skip,
        limit
    );

    Ok(Json(page))
}

/// GET /api/leads/:id
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Lead>, AppError> {
    let lead = state.leads().get(id).await?.ok_or_else(lead_not_found)?;
    Ok(Json(lead))
}

/// GET /api/leads/:id/score
///
/// Admin only. Scores a single stored lead.
pub async fn get_lead_score(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Json<LeadScore>, AppError> {
    require_admin(&state.config, &headers)?;
    let lead = state.leads().get(id).await?.ok_or_else(lead_not_found)?;

    let scoring = score_lead(&LeadRecord::from(&lead));
    tracing::debug!(
        "Lead {} scored {} ({})",
        id,
        scoring.score,
        scoring.temperature
    );
    Ok(Json(scoring))
}

/// PATCH /api/leads/:id
pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, AppError> {
    validate_lead_patch(&patch)?;
    let lead = state
        .leads()
        .update(id, patch)
        .await?
        .ok_or_else(lead_not_found)?;
    Ok(Json(lead))
}

/// DELETE /api/leads/:id
pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.leads().delete(id).await? {
        return Err(lead_not_found());
    }
    tracing::info!("Deleted lead {}", id);
    Ok(StatusCode::NO_CONTENT)
}

// ============ Lead metrics ============

/// POST /api/lead-metrics/:lead_id
///
/// Metrics are 1:1 with a lead; a second submission is rejected.
pub async fn create_lead_metrics(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<i32>,
    Json(payload): Json<CreateLeadMetricsRequest>,
) -> Result<Json<LeadMetrics>, AppError> {
    let metrics = state.metrics();
    if metrics.get(lead_id).await?.is_some() {
        return Err(metrics_already_exist());
    }
    if !state.leads().exists(lead_id).await? {
        return Err(lead_not_found());
    }

    // A concurrent submission can still win the insert
    let created = metrics
        .create(lead_id, &payload)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                metrics_already_exist()
            } else {
                e
            }
        })?;
    Ok(Json(created))
}

/// GET /api/lead-metrics
pub async fn list_lead_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<LeadMetrics>>, AppError> {
    let (skip, limit) = params.resolve()?;
    let metrics = state.metrics().list(skip, limit).await?;
    Ok(Json(metrics))
}

/// GET /api/lead-metrics/:lead_id
pub async fn get_lead_metrics(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<i32>,
) -> Result<Json<LeadMetrics>, AppError> {
    let metrics = state
        .metrics()
        .get(lead_id)
        .await?
        .ok_or_else(metrics_not_found)?;
    Ok(Json(metrics))
}

/// PATCH /api/lead-metrics/:lead_id
pub async fn update_lead_metrics(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<i32>,
    Json(patch): Json<UpdateLeadMetricsRequest>,
) -> Result<Json<LeadMetrics>, AppError> {
    let metrics = state
        .metrics()
        .update(lead_id, patch)
        .await?
        .ok_or_else(metrics_not_found)?;
    Ok(Json(metrics))
}

/// DELETE /api/lead-metrics/:lead_id
pub async fn delete_lead_metrics(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.metrics().delete(lead_id).await? {
        return Err(metrics_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
