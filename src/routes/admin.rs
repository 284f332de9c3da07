use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::{Payment, Review, Role, Submission, SubmissionStatus, User};
use crate::error::{AppError, AppResult};
use crate::notify::{Contact, Notifier};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Submission status

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> AppResult<Json<Submission>> {
    let status = SubmissionStatus::parse(&req.status)?;

    let submission = crate::db::set_submission_status(
        state.pool.as_ref(),
        submission_id,
        status.as_str(),
    )
    .await?
    .ok_or_else(|| AppError::not_found(format!("submission {}", submission_id)))?;

    notify_owner(&state, &submission, status).await;
    Ok(Json(submission))
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOutcome {
    Updated,
    NotFound,
    Error,
}

#[derive(Serialize)]
pub struct BulkStatusResult {
    pub id: Uuid,
    pub outcome: BulkOutcome,
}

#[derive(Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
    pub status: String,
}

/// Applies the status per id with partial-success semantics: one missing or
/// failing id never aborts the rest, and every id reports its own outcome.
pub async fn bulk_set_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkStatusRequest>,
) -> AppResult<Json<Value>> {
    let status = SubmissionStatus::parse(&req.status)?;

    let mut results = Vec::with_capacity(req.ids.len());
    for id in req.ids {
        let outcome = match crate::db::set_submission_status(
            state.pool.as_ref(),
            id,
            status.as_str(),
        )
        .await
        {
            Ok(Some(submission)) => {
                notify_owner(&state, &submission, status).await;
                BulkOutcome::Updated
            }
            Ok(None) => BulkOutcome::NotFound,
            Err(e) => {
                tracing::error!("bulk status update failed for {}: {}", id, e);
                BulkOutcome::Error
            }
        };
        results.push(BulkStatusResult { id, outcome });
    }

    Ok(Json(json!({ "results": results })))
}

pub async fn delete_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !crate::db::delete_submission(state.pool.as_ref(), submission_id).await? {
        return Err(AppError::not_found(format!("submission {}", submission_id)));
    }
    Ok(Json(json!({ "deleted": true })))
}

async fn notify_owner(state: &AppState, submission: &Submission, status: SubmissionStatus) {
    match crate::db::get_user(state.pool.as_ref(), submission.user_id).await {
        Ok(Some(owner)) => {
            let message = crate::notify::status_message(status, &submission.title);
            let contact = Contact {
                name: owner.name,
                email: owner.email,
            };
            state.notifier.notify(&contact, &message);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(
            "could not load owner of submission {} for notification: {}",
            submission.id,
            e
        ),
    }
}

// ---------------------------------------------------------------------------
// Reviewer assignment

pub async fn submission_reviews(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<Uuid>,
) -> AppResult<Json<Vec<Review>>> {
    if crate::db::get_submission(state.pool.as_ref(), submission_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(format!("submission {}", submission_id)));
    }
    let reviews = crate::db::reviews_for_submission(state.pool.as_ref(), submission_id).await?;
    Ok(Json(reviews))
}

#[derive(Deserialize)]
pub struct AssignReviewersRequest {
    pub reviewer_ids: Vec<Uuid>,
}

pub async fn assign_reviewers(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<AssignReviewersRequest>,
) -> AppResult<Json<Value>> {
    let results =
        crate::db::assign_reviewers(state.pool.as_ref(), submission_id, &req.reviewer_ids).await?;
    Ok(Json(json!({ "results": results })))
}

pub async fn remove_reviewer(
    State(state): State<Arc<AppState>>,
    Path((submission_id, reviewer_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    let removed =
        crate::db::remove_reviewer(state.pool.as_ref(), submission_id, reviewer_id).await?;
    Ok(Json(json!({ "removed": removed })))
}

// ---------------------------------------------------------------------------
// Payments

pub async fn list_payments(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Payment>>> {
    let payments = crate::db::list_payments(state.pool.as_ref()).await?;
    Ok(Json(payments))
}

pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    set_verified(&state, payment_id, true).await
}

/// Rejection toggles the payment back to unverified; there is no separate
/// rejected state.
pub async fn reject_payment(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    set_verified(&state, payment_id, false).await
}

async fn set_verified(state: &AppState, payment_id: Uuid, verified: bool) -> AppResult<Json<Payment>> {
    let payment = crate::db::set_payment_verified(state.pool.as_ref(), payment_id, verified)
        .await?
        .ok_or_else(|| AppError::not_found(format!("payment {}", payment_id)))?;
    Ok(Json(payment))
}

pub async fn payment_stats(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let payments = crate::db::list_payments(state.pool.as_ref()).await?;
    Ok(Json(json!(crate::analytics::payment_stats(&payments))))
}

// ---------------------------------------------------------------------------
// Users & roles

pub async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    let users = crate::db::list_users(state.pool.as_ref()).await?;
    Ok(Json(users))
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}

/// Admin-created account, typically a reviewer. The credential is set later
/// through the external authentication flow.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<Json<User>> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("name", "name must not be empty"));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::validation("email", "a valid email is required"));
    }
    let role = match &req.role {
        Some(r) => Role::parse(r)?,
        None => Role::Author,
    };

    let user = crate::db::create_user(
        state.pool.as_ref(),
        req.name.trim(),
        req.email.trim(),
        role.as_str(),
        "",
    )
    .await?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
    #[serde(default)]
    pub confirm: bool,
}

/// Promoting to or demoting from Admin is a critical change: the first call
/// answers with ConfirmationRequired and applies nothing; the retry carrying
/// `confirm: true` applies it. Other role changes apply immediately.
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ChangeRoleRequest>,
) -> AppResult<Json<User>> {
    let requested = Role::parse(&req.role)?;

    let user = crate::db::get_user(state.pool.as_ref(), user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {}", user_id)))?;
    let current = Role::parse(&user.role).unwrap_or(Role::Author);

    if current.is_critical_change(requested) && !req.confirm {
        return Err(AppError::ConfirmationRequired {
            user_id,
            current_role: user.role.clone(),
            requested_role: requested.as_str().to_string(),
        });
    }

    let updated = crate::db::update_user_role(state.pool.as_ref(), user_id, requested.as_str())
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {}", user_id)))?;
    Ok(Json(updated))
}

/// Admin override of the normal email verification flow.
pub async fn toggle_verification(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let user = crate::db::toggle_email_verified(state.pool.as_ref(), user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {}", user_id)))?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !crate::db::delete_user(state.pool.as_ref(), user_id).await? {
        return Err(AppError::not_found(format!("user {}", user_id)));
    }
    Ok(Json(json!({ "deleted": true })))
}

// ---------------------------------------------------------------------------
// Settings

#[derive(Deserialize)]
pub struct UpsertSettingRequest {
    pub value: Value,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(rename = "type", default = "default_type")]
    pub value_type: String,
}

fn default_group() -> String {
    "general".to_string()
}

fn default_type() -> String {
    crate::settings::TYPE_PLAIN.to_string()
}

pub async fn upsert_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(req): Json<UpsertSettingRequest>,
) -> AppResult<Json<crate::db::models::Setting>> {
    if key.trim().is_empty() {
        return Err(AppError::validation("key", "setting key must not be empty"));
    }
    if !crate::settings::validate_type(&req.value_type) {
        return Err(AppError::validation(
            "type",
            format!("unknown setting type '{}'", req.value_type),
        ));
    }

    let raw = if req.value_type == crate::settings::TYPE_STRUCTURED {
        req.value.to_string()
    } else {
        match req.value.as_str() {
            Some(s) => s.to_string(),
            None => {
                return Err(AppError::validation(
                    "value",
                    "plain settings take a string value",
                ))
            }
        }
    };

    let setting =
        crate::db::upsert_setting(state.pool.as_ref(), &key, &req.group, &req.value_type, &raw)
            .await?;
    Ok(Json(setting))
}

// ---------------------------------------------------------------------------
// Analytics

/// Dashboard aggregates, recomputed per request. The client polls this every
/// 10-15 seconds; the feeds are bounded range scans so that stays cheap.
pub async fn analytics_overview(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let now = Utc::now();
    let month_ago = now - Duration::days(30);
    let pool = state.pool.as_ref();

    let visit_timestamps = crate::db::visit_timestamps_since(pool, month_ago).await?;
    let total_visits = crate::db::count_visits(pool).await?;
    let submission_timestamps = crate::db::submission_timestamps_since(pool, month_ago).await?;
    let total_submissions = crate::db::count_submissions(pool).await?;
    let payments = crate::db::list_payments(pool).await?;

    Ok(Json(json!({
        "visits": crate::analytics::windowed_counts(&visit_timestamps, now, total_visits),
        "submissions": crate::analytics::windowed_counts(&submission_timestamps, now, total_submissions),
        "themes": crate::db::theme_distribution(pool).await?,
        "presentation_types": crate::db::presentation_distribution(pool).await?,
        "statuses": crate::db::status_distribution(pool).await?,
        "payments": crate::analytics::payment_stats(&payments),
    })))
}

#[derive(Deserialize)]
pub struct TimeSeriesQuery {
    pub metric: String,
    pub period: String,
}

pub async fn analytics_timeseries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimeSeriesQuery>,
) -> AppResult<Json<Value>> {
    let period = crate::analytics::Period::parse(&query.period)?;
    let now = Utc::now();
    let since = period.window_start(now);
    let pool = state.pool.as_ref();

    let timestamps = match query.metric.as_str() {
        "visits" => crate::db::visit_timestamps_since(pool, since).await?,
        "submissions" => crate::db::submission_timestamps_since(pool, since).await?,
        other => {
            return Err(AppError::validation(
                "metric",
                format!("unknown metric '{}', expected visits or submissions", other),
            ))
        }
    };

    let points = crate::analytics::time_series(&timestamps, period, now);
    Ok(Json(json!({
        "metric": query.metric,
        "period": query.period,
        "points": points,
    })))
}

// ---------------------------------------------------------------------------
// Export

pub async fn export_submissions(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let rows = crate::db::export_rows(state.pool.as_ref()).await?;
    let csv = crate::export::submissions_csv(&rows);

    Ok(axum::response::Response::builder()
        .header("Content-Type", "text/csv")
        .header(
            "Content-Disposition",
            "attachment; filename=\"submissions.csv\"",
        )
        .body(axum::body::Body::from(csv))
        .unwrap()
        .into_response())
}
