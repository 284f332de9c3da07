use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::{CoAuthor, PresentationType, Submission, SubmissionStatus};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const MAX_CO_AUTHORS: usize = 5;

#[derive(Deserialize)]
pub struct SettingsQuery {
    pub scope: Option<String>,
}

/// `?scope=public` returns the landing-page payload with every field
/// defaulted; without it the raw rows are returned for the admin settings
/// editor.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SettingsQuery>,
) -> AppResult<Json<Value>> {
    let settings = crate::db::list_settings(state.pool.as_ref()).await?;
    if query.scope.as_deref() == Some("public") {
        Ok(Json(crate::settings::landing_payload(&settings)))
    } else {
        Ok(Json(json!({ "settings": settings })))
    }
}

/// File-storage collaborator endpoint: binary in, opaque handle out.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: axum::extract::Multipart,
) -> AppResult<Json<Value>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename = String::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name().unwrap_or("") == "file" {
            filename = field.file_name().unwrap_or("file").to_string();
            if let Ok(data) = field.bytes().await {
                file_data = Some(data.to_vec());
            }
        }
    }

    let file_data = match file_data {
        Some(d) if !d.is_empty() => d,
        _ => return Err(AppError::validation("file", "missing or empty file field")),
    };

    let handle = crate::storage::store_file(&state.config.upload_folder, &filename, &file_data)?;
    Ok(Json(json!({ "handle": handle })))
}

pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> AppResult<impl IntoResponse> {
    let path = crate::storage::resolve(&state.config.upload_folder, &handle)
        .ok_or_else(|| AppError::not_found(format!("file {}", handle)))?;

    let content = std::fs::read(&path)?;
    let mime = mime_guess::from_path(&handle)
        .first_raw()
        .unwrap_or("application/octet-stream");

    Ok(axum::response::Response::builder()
        .header("Content-Type", mime)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", handle),
        )
        .body(axum::body::Body::from(content))
        .unwrap()
        .into_response())
}

#[derive(Deserialize)]
pub struct CreateSubmissionRequest {
    pub user_id: Uuid,
    pub title: String,
    pub sub_theme: String,
    pub presentation_type: String,
    #[serde(default)]
    pub co_authors: Vec<CoAuthor>,
}

pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSubmissionRequest>,
) -> AppResult<Json<Submission>> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title", "title must not be empty"));
    }
    let presentation = PresentationType::parse(&req.presentation_type)?;
    validate_co_authors(&req.co_authors)?;

    if crate::db::get_user(state.pool.as_ref(), req.user_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(format!("user {}", req.user_id)));
    }

    let reference = crate::storage::generate_reference();
    let submission = crate::db::create_submission(
        state.pool.as_ref(),
        crate::db::NewSubmission {
            reference: &reference,
            user_id: req.user_id,
            title,
            theme: crate::themes::theme_for(&req.sub_theme),
            sub_theme: req.sub_theme.trim(),
            presentation_type: presentation.as_str(),
            status: SubmissionStatus::Pending.as_str(),
            co_authors: &req.co_authors,
        },
    )
    .await?;

    Ok(Json(submission))
}

#[derive(Deserialize)]
pub struct UpdateSubmissionRequest {
    pub title: String,
    pub sub_theme: String,
    pub presentation_type: String,
    #[serde(default)]
    pub co_authors: Vec<CoAuthor>,
}

/// Author revision. A submission sent back for revision returns to
/// under_review on resubmission; otherwise the status is untouched.
pub async fn update_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<UpdateSubmissionRequest>,
) -> AppResult<Json<Submission>> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title", "title must not be empty"));
    }
    let presentation = PresentationType::parse(&req.presentation_type)?;
    validate_co_authors(&req.co_authors)?;

    let current = crate::db::get_submission(state.pool.as_ref(), submission_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("submission {}", submission_id)))?;

    let next_status = match SubmissionStatus::parse(&current.status) {
        Ok(status) if status.is_revision_required() => {
            SubmissionStatus::UnderReview.as_str().to_string()
        }
        _ => current.status.clone(),
    };

    let updated = crate::db::update_submission_content(
        state.pool.as_ref(),
        submission_id,
        title,
        crate::themes::theme_for(&req.sub_theme),
        req.sub_theme.trim(),
        presentation.as_str(),
        &req.co_authors,
        &next_status,
    )
    .await?
    .ok_or_else(|| AppError::not_found(format!("submission {}", submission_id)))?;

    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct ListSubmissionsQuery {
    pub user: Option<Uuid>,
}

pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListSubmissionsQuery>,
) -> AppResult<Json<Vec<Submission>>> {
    let submissions = crate::db::list_submissions(state.pool.as_ref(), query.user).await?;
    Ok(Json(submissions))
}

pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<Uuid>,
) -> AppResult<Json<Submission>> {
    let submission = crate::db::get_submission(state.pool.as_ref(), submission_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("submission {}", submission_id)))?;
    Ok(Json(submission))
}

/// Average of the submission's completed reviews; null until at least one
/// reviewer has filled in all five scores.
pub async fn submission_score(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if crate::db::get_submission(state.pool.as_ref(), submission_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(format!("submission {}", submission_id)));
    }

    let reviews = crate::db::reviews_for_submission(state.pool.as_ref(), submission_id).await?;
    let completed = reviews.iter().filter(|r| crate::scoring::is_complete(r)).count();

    Ok(Json(json!({
        "average": crate::scoring::average_score(&reviews),
        "reviews_assigned": reviews.len(),
        "reviews_completed": completed,
    })))
}

#[derive(Deserialize)]
pub struct ScoresRequest {
    pub originality: i32,
    pub relevance: i32,
    pub clarity: i32,
    pub methodology: i32,
    pub overall: i32,
}

pub async fn submit_scores(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<Uuid>,
    Json(req): Json<ScoresRequest>,
) -> AppResult<Json<crate::db::models::Review>> {
    crate::scoring::validate_score("originality", req.originality)?;
    crate::scoring::validate_score("relevance", req.relevance)?;
    crate::scoring::validate_score("clarity", req.clarity)?;
    crate::scoring::validate_score("methodology", req.methodology)?;
    crate::scoring::validate_score("overall", req.overall)?;

    let review = crate::db::set_review_scores(
        state.pool.as_ref(),
        review_id,
        [
            req.originality,
            req.relevance,
            req.clarity,
            req.methodology,
            req.overall,
        ],
    )
    .await?
    .ok_or_else(|| AppError::not_found(format!("review {}", review_id)))?;

    Ok(Json(review))
}

#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    pub submission_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub proof_handle: String,
}

/// Authors register a payment with the proof handle returned by the file
/// storage collaborator. Payments start unverified.
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> AppResult<Json<crate::db::models::Payment>> {
    if crate::db::get_submission(state.pool.as_ref(), req.submission_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(format!(
            "submission {}",
            req.submission_id
        )));
    }
    if crate::db::get_user(state.pool.as_ref(), req.user_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(format!("user {}", req.user_id)));
    }

    let payment = crate::db::create_payment(
        state.pool.as_ref(),
        req.submission_id,
        req.user_id,
        req.amount,
        &req.proof_handle,
    )
    .await?;

    Ok(Json(payment))
}

fn validate_co_authors(co_authors: &[CoAuthor]) -> AppResult<()> {
    if co_authors.len() > MAX_CO_AUTHORS {
        return Err(AppError::validation(
            "co_authors",
            format!("at most {} co-authors are allowed", MAX_CO_AUTHORS),
        ));
    }
    for (i, co_author) in co_authors.iter().enumerate() {
        if co_author.name.trim().is_empty() {
            return Err(AppError::validation(
                "co_authors",
                format!("co-author {} is missing a name", i + 1),
            ));
        }
    }
    Ok(())
}
