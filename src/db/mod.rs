pub mod models;

pub use models::*;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;

pub type DbPool = Arc<PgPool>;

/// Business rule, not a database cap: checked before insert while holding a
/// row lock on the submission.
pub const MAX_REVIEWERS: i64 = 5;

/// Admission check for the next candidate in an assignment batch.
fn within_reviewer_limit(current_count: i64, inserted_in_call: i64) -> bool {
    current_count + inserted_in_call < MAX_REVIEWERS
}

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

// ---------------------------------------------------------------------------
// Users

pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    role: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, role, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
        .fetch_all(pool)
        .await
}

pub async fn update_user_role(
    pool: &PgPool,
    user_id: Uuid,
    role: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("UPDATE users SET role = $2 WHERE id = $1 RETURNING *")
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await
}

pub async fn toggle_email_verified(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET email_verified = NOT email_verified WHERE id = $1 RETURNING *",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Hard delete. The user's review rows go in the same transaction so a
/// deleted reviewer can never leave dangling reviews; owned submissions and
/// payments follow the FK cascade.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM reviews WHERE reviewer_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;

    tx.commit().await?;
    Ok(deleted)
}

// ---------------------------------------------------------------------------
// Submissions

pub struct NewSubmission<'a> {
    pub reference: &'a str,
    pub user_id: Uuid,
    pub title: &'a str,
    pub theme: &'a str,
    pub sub_theme: &'a str,
    pub presentation_type: &'a str,
    pub status: &'a str,
    pub co_authors: &'a [CoAuthor],
}

pub async fn create_submission(
    pool: &PgPool,
    submission: NewSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        r#"
        INSERT INTO submissions (id, reference, user_id, title, theme, sub_theme, presentation_type, status, co_authors)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(submission.reference)
    .bind(submission.user_id)
    .bind(submission.title)
    .bind(submission.theme)
    .bind(submission.sub_theme)
    .bind(submission.presentation_type)
    .bind(submission.status)
    .bind(sqlx::types::Json(submission.co_authors))
    .fetch_one(pool)
    .await
}

pub async fn get_submission(
    pool: &PgPool,
    submission_id: Uuid,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = $1")
        .bind(submission_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_submissions(
    pool: &PgPool,
    owner: Option<Uuid>,
) -> Result<Vec<Submission>, sqlx::Error> {
    match owner {
        Some(user_id) => {
            sqlx::query_as::<_, Submission>(
                "SELECT * FROM submissions WHERE user_id = $1 ORDER BY created_at DESC",
            )
            .bind(user_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Submission>("SELECT * FROM submissions ORDER BY created_at DESC")
                .fetch_all(pool)
                .await
        }
    }
}

/// Author revision: replaces the editable fields and moves the status along
/// (a revision-required submission returns to review).
pub async fn update_submission_content(
    pool: &PgPool,
    submission_id: Uuid,
    title: &str,
    theme: &str,
    sub_theme: &str,
    presentation_type: &str,
    co_authors: &[CoAuthor],
    status: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        r#"
        UPDATE submissions
        SET title = $2, theme = $3, sub_theme = $4, presentation_type = $5, co_authors = $6, status = $7
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(submission_id)
    .bind(title)
    .bind(theme)
    .bind(sub_theme)
    .bind(presentation_type)
    .bind(sqlx::types::Json(co_authors))
    .bind(status)
    .fetch_optional(pool)
    .await
}

pub async fn set_submission_status(
    pool: &PgPool,
    submission_id: Uuid,
    status: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "UPDATE submissions SET status = $2 WHERE id = $1 RETURNING *",
    )
    .bind(submission_id)
    .bind(status)
    .fetch_optional(pool)
    .await
}

pub async fn delete_submission(pool: &PgPool, submission_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
        .bind(submission_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn export_rows(pool: &PgPool) -> Result<Vec<ExportRow>, sqlx::Error> {
    sqlx::query_as::<_, ExportRow>(
        r#"
        SELECT s.reference, s.title, s.theme, s.sub_theme, s.presentation_type, s.status,
               u.name AS author_name, u.email AS author_email,
               jsonb_array_length(s.co_authors) AS co_author_count,
               p.amount, p.verified AS payment_verified,
               s.created_at
        FROM submissions s
        JOIN users u ON u.id = s.user_id
        LEFT JOIN LATERAL (
            SELECT amount, verified
            FROM payments
            WHERE submission_id = s.id
            ORDER BY created_at DESC
            LIMIT 1
        ) p ON TRUE
        ORDER BY s.created_at
        "#,
    )
    .fetch_all(pool)
    .await
}

// ---------------------------------------------------------------------------
// Reviews

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOutcome {
    Assigned,
    AlreadyAssigned,
    LimitExceeded,
    ReviewerNotFound,
}

#[derive(Debug, Serialize)]
pub struct ReviewerAssignment {
    pub reviewer_id: Uuid,
    pub outcome: AssignOutcome,
}

/// Assign reviewers to a submission, reporting a per-reviewer outcome.
///
/// Runs in one transaction holding a row lock on the submission, so two
/// concurrent calls cannot both pass the count check and jointly push a
/// submission past five reviewers. The guard reproduces the original
/// current-plus-selected-below-five check: an id over the cap fails alone
/// while the rest of the batch proceeds.
pub async fn assign_reviewers(
    pool: &PgPool,
    submission_id: Uuid,
    reviewer_ids: &[Uuid],
) -> Result<Vec<ReviewerAssignment>, AppError> {
    let mut tx = pool.begin().await?;

    let locked =
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM submissions WHERE id = $1 FOR UPDATE")
            .bind(submission_id)
            .fetch_optional(&mut *tx)
            .await?;
    if locked.is_none() {
        return Err(AppError::not_found(format!("submission {}", submission_id)));
    }

    let current_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE submission_id = $1")
            .bind(submission_id)
            .fetch_one(&mut *tx)
            .await?;

    let mut outcomes = Vec::with_capacity(reviewer_ids.len());
    let mut inserted: i64 = 0;

    for reviewer_id in reviewer_ids {
        let reviewer_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(reviewer_id)
                .fetch_one(&mut *tx)
                .await?;
        if !reviewer_exists {
            outcomes.push(ReviewerAssignment {
                reviewer_id: *reviewer_id,
                outcome: AssignOutcome::ReviewerNotFound,
            });
            continue;
        }

        let already_assigned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE submission_id = $1 AND reviewer_id = $2)",
        )
        .bind(submission_id)
        .bind(reviewer_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_assigned {
            outcomes.push(ReviewerAssignment {
                reviewer_id: *reviewer_id,
                outcome: AssignOutcome::AlreadyAssigned,
            });
            continue;
        }

        if !within_reviewer_limit(current_count, inserted) {
            outcomes.push(ReviewerAssignment {
                reviewer_id: *reviewer_id,
                outcome: AssignOutcome::LimitExceeded,
            });
            continue;
        }

        sqlx::query("INSERT INTO reviews (id, submission_id, reviewer_id) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(submission_id)
            .bind(reviewer_id)
            .execute(&mut *tx)
            .await?;
        inserted += 1;
        outcomes.push(ReviewerAssignment {
            reviewer_id: *reviewer_id,
            outcome: AssignOutcome::Assigned,
        });
    }

    tx.commit().await?;
    Ok(outcomes)
}

/// Idempotent: removing a reviewer who is not assigned is a no-op, not an
/// error. Returns whether a row was actually removed.
pub async fn remove_reviewer(
    pool: &PgPool,
    submission_id: Uuid,
    reviewer_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE submission_id = $1 AND reviewer_id = $2")
        .bind(submission_id)
        .bind(reviewer_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn reviews_for_submission(
    pool: &PgPool,
    submission_id: Uuid,
) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE submission_id = $1 ORDER BY created_at",
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await
}

pub async fn set_review_scores(
    pool: &PgPool,
    review_id: Uuid,
    scores: [i32; 5],
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(
        r#"
        UPDATE reviews
        SET originality = $2, relevance = $3, clarity = $4, methodology = $5, overall = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(review_id)
    .bind(scores[0])
    .bind(scores[1])
    .bind(scores[2])
    .bind(scores[3])
    .bind(scores[4])
    .fetch_optional(pool)
    .await
}

// ---------------------------------------------------------------------------
// Payments

pub async fn create_payment(
    pool: &PgPool,
    submission_id: Uuid,
    user_id: Uuid,
    amount: f64,
    proof_handle: &str,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (id, submission_id, user_id, amount, verified, proof_handle)
        VALUES ($1, $2, $3, $4, FALSE, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(submission_id)
    .bind(user_id)
    .bind(amount)
    .bind(proof_handle)
    .fetch_one(pool)
    .await
}

pub async fn list_payments(pool: &PgPool) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Verify and reject are the same toggle; rejection returns a payment to
/// unverified rather than entering a distinct terminal state.
pub async fn set_payment_verified(
    pool: &PgPool,
    payment_id: Uuid,
    verified: bool,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "UPDATE payments SET verified = $2 WHERE id = $1 RETURNING *",
    )
    .bind(payment_id)
    .bind(verified)
    .fetch_optional(pool)
    .await
}

// ---------------------------------------------------------------------------
// Settings

pub async fn list_settings(pool: &PgPool) -> Result<Vec<Setting>, sqlx::Error> {
    sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY group_label, key")
        .fetch_all(pool)
        .await
}

/// Atomic insert-if-absent-else-update keyed on the setting name. Group and
/// type stick from the first write; later writes touch the value only.
pub async fn upsert_setting(
    pool: &PgPool,
    key: &str,
    group_label: &str,
    value_type: &str,
    value: &str,
) -> Result<Setting, sqlx::Error> {
    sqlx::query_as::<_, Setting>(
        r#"
        INSERT INTO settings (key, group_label, value_type, value, updated_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(key)
    .bind(group_label)
    .bind(value_type)
    .bind(value)
    .fetch_one(pool)
    .await
}

// ---------------------------------------------------------------------------
// Analytics feeds

pub async fn record_visit(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO visits DEFAULT VALUES")
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn visit_timestamps_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM visits WHERE created_at >= $1 ORDER BY created_at",
    )
    .bind(since)
    .fetch_all(pool)
    .await
}

pub async fn count_visits(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visits")
        .fetch_one(pool)
        .await
}

pub async fn submission_timestamps_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM submissions WHERE created_at >= $1 ORDER BY created_at",
    )
    .bind(since)
    .fetch_all(pool)
    .await
}

pub async fn count_submissions(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submissions")
        .fetch_one(pool)
        .await
}

pub async fn theme_distribution(pool: &PgPool) -> Result<Vec<CategoryCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryCount>(
        "SELECT theme AS label, COUNT(*) AS count FROM submissions GROUP BY theme ORDER BY count DESC, label",
    )
    .fetch_all(pool)
    .await
}

pub async fn presentation_distribution(pool: &PgPool) -> Result<Vec<CategoryCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryCount>(
        "SELECT presentation_type AS label, COUNT(*) AS count FROM submissions GROUP BY presentation_type ORDER BY count DESC, label",
    )
    .fetch_all(pool)
    .await
}

pub async fn status_distribution(pool: &PgPool) -> Result<Vec<CategoryCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryCount>(
        "SELECT status AS label, COUNT(*) AS count FROM submissions GROUP BY status ORDER BY count DESC, label",
    )
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_admits_exactly_the_remaining_slots() {
        let current = 3;
        let mut inserted = 0;
        for _ in 0..10 {
            if within_reviewer_limit(current, inserted) {
                inserted += 1;
            }
        }
        assert_eq!(inserted, MAX_REVIEWERS - current);
    }

    #[test]
    fn test_guard_at_capacity_admits_none() {
        assert!(!within_reviewer_limit(MAX_REVIEWERS, 0));
        assert!(!within_reviewer_limit(4, 1));
        assert!(within_reviewer_limit(4, 0));
        assert!(within_reviewer_limit(0, 4));
        assert!(!within_reviewer_limit(0, 5));
    }
}
