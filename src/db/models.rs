use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// The six submission lifecycle states.
///
/// Admins may move a submission from any status to any other in a single
/// step; the only validation is membership in this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Pending,
    UnderReview,
    RevisionRequiredPhase1,
    RevisionRequiredPhase2,
    Accepted,
    Rejected,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 6] = [
        SubmissionStatus::Pending,
        SubmissionStatus::UnderReview,
        SubmissionStatus::RevisionRequiredPhase1,
        SubmissionStatus::RevisionRequiredPhase2,
        SubmissionStatus::Accepted,
        SubmissionStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::UnderReview => "under_review",
            SubmissionStatus::RevisionRequiredPhase1 => "revision_required_phase1",
            SubmissionStatus::RevisionRequiredPhase2 => "revision_required_phase2",
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        Self::ALL
            .iter()
            .find(|s| s.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::validation("status", format!("unknown status '{}'", value)))
    }

    /// A revision request returns to review once the author resubmits.
    pub fn is_revision_required(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::RevisionRequiredPhase1 | SubmissionStatus::RevisionRequiredPhase2
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationType {
    Oral,
    Poster,
}

impl PresentationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationType::Oral => "Oral",
            PresentationType::Poster => "Poster",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        if value.eq_ignore_ascii_case("oral") {
            Ok(PresentationType::Oral)
        } else if value.eq_ignore_ascii_case("poster") {
            Ok(PresentationType::Poster)
        } else {
            Err(AppError::validation(
                "presentation_type",
                format!("unknown presentation type '{}'", value),
            ))
        }
    }
}

/// User roles, compared case-insensitively on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Author,
    Reviewer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Author => "Author",
            Role::Reviewer => "Reviewer",
            Role::Admin => "Admin",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        if value.eq_ignore_ascii_case("author") {
            Ok(Role::Author)
        } else if value.eq_ignore_ascii_case("reviewer") {
            Ok(Role::Reviewer)
        } else if value.eq_ignore_ascii_case("admin") {
            Ok(Role::Admin)
        } else {
            Err(AppError::validation(
                "role",
                format!("unknown role '{}'", value),
            ))
        }
    }

    /// Entering or leaving the Admin role requires a confirmed second call.
    pub fn is_critical_change(&self, requested: Role) -> bool {
        requested == Role::Admin || (*self == Role::Admin && requested != Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoAuthor {
    pub name: String,
    pub institute: String,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub reference: String,
    pub user_id: Uuid,
    pub title: String,
    pub theme: String,
    pub sub_theme: String,
    pub presentation_type: String,
    pub status: String,
    pub co_authors: Json<Vec<CoAuthor>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub reviewer_id: Uuid,
    pub originality: Option<i32>,
    pub relevance: Option<i32>,
    pub clarity: Option<i32>,
    pub methodology: Option<i32>,
    pub overall: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub verified: bool,
    pub proof_handle: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub group_label: String,
    pub value_type: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// One label/count pair from a GROUP BY aggregate.
#[derive(Debug, FromRow, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: i64,
}

/// Denormalized submission row for the CSV export.
#[derive(Debug, FromRow)]
pub struct ExportRow {
    pub reference: String,
    pub title: String,
    pub theme: String,
    pub sub_theme: String,
    pub presentation_type: String,
    pub status: String,
    pub author_name: String,
    pub author_email: String,
    pub co_author_count: i32,
    pub amount: Option<f64>,
    pub payment_verified: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_known_values() {
        for status in SubmissionStatus::ALL {
            assert_eq!(SubmissionStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert!(SubmissionStatus::parse("approved").is_err());
        assert!(SubmissionStatus::parse("").is_err());
        assert!(SubmissionStatus::parse("Pending").is_err());
    }

    #[test]
    fn test_revision_statuses() {
        assert!(SubmissionStatus::RevisionRequiredPhase1.is_revision_required());
        assert!(SubmissionStatus::RevisionRequiredPhase2.is_revision_required());
        assert!(!SubmissionStatus::Accepted.is_revision_required());
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::parse("Reviewer").unwrap(), Role::Reviewer);
        assert!(Role::parse("superuser").is_err());
    }

    #[test]
    fn test_critical_role_changes() {
        assert!(Role::Author.is_critical_change(Role::Admin));
        assert!(Role::Admin.is_critical_change(Role::Reviewer));
        assert!(Role::Admin.is_critical_change(Role::Admin));
        assert!(!Role::Author.is_critical_change(Role::Reviewer));
        assert!(!Role::Reviewer.is_critical_change(Role::Author));
    }

    #[test]
    fn test_presentation_type_parse() {
        assert_eq!(
            PresentationType::parse("oral").unwrap(),
            PresentationType::Oral
        );
        assert_eq!(
            PresentationType::parse("Poster").unwrap(),
            PresentationType::Poster
        );
        assert!(PresentationType::parse("workshop").is_err());
    }
}
