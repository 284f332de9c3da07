//! Status-change notifications.
//!
//! The core builds the human-readable message for each status transition;
//! actual delivery (email, messaging deep link) belongs to an external
//! channel behind the `Notifier` trait. Delivery is not guaranteed here,
//! only message construction.

use crate::db::models::SubmissionStatus;

const TEMPLATES: [(SubmissionStatus, &str); 6] = [
    (
        SubmissionStatus::Pending,
        "Your submission \"{title}\" has been received and is awaiting initial screening.",
    ),
    (
        SubmissionStatus::UnderReview,
        "Your submission \"{title}\" is now under review.",
    ),
    (
        SubmissionStatus::RevisionRequiredPhase1,
        "Reviewers have requested a first-phase revision of \"{title}\". Please revise and resubmit.",
    ),
    (
        SubmissionStatus::RevisionRequiredPhase2,
        "Reviewers have requested a second-phase revision of \"{title}\". Please revise and resubmit.",
    ),
    (
        SubmissionStatus::Accepted,
        "Congratulations! Your submission \"{title}\" has been accepted.",
    ),
    (
        SubmissionStatus::Rejected,
        "We regret to inform you that your submission \"{title}\" was not accepted.",
    ),
];

/// Render the message for a status transition.
pub fn status_message(status: SubmissionStatus, title: &str) -> String {
    let template = TEMPLATES
        .iter()
        .find(|(s, _)| *s == status)
        .map(|(_, t)| *t)
        .unwrap_or("The status of your submission \"{title}\" has changed.");
    template.replace("{title}", title)
}

/// Recipient contact details, supplied by the caller from the owning user.
#[derive(Debug, Clone)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

/// Outbound notification channel. Implementations hand the rendered message
/// to whatever transport they wrap; the default just logs the hand-off.
pub trait Notifier: Send + Sync {
    fn notify(&self, contact: &Contact, message: &str);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, contact: &Contact, message: &str) {
        tracing::info!(
            recipient = %contact.email,
            "notification queued: {}",
            message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_status_has_a_template() {
        for status in SubmissionStatus::ALL {
            let message = status_message(status, "Deep Learning for Coral Reefs");
            assert!(
                message.contains("Deep Learning for Coral Reefs"),
                "message for {:?} must embed the title",
                status
            );
            assert!(!message.contains("{title}"));
        }
    }

    #[test]
    fn test_accept_and_reject_read_differently() {
        let accepted = status_message(SubmissionStatus::Accepted, "T");
        let rejected = status_message(SubmissionStatus::Rejected, "T");
        assert_ne!(accepted, rejected);
        assert!(accepted.contains("accepted"));
    }
}
