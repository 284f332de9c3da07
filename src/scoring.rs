//! Review score aggregation.

use crate::db::models::Review;
use crate::error::AppError;

pub const SCORE_MIN: i32 = 1;
pub const SCORE_MAX: i32 = 5;

/// A review counts toward the aggregate only once all five sub-scores are in.
pub fn is_complete(review: &Review) -> bool {
    review.originality.is_some()
        && review.relevance.is_some()
        && review.clarity.is_some()
        && review.methodology.is_some()
        && review.overall.is_some()
}

/// Average score across a submission's completed reviews, rounded to one
/// decimal place.
///
/// Each completed review is first collapsed to the mean of its five
/// sub-scores, then those per-review means are averaged. With no completed
/// reviews there is no score at all, which is distinct from a score of zero.
pub fn average_score(reviews: &[Review]) -> Option<f64> {
    let mut review_means = Vec::new();
    for review in reviews {
        if let (Some(originality), Some(relevance), Some(clarity), Some(methodology), Some(overall)) = (
            review.originality,
            review.relevance,
            review.clarity,
            review.methodology,
            review.overall,
        ) {
            let sum = originality + relevance + clarity + methodology + overall;
            review_means.push(f64::from(sum) / 5.0);
        }
    }

    if review_means.is_empty() {
        return None;
    }

    let mean = review_means.iter().sum::<f64>() / review_means.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// Validate a single sub-score against the 1-5 range.
pub fn validate_score(field: &str, value: i32) -> Result<(), AppError> {
    if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
        return Err(AppError::validation(
            field,
            format!("score must be between {} and {}", SCORE_MIN, SCORE_MAX),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn review(scores: [Option<i32>; 5]) -> Review {
        Review {
            id: Uuid::new_v4(),
            submission_id: Uuid::new_v4(),
            reviewer_id: Uuid::new_v4(),
            originality: scores[0],
            relevance: scores[1],
            clarity: scores[2],
            methodology: scores[3],
            overall: scores[4],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_reviews_is_not_available() {
        assert_eq!(average_score(&[]), None);
    }

    #[test]
    fn test_incomplete_reviews_are_not_available() {
        let reviews = vec![
            review([Some(5), Some(5), Some(5), Some(5), None]),
            review([None, None, None, None, None]),
        ];
        assert_eq!(average_score(&reviews), None);
    }

    #[test]
    fn test_mean_of_means() {
        let reviews = vec![
            review([Some(5), Some(5), Some(5), Some(5), Some(5)]),
            review([Some(3), Some(3), Some(3), Some(3), Some(3)]),
        ];
        assert_eq!(average_score(&reviews), Some(4.0));
    }

    #[test]
    fn test_incomplete_reviews_are_excluded() {
        let reviews = vec![
            review([Some(4), Some(4), Some(4), Some(4), Some(4)]),
            review([Some(1), Some(1), Some(1), Some(1), None]),
        ];
        assert_eq!(average_score(&reviews), Some(4.0));
    }

    #[test]
    fn test_rounding_to_one_decimal() {
        // Means 2.0, 3.0, 4.2 -> 3.0666... -> 3.1
        let reviews = vec![
            review([Some(2), Some(2), Some(2), Some(2), Some(2)]),
            review([Some(3), Some(3), Some(3), Some(3), Some(3)]),
            review([Some(5), Some(4), Some(4), Some(4), Some(4)]),
        ];
        assert_eq!(average_score(&reviews), Some(3.1));
    }

    #[test]
    fn test_validate_score_bounds() {
        assert!(validate_score("overall", 1).is_ok());
        assert!(validate_score("overall", 5).is_ok());
        assert!(validate_score("overall", 0).is_err());
        assert!(validate_score("overall", 6).is_err());
    }

    #[test]
    fn test_is_complete() {
        assert!(is_complete(&review([Some(1), Some(2), Some(3), Some(4), Some(5)])));
        assert!(!is_complete(&review([Some(1), Some(2), Some(3), Some(4), None])));
    }
}
