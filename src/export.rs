//! Flat CSV export of all submissions with denormalized author and payment
//! columns.

use crate::db::models::ExportRow;

const HEADER: &str = "reference,title,theme,sub_theme,presentation_type,status,author_name,author_email,co_authors,payment_amount,payment_verified,created_at";

pub fn submissions_csv(rows: &[ExportRow]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for row in rows {
        let fields = [
            escape(&row.reference),
            escape(&row.title),
            escape(&row.theme),
            escape(&row.sub_theme),
            escape(&row.presentation_type),
            escape(&row.status),
            escape(&row.author_name),
            escape(&row.author_email),
            row.co_author_count.to_string(),
            row.amount.map(|a| a.to_string()).unwrap_or_default(),
            row.payment_verified
                .map(|v| v.to_string())
                .unwrap_or_default(),
            row.created_at.to_rfc3339(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// RFC 4180 quoting: fields containing commas, quotes, or line breaks are
/// wrapped in double quotes with inner quotes doubled.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(title: &str) -> ExportRow {
        ExportRow {
            reference: "20260115_ab12cd34".to_string(),
            title: title.to_string(),
            theme: "Health Sciences".to_string(),
            sub_theme: "Public Health".to_string(),
            presentation_type: "Oral".to_string(),
            status: "pending".to_string(),
            author_name: "Amina Diallo".to_string(),
            author_email: "amina@example.org".to_string(),
            co_author_count: 2,
            amount: Some(150.0),
            payment_verified: Some(false),
            created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_header_and_row_count() {
        let csv = submissions_csv(&[row("A"), row("B")]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("reference,title,"));
    }

    #[test]
    fn test_commas_and_quotes_are_escaped() {
        let csv = submissions_csv(&[row("Salt, \"Water\" and Fire")]);
        assert!(csv.contains("\"Salt, \"\"Water\"\" and Fire\""));
    }

    #[test]
    fn test_missing_payment_leaves_fields_empty() {
        let mut r = row("A");
        r.amount = None;
        r.payment_verified = None;
        let csv = submissions_csv(&[r]);
        let data_line = csv.lines().nth(1).unwrap();
        assert!(data_line.contains(",,"));
    }

    #[test]
    fn test_plain_fields_are_not_quoted() {
        let csv = submissions_csv(&[row("Plain Title")]);
        assert!(csv.contains(",Plain Title,"));
    }
}
