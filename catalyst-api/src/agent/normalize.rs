//! Normalization of free-text ticket fields emitted by the analyzer

use catalyst_common::models::Priority;
use chrono::NaiveDate;
use serde_json::Value;

/// Deadline formats, tried in order; the first that parses wins
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m-%d-%Y", "%m/%d/%Y", "%d-%m-%Y", "%d/%m/%Y",
];

/// Map free-text priority onto the five stored levels
///
/// Absent → medium, empty → none, unrecognized → medium.
pub fn normalize_priority(raw: Option<&str>) -> Priority {
    let Some(raw) = raw else {
        return Priority::Medium;
    };

    match raw.trim().to_lowercase().as_str() {
        "urgent" | "critical" | "p0" | "p1" => Priority::Urgent,
        "high" | "p2" | "important" => Priority::High,
        "medium" | "p3" | "normal" => Priority::Medium,
        "low" | "p4" | "minor" => Priority::Low,
        "none" | "" => Priority::None,
        _ => Priority::Medium,
    }
}

/// Parse a deadline in any accepted format; unparseable → `None`
pub fn parse_deadline(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Batch index named by a `ticket:N` reference
pub fn dependency_index(reference: &Value) -> Option<usize> {
    let text = reference.as_str()?;
    if !text.starts_with("ticket:") {
        return None;
    }
    text.split(':').nth(1)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_synonyms() {
        let cases = [
            ("urgent", Priority::Urgent),
            ("Critical", Priority::Urgent),
            ("P0", Priority::Urgent),
            ("p1", Priority::Urgent),
            ("HIGH", Priority::High),
            ("p2", Priority::High),
            ("important", Priority::High),
            ("medium", Priority::Medium),
            ("p3", Priority::Medium),
            ("normal", Priority::Medium),
            ("low", Priority::Low),
            ("p4", Priority::Low),
            (" minor ", Priority::Low),
            ("none", Priority::None),
            ("", Priority::None),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_priority(Some(raw)), expected, "input {:?}", raw);
        }
    }

    #[test]
    fn test_priority_is_total() {
        assert_eq!(normalize_priority(None), Priority::Medium);
        assert_eq!(normalize_priority(Some("whenever")), Priority::Medium);
        assert_eq!(normalize_priority(Some("🔥")), Priority::Medium);
        assert_eq!(normalize_priority(Some("p5")), Priority::Medium);
    }

    #[test]
    fn test_deadline_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert_eq!(parse_deadline(Some("2025-03-01")), expected);
        assert_eq!(parse_deadline(Some("2025/03/01")), expected);
        assert_eq!(parse_deadline(Some("03-01-2025")), expected);
        assert_eq!(parse_deadline(Some(" 03/01/2025 ")), expected);
    }

    #[test]
    fn test_deadline_month_first_wins_when_ambiguous() {
        // 04/05/2025 reads as April 5 because month-first formats come first
        assert_eq!(parse_deadline(Some("04/05/2025")), NaiveDate::from_ymd_opt(2025, 4, 5));
        // 25/12/2025 only parses day-first
        assert_eq!(parse_deadline(Some("25/12/2025")), NaiveDate::from_ymd_opt(2025, 12, 25));
    }

    #[test]
    fn test_deadline_garbage_is_none() {
        assert_eq!(parse_deadline(None), None);
        assert_eq!(parse_deadline(Some("")), None);
        assert_eq!(parse_deadline(Some("next friday")), None);
        assert_eq!(parse_deadline(Some("2025-02-30")), None);
    }

    #[test]
    fn test_dependency_index() {
        assert_eq!(dependency_index(&json!("ticket:0")), Some(0));
        assert_eq!(dependency_index(&json!("ticket: 3")), Some(3));
        assert_eq!(dependency_index(&json!("ticket:x")), None);
        assert_eq!(dependency_index(&json!("task:1")), None);
        assert_eq!(dependency_index(&json!(1)), None);
        assert_eq!(dependency_index(&Value::Null), None);
    }
}
