use std::sync::LazyLock;

use regex::Regex;

use crate::models::{BookFields, CancelFields, FieldSet, Intent, RescheduleFields};
use crate::services::dialogue::{is_terminal, COMPLETION_MARKER};

static FIELD_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]\s*)?([A-Za-z][A-Za-z ]*?)\s*:\s*(.*?)\s*$").expect("valid field line regex")
});
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d{1,2}:\d{2}\s*[ap]m$").expect("valid time regex"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("the reply has no \"All details received:\" line")]
    MissingMarker,

    #[error("the reply has text before the \"All details received:\" line")]
    UnexpectedPreamble,

    #[error("the \"All details received:\" line must be plain text on its own line, without formatting")]
    MalformedMarker,

    #[error("missing or malformed field: {field}")]
    MissingOrMalformed { field: &'static str },
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Text,
    Date,
    Time,
}

struct FieldRule {
    field: &'static str,
    label: &'static str,
    shape: Shape,
}

const fn rule(field: &'static str, label: &'static str, shape: Shape) -> FieldRule {
    FieldRule { field, label, shape }
}

const BOOK_LAYOUT: &[FieldRule] = &[
    rule("name", "name", Shape::Text),
    rule("email", "email", Shape::Text),
    rule("reason", "reason", Shape::Text),
    rule("date", "date", Shape::Date),
    rule("time", "time", Shape::Time),
];

const CANCEL_LAYOUT: &[FieldRule] = &[
    rule("name", "name", Shape::Text),
    rule("email", "email", Shape::Text),
    rule("date", "date", Shape::Date),
    rule("time", "time", Shape::Time),
];

const RESCHEDULE_LAYOUT: &[FieldRule] = &[
    rule("name", "name", Shape::Text),
    rule("email", "email", Shape::Text),
    rule("old_date", "previous date", Shape::Date),
    rule("old_time", "previous time", Shape::Time),
    rule("new_date", "new date", Shape::Date),
    rule("new_time", "new time", Shape::Time),
];

fn layout(intent: Intent) -> &'static [FieldRule] {
    match intent {
        Intent::Book => BOOK_LAYOUT,
        Intent::Cancel => CANCEL_LAYOUT,
        Intent::Reschedule => RESCHEDULE_LAYOUT,
    }
}

pub fn extract(intent: Intent, text: &str) -> Result<FieldSet, ExtractionError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    match lines.next() {
        Some(first) if is_marker_line(first) => {}
        Some(first) if is_terminal(first) => return Err(ExtractionError::MalformedMarker),
        _ if is_terminal(text) => return Err(ExtractionError::UnexpectedPreamble),
        _ => return Err(ExtractionError::MissingMarker),
    }

    let mut values = Vec::with_capacity(layout(intent).len());
    for rule in layout(intent) {
        let value = lines
            .next()
            .and_then(|line| parse_field_line(line, rule))
            .ok_or(ExtractionError::MissingOrMalformed { field: rule.field })?;
        values.push(value);
    }

    Ok(assemble(intent, values))
}

fn is_marker_line(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(COMPLETION_MARKER)
}

fn parse_field_line(line: &str, rule: &FieldRule) -> Option<String> {
    let caps = FIELD_LINE_RE.captures(line)?;
    let label = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
    if !label.eq_ignore_ascii_case(rule.label) {
        return None;
    }

    let value = caps[2].trim();
    let ok = match rule.shape {
        Shape::Text => !value.is_empty(),
        Shape::Date => DATE_RE.is_match(value),
        Shape::Time => TIME_RE.is_match(value),
    };
    ok.then(|| value.to_string())
}

fn assemble(intent: Intent, values: Vec<String>) -> FieldSet {
    let mut v = values.into_iter();
    let mut next = || v.next().unwrap_or_default();
    match intent {
        Intent::Book => FieldSet::Book(BookFields {
            name: next(),
            email: next(),
            reason: next(),
            date: next(),
            time: next(),
        }),
        Intent::Cancel => FieldSet::Cancel(CancelFields {
            name: next(),
            email: next(),
            date: next(),
            time: next(),
        }),
        Intent::Reschedule => FieldSet::Reschedule(RescheduleFields {
            name: next(),
            email: next(),
            old_date: next(),
            old_time: next(),
            new_date: next(),
            new_time: next(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK_REPLY: &str = "All details received:\n\
        - Name: Priya Sharma\n\
        - Email: priya@example.com\n\
        - Reason: Root Canal\n\
        - Date: 2025-07-28\n\
        - Time: 02:00 PM\n\
        ✅ Your appointment has been booked. Thank you!";

    #[test]
    fn test_extract_book() {
        let fields = extract(Intent::Book, BOOK_REPLY).unwrap();
        assert_eq!(
            fields,
            FieldSet::Book(BookFields {
                name: "Priya Sharma".to_string(),
                email: "priya@example.com".to_string(),
                reason: "Root Canal".to_string(),
                date: "2025-07-28".to_string(),
                time: "02:00 PM".to_string(),
            })
        );
        assert_eq!(fields.intent(), Intent::Book);
    }

    #[test]
    fn test_extract_tolerates_case_and_bullets() {
        let reply = "\n  ALL DETAILS RECEIVED:  \n\
            name: Jo\n\
            * EMAIL : jo@example.com\n\
            - date: 2025-07-22\n\
            -   Time:   9:00am\n";
        let fields = extract(Intent::Cancel, reply).unwrap();
        let FieldSet::Cancel(c) = fields else {
            panic!("expected cancel fields");
        };
        assert_eq!(c.name, "Jo");
        assert_eq!(c.email, "jo@example.com");
        assert_eq!(c.time, "9:00am");
    }

    #[test]
    fn test_extract_reschedule() {
        let reply = "All details received:\n\
            - Name: Jane Smith\n\
            - Email: jane@example.com\n\
            - Previous Date: 2025-07-22\n\
            - Previous Time: 3:00 PM\n\
            - New Date: 2025-07-25\n\
            - New Time: 4:00 PM";
        let FieldSet::Reschedule(r) = extract(Intent::Reschedule, reply).unwrap() else {
            panic!("expected reschedule fields");
        };
        assert_eq!(r.old_date, "2025-07-22");
        assert_eq!(r.old_time, "3:00 PM");
        assert_eq!(r.new_date, "2025-07-25");
        assert_eq!(r.new_time, "4:00 PM");
    }

    #[test]
    fn test_missing_email_fails_whole_extraction() {
        let reply = "All details received:\n\
            - Name: Priya Sharma\n\
            - Reason: Root Canal\n\
            - Date: 2025-07-28\n\
            - Time: 02:00 PM";
        assert_eq!(
            extract(Intent::Book, reply),
            Err(ExtractionError::MissingOrMalformed { field: "email" })
        );
    }

    #[test]
    fn test_reordered_fields_rejected() {
        let reply = "All details received:\n\
            - Email: jo@example.com\n\
            - Name: Jo\n\
            - Date: 2025-07-22\n\
            - Time: 9:00 AM";
        assert_eq!(
            extract(Intent::Cancel, reply),
            Err(ExtractionError::MissingOrMalformed { field: "name" })
        );
    }

    #[test]
    fn test_malformed_date_and_time() {
        let reply = "All details received:\n\
            - Name: Jo\n\
            - Email: jo@example.com\n\
            - Date: 22nd July 2025\n\
            - Time: 9:00 AM";
        assert_eq!(
            extract(Intent::Cancel, reply),
            Err(ExtractionError::MissingOrMalformed { field: "date" })
        );

        let reply = "All details received:\n\
            - Name: Jo\n\
            - Email: jo@example.com\n\
            - Date: 2025-07-22\n\
            - Time: 14:00";
        assert_eq!(
            extract(Intent::Cancel, reply),
            Err(ExtractionError::MissingOrMalformed { field: "time" })
        );
    }

    #[test]
    fn test_empty_value_rejected() {
        let reply = "All details received:\n- Name:\n- Email: jo@example.com";
        assert_eq!(
            extract(Intent::Cancel, reply),
            Err(ExtractionError::MissingOrMalformed { field: "name" })
        );
    }

    #[test]
    fn test_preamble_rejected() {
        let reply = "Great, thanks!\nAll details received:\n\
            - Name: Jo\n\
            - Email: jo@example.com\n\
            - Date: 2025-07-22\n\
            - Time: 9:00 AM";
        assert_eq!(
            extract(Intent::Cancel, reply),
            Err(ExtractionError::UnexpectedPreamble)
        );
    }

    #[test]
    fn test_decorated_marker_is_not_a_preamble() {
        let text = "**All details received:**\n- Name: Jane Smith\n- Email: jane@example.com\n- Date: 2025-07-22\n- Time: 3:00 PM";
        assert_eq!(
            extract(Intent::Cancel, text),
            Err(ExtractionError::MalformedMarker)
        );

        let text = "Thanks!\n**All details received:**\n- Name: Jane Smith";
        assert_eq!(
            extract(Intent::Cancel, text),
            Err(ExtractionError::UnexpectedPreamble)
        );
    }

    #[test]
    fn test_no_marker() {
        assert_eq!(
            extract(Intent::Book, "What's your email address?"),
            Err(ExtractionError::MissingMarker)
        );
    }

    #[test]
    fn test_wrong_intent_layout_fails() {
        // A cancel-shaped block is missing the reason a booking needs.
        let reply = "All details received:\n\
            - Name: Jo\n\
            - Email: jo@example.com\n\
            - Date: 2025-07-22\n\
            - Time: 9:00 AM";
        assert_eq!(
            extract(Intent::Book, reply),
            Err(ExtractionError::MissingOrMalformed { field: "reason" })
        );
    }
}
