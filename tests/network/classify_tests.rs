use netpath::core::network::classify::{contains_any, ClassificationTable, Failure, Rule};
use netpath::core::network::{ContextError, Status};

/// Injected failure for exercising rule ordering
struct FakeFailure {
    code: u8,
    message: &'static str,
    context: Option<ContextError>,
}

impl FakeFailure {
    fn new(code: u8, message: &'static str) -> Self {
        Self {
            code,
            message,
            context: None,
        }
    }
}

impl Failure for FakeFailure {
    fn context_error(&self) -> Option<ContextError> {
        self.context
    }

    fn message_lower(&self) -> String {
        self.message.to_lowercase()
    }
}

static RULES: &[Rule<FakeFailure>] = &[
    Rule {
        name: "structured_refused",
        matches: |f, _| f.code == 1,
        status: Status::ConnectionRefused,
    },
    Rule {
        name: "text_timeout",
        matches: |_, m| contains_any(m, &["timed out", "timeout"]),
        status: Status::Timeout,
    },
    Rule {
        name: "text_refused",
        matches: |_, m| m.contains("refused"),
        status: Status::ConnectionRefused,
    },
];

static TABLE: ClassificationTable<FakeFailure> = ClassificationTable::new(RULES, Status::Invalid);

#[test]
fn test_structured_rule_beats_text_rule() {
    let failure = FakeFailure::new(1, "operation timed out");
    assert_eq!(
        TABLE.classify_with_rule(&failure),
        ("structured_refused", Status::ConnectionRefused)
    );
}

#[test]
fn test_first_matching_text_rule_wins() {
    let failure = FakeFailure::new(0, "Refused after TIMEOUT");
    assert_eq!(TABLE.classify_with_rule(&failure), ("text_timeout", Status::Timeout));
}

#[test]
fn test_context_error_is_checked_first() {
    let mut failure = FakeFailure::new(1, "connection refused");
    failure.context = Some(ContextError::Cancelled);
    assert_eq!(TABLE.classify_with_rule(&failure), ("context", Status::Timeout));
}

#[test]
fn test_unmatched_failure_uses_fallback() {
    let failure = FakeFailure::new(0, "something odd happened");
    assert_eq!(TABLE.classify_with_rule(&failure), ("fallback", Status::Invalid));
    assert_eq!(TABLE.classify(&failure), Status::Invalid);
}

#[test]
fn test_contains_any_ignores_empty_needles() {
    assert!(!contains_any("anything", &[""]));
    assert!(contains_any("no such host", &["nxdomain", "no such host"]));
}
