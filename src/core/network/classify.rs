//! Ordered failure classification tables
//!
//! Each checker describes its native failure as a small value (kind plus
//! message) and classifies it with a [`ClassificationTable`]: an ordered list
//! of `(predicate, Status)` rules where the first match wins and a fallback
//! status keeps the mapping total. Structured rules come first, text rules
//! last, so tables can be unit-tested with injected fake failures.

use crate::core::network::context::ContextError;
use crate::core::network::types::Status;

/// A native failure as seen by a classifier
pub trait Failure {
    /// Context state captured when the failure happened
    fn context_error(&self) -> Option<ContextError>;
    /// Lower-cased human readable message
    fn message_lower(&self) -> String;
}

pub struct Rule<F> {
    pub name: &'static str,
    pub matches: fn(&F, &str) -> bool,
    pub status: Status,
}

pub struct ClassificationTable<F: 'static> {
    rules: &'static [Rule<F>],
    fallback: Status,
}

impl<F: Failure> ClassificationTable<F> {
    pub const fn new(rules: &'static [Rule<F>], fallback: Status) -> Self {
        Self { rules, fallback }
    }

    /// Classify `failure`; the context rule always runs first
    pub fn classify(&self, failure: &F) -> Status {
        self.classify_with_rule(failure).1
    }

    /// Classify and report which rule matched ("context" or "fallback" for the fixed ends)
    pub fn classify_with_rule(&self, failure: &F) -> (&'static str, Status) {
        if failure.context_error().is_some() {
            return ("context", Status::Timeout);
        }
        let message = failure.message_lower();
        self.rules
            .iter()
            .find(|rule| (rule.matches)(failure, &message))
            .map(|rule| (rule.name, rule.status))
            .unwrap_or(("fallback", self.fallback))
    }
}

/// True when `text` contains any of `needles` (both expected lower-case)
pub fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| !n.is_empty() && text.contains(n))
}
