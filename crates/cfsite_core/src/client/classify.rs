//! Boundary classification of backend failures.
//!
//! # Invariants
//! - Only a missing relation/collection is recoverable.
//! - Everything else is `Fatal` and must reach the caller untouched.

use super::{QueryError, SCHEMA_CACHE_MISS_CODE, UNDEFINED_TABLE_CODE};
use once_cell::sync::Lazy;
use regex::Regex;

static SCHEMA_CACHE_MISS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Could not find the table '[^'.]+\.[^']+' in the schema cache")
        .expect("valid schema cache regex")
});

/// Outcome of inspecting a backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The queried collection does not exist in the current schema.
    RelationAbsent,
    Fatal,
}

/// Classifies a backend error into a recoverable absence or a fatal failure.
pub fn classify(err: &QueryError) -> FailureKind {
    match err.code() {
        Some(UNDEFINED_TABLE_CODE) | Some(SCHEMA_CACHE_MISS_CODE) => FailureKind::RelationAbsent,
        _ if SCHEMA_CACHE_MISS_RE.is_match(&err.message) => FailureKind::RelationAbsent,
        _ => FailureKind::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, FailureKind};
    use crate::client::QueryError;

    #[test]
    fn undefined_table_codes_are_absent() {
        assert_eq!(
            classify(&QueryError::new("42P01", "relation \"site_content\" does not exist")),
            FailureKind::RelationAbsent
        );
        assert_eq!(
            classify(&QueryError::new("PGRST205", "anything")),
            FailureKind::RelationAbsent
        );
    }

    #[test]
    fn schema_cache_message_is_absent_without_code() {
        let err = QueryError::transport(
            "Could not find the table 'public.site_content' in the schema cache",
        );
        assert_eq!(classify(&err), FailureKind::RelationAbsent);
    }

    #[test]
    fn other_errors_are_fatal() {
        assert_eq!(
            classify(&QueryError::new("42501", "permission denied for table site_content")),
            FailureKind::Fatal
        );
        assert_eq!(
            classify(&QueryError::transport("connection reset")),
            FailureKind::Fatal
        );
        assert_eq!(
            classify(&QueryError::transport("Could not find the table 'site_content'")),
            FailureKind::Fatal
        );
    }
}
