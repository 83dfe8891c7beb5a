//! Data-access core for the site and its admin dashboard.
//! Repositories here are the only code that talks to the backend.

pub mod client;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;
pub mod settings;
pub mod webhook;

pub use client::rest::{RestConfig, RestQueryClient};
pub use client::sqlite::SqliteQueryClient;
pub use client::{classify, FailureKind, Query, QueryClient, QueryError, QueryResult, Row};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::content::{ContentKey, ContentPayload};
pub use model::dashboard::DashboardStats;
pub use model::inquiry::{
    Inquiry, InquiryId, InquiryStatus, InquiryValidationError, NewInquiry,
};
pub use repo::content_repo::ContentRepository;
pub use repo::dashboard_repo::DashboardRepository;
pub use repo::inquiry_repo::InquiryRepository;
pub use repo::{RepoError, RepoResult};
pub use service::site_service::{SiteError, SiteService};
pub use session::{
    AbsenceCache, MemorySessionStore, SessionAbsenceCache, SessionStore,
    CONTENT_UNAVAILABLE_SESSION_KEY,
};
pub use settings::{BackendKind, Settings, SettingsError};
pub use webhook::{send_webhook, WebhookDelivery, WebhookEnvelope, WebhookError};

/// Minimal health-check API for wiring checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
