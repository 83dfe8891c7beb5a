//! Backend selection and repository factory.
//!
//! # Invariants
//! - Every repository handed out by one `SiteService` shares the same query
//!   client and the same session store, so the content absence flag survives
//!   across repository instances for the life of the service.

use crate::client::rest::RestQueryClient;
use crate::client::sqlite::SqliteQueryClient;
use crate::client::{QueryClient, QueryError};
use crate::db::DbError;
use crate::repo::content_repo::ContentRepository;
use crate::repo::dashboard_repo::DashboardRepository;
use crate::repo::inquiry_repo::InquiryRepository;
use crate::session::{MemorySessionStore, SessionAbsenceCache};
use crate::settings::{BackendKind, Settings, SettingsError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Query client shared between repositories.
pub type SharedClient = Arc<dyn QueryClient>;
/// Absence cache backed by the service session.
pub type SessionCache = SessionAbsenceCache<Arc<MemorySessionStore>>;

#[derive(Debug)]
pub enum SiteError {
    Settings(SettingsError),
    Db(DbError),
    Backend(QueryError),
}

impl Display for SiteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settings(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SiteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Settings(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<SettingsError> for SiteError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<DbError> for SiteError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<QueryError> for SiteError {
    fn from(value: QueryError) -> Self {
        Self::Backend(value)
    }
}

/// Entry point handing out repositories over one backend session.
pub struct SiteService {
    client: SharedClient,
    session: Arc<MemorySessionStore>,
}

impl SiteService {
    /// Connects the backend selected in `settings`.
    pub fn connect(settings: &Settings) -> Result<Self, SiteError> {
        let client: SharedClient = match settings.backend.kind {
            BackendKind::Rest => {
                let config = settings.rest_config()?;
                info!(
                    "event=backend_connect module=service status=ok kind=rest host={}",
                    config.project_url.host_str().unwrap_or("unknown")
                );
                Arc::new(RestQueryClient::new(config)?)
            }
            BackendKind::Sqlite => {
                let path = settings.sqlite_path();
                let client = SqliteQueryClient::open(&path)?;
                info!(
                    "event=backend_connect module=service status=ok kind=sqlite path={}",
                    path.display()
                );
                Arc::new(client)
            }
        };

        Ok(Self::from_client(client))
    }

    /// Wraps an existing client with a fresh session.
    pub fn from_client(client: SharedClient) -> Self {
        Self {
            client,
            session: Arc::new(MemorySessionStore::new()),
        }
    }

    pub fn content(&self) -> ContentRepository<SharedClient, SessionCache> {
        ContentRepository::new(
            Arc::clone(&self.client),
            SessionAbsenceCache::for_site_content(Arc::clone(&self.session)),
        )
    }

    pub fn dashboard(&self) -> DashboardRepository<SharedClient> {
        DashboardRepository::new(Arc::clone(&self.client))
    }

    pub fn inquiries(&self) -> InquiryRepository<SharedClient> {
        InquiryRepository::new(Arc::clone(&self.client))
    }
}
