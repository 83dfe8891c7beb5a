//! Repository layer over the query client.
//!
//! # Responsibility
//! - Define use-case oriented data access for content, dashboard and inquiries.
//! - Isolate backend query shapes from callers.
//!
//! # Invariants
//! - Backend errors reach callers unchanged inside `RepoError::Backend`,
//!   except the recoverable absence handled by the content repository.
//! - Inquiry writes enforce `NewInquiry::normalized()` before any query.
//!
//! # See also
//! - docs/architecture/backend.md

use crate::client::QueryError;
use crate::model::inquiry::{InquiryId, InquiryValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod content_repo;
pub mod dashboard_repo;
pub mod inquiry_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for site data access.
#[derive(Debug)]
pub enum RepoError {
    Backend(QueryError),
    Validation(InquiryValidationError),
    NotFound(InquiryId),
    InvalidData(String),
}

impl RepoError {
    /// Backend error code, when the failure came from the backend.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Backend(err) => err.code(),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "inquiry not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid backend data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<QueryError> for RepoError {
    fn from(value: QueryError) -> Self {
        Self::Backend(value)
    }
}

impl From<InquiryValidationError> for RepoError {
    fn from(value: InquiryValidationError) -> Self {
        Self::Validation(value)
    }
}
