//! Domain model for site content, dashboard statistics and inquiries.
//!
//! # Responsibility
//! - Define the typed records exchanged between repositories and callers.
//! - Keep backend row shapes (`serde` field names) next to their types.
//!
//! # Invariants
//! - Inquiries are identified by a stable `InquiryId` assigned at submission.
//! - Dashboard counts are non-negative by construction.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod content;
pub mod dashboard;
pub mod inquiry;
