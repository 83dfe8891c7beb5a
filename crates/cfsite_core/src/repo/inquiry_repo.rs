//! Product inquiry repository.
//!
//! # Responsibility
//! - Persist inquiry form submissions with status `new`.
//! - List and triage inquiries for the admin dashboard.
//!
//! # Invariants
//! - Submissions are validated before any backend call.
//! - List results are newest first and bounded by `INQUIRY_LIST_LIMIT_MAX`.

use crate::client::{Query, QueryClient, Row};
use crate::model::inquiry::{Inquiry, InquiryId, InquiryStatus, NewInquiry};
use crate::repo::{RepoError, RepoResult};
use log::info;
use serde_json::Value;
use uuid::Uuid;

pub const INQUIRIES_COLLECTION: &str = "inquiries";
pub const INQUIRY_STATUS_COLUMN: &str = "status";
pub const INQUIRY_LIST_DEFAULT_LIMIT: u32 = 25;
pub const INQUIRY_LIST_LIMIT_MAX: u32 = 100;

const INQUIRY_COLUMNS: &str =
    "id,name,email,phone,company,product,event_date,message,status,created_at";

pub struct InquiryRepository<C: QueryClient> {
    client: C,
}

impl<C: QueryClient> InquiryRepository<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Validates and stores one inquiry. Returns its new stable id.
    pub async fn submit_inquiry(&self, input: &NewInquiry) -> RepoResult<InquiryId> {
        let inquiry = input.normalized()?;
        let id = Uuid::new_v4();

        let mut row = Row::new();
        row.insert("id".to_string(), Value::String(id.to_string()));
        row.insert("name".to_string(), Value::String(inquiry.name));
        row.insert("email".to_string(), Value::String(inquiry.email));
        row.insert("phone".to_string(), optional_text(inquiry.phone));
        row.insert("company".to_string(), optional_text(inquiry.company));
        row.insert("product".to_string(), optional_text(inquiry.product));
        row.insert("event_date".to_string(), optional_text(inquiry.event_date));
        row.insert("message".to_string(), Value::String(inquiry.message));
        row.insert(
            INQUIRY_STATUS_COLUMN.to_string(),
            Value::String(InquiryStatus::New.as_str().to_string()),
        );

        self.client.insert(INQUIRIES_COLLECTION, &row).await?;
        info!("event=inquiry_submit module=repo status=ok inquiry_id={id}");
        Ok(id)
    }

    /// Lists inquiries, newest first, optionally filtered by status.
    ///
    /// `limit` defaults to 25 and is clamped to 100.
    pub async fn list_inquiries(
        &self,
        status: Option<InquiryStatus>,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Inquiry>> {
        let mut query = Query::select(INQUIRIES_COLLECTION, INQUIRY_COLUMNS)
            .order("created_at", false)
            .limit(normalize_inquiry_limit(limit));
        if let Some(status) = status {
            query = query.eq(INQUIRY_STATUS_COLUMN, status.as_str());
        }

        let rows = self.client.fetch_rows(&query).await?;
        rows.into_iter().map(parse_inquiry_row).collect()
    }

    /// Moves one inquiry to `status`.
    pub async fn set_inquiry_status(&self, id: InquiryId, status: InquiryStatus) -> RepoResult<()> {
        let query = Query::select(INQUIRIES_COLLECTION, "id").eq("id", id.to_string());
        let mut patch = Row::new();
        patch.insert(
            INQUIRY_STATUS_COLUMN.to_string(),
            Value::String(status.as_str().to_string()),
        );

        let changed = self.client.update(&query, &patch).await?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!("event=inquiry_status module=repo status=ok inquiry_id={id} new_status={status}");
        Ok(())
    }
}

/// Applies default and max bounds to an inquiry list limit.
pub fn normalize_inquiry_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => INQUIRY_LIST_DEFAULT_LIMIT,
        Some(value) => value.min(INQUIRY_LIST_LIMIT_MAX),
    }
}

fn optional_text(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::String)
}

fn parse_inquiry_row(row: Row) -> RepoResult<Inquiry> {
    serde_json::from_value::<Inquiry>(Value::Object(row))
        .map_err(|err| RepoError::InvalidData(format!("invalid inquiry row: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{normalize_inquiry_limit, parse_inquiry_row};
    use crate::model::inquiry::InquiryStatus;
    use crate::repo::RepoError;
    use serde_json::json;

    #[test]
    fn normalize_inquiry_limit_applies_default_and_max() {
        assert_eq!(normalize_inquiry_limit(None), 25);
        assert_eq!(normalize_inquiry_limit(Some(0)), 25);
        assert_eq!(normalize_inquiry_limit(Some(7)), 7);
        assert_eq!(normalize_inquiry_limit(Some(500)), 100);
    }

    #[test]
    fn parse_inquiry_row_rejects_unknown_status() {
        let row = json!({
            "id": "5b0e4c4e-8a53-4a3c-9f55-0e2f4b1c8d11",
            "name": "Dana",
            "email": "dana@example.com",
            "message": "hello",
            "status": "new",
        });
        let parsed = parse_inquiry_row(row.as_object().cloned().unwrap()).unwrap();
        assert_eq!(parsed.status, InquiryStatus::New);
        assert_eq!(parsed.phone, None);

        let mut broken = row.as_object().cloned().unwrap();
        broken.insert("status".to_string(), json!("archived"));
        assert!(matches!(
            parse_inquiry_row(broken),
            Err(RepoError::InvalidData(_))
        ));
    }
}
