//! Manual webhook delivery check.
//!
//! # Responsibility
//! - Build the database-change notification envelope used by the inquiry
//!   notification endpoint.
//! - Deliver it with the shared-secret header and report non-2xx as failure.
//!
//! # Invariants
//! - The secret is only ever sent in `x-webhook-secret`, never logged.

use crate::logging::sanitize_message;
use log::{error, info};
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// HTTP client used for deliveries.
pub use reqwest::Client as HttpClient;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Database-change notification envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub table: String,
    pub schema: String,
    pub record: Value,
}

impl WebhookEnvelope {
    /// Fixed `INSERT` on `public.inquiries` used for manual checks.
    pub fn test_inquiry() -> Self {
        Self {
            kind: "INSERT".to_string(),
            table: "inquiries".to_string(),
            schema: "public".to_string(),
            record: json!({
                "id": "00000000-0000-4000-8000-000000000000",
                "name": "Webhook Test",
                "email": "webhook-test@example.com",
                "phone": null,
                "company": "Test Company",
                "product": "test-product",
                "event_date": null,
                "message": "This is a test inquiry sent by the webhook check.",
                "status": "new",
            }),
        }
    }
}

/// Result of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookDelivery {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    Transport(String),
    /// Endpoint answered outside the 2xx range.
    Rejected {
        status: u16,
        body: String,
    },
}

impl Display for WebhookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "webhook request failed: {message}"),
            Self::Rejected { status, body } => {
                write!(f, "webhook rejected with HTTP {status}: {body}")
            }
        }
    }
}

impl Error for WebhookError {}

/// Posts `envelope` to `endpoint` with the shared secret header.
pub async fn send_webhook(
    client: &Client,
    endpoint: &Url,
    secret: &SecretString,
    envelope: &WebhookEnvelope,
) -> Result<WebhookDelivery, WebhookError> {
    info!(
        "event=webhook_send module=webhook status=start host={} table={}",
        endpoint.host_str().unwrap_or("unknown"),
        envelope.table
    );

    let response = client
        .post(endpoint.clone())
        .header(WEBHOOK_SECRET_HEADER, secret.expose_secret())
        .json(envelope)
        .send()
        .await
        .map_err(|err| WebhookError::Transport(err.to_string()))?;

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    if (200..300).contains(&status) {
        info!("event=webhook_send module=webhook status=ok http_status={status}");
        return Ok(WebhookDelivery { status, body });
    }

    let body = sanitize_message(&body, MAX_ERROR_BODY_CHARS);
    error!("event=webhook_send module=webhook status=error http_status={status}");
    Err(WebhookError::Rejected { status, body })
}
