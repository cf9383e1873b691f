//! SMS notification dispatch
//!
//! Builds one aggregate message per dispatch enumerating every new match and
//! hands it to the SMS provider. Delivery failures are classified so the poll
//! loop can log them distinctly, but no failure here ever stops polling.

use async_trait::async_trait;
use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::client::SlotRecord;

/// Provider-assigned id for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryId(pub String);

/// Errors from a delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("network error sending SMS: {0}")]
    Network(#[from] reqwest::Error),

    #[error("SMS provider rejected credentials (status {0})")]
    Auth(u16),

    #[error("unexpected SMS provider response (status {0})")]
    Unexpected(u16),
}

/// Opaque send primitive for out-of-band notifications.
///
/// The poll loop only needs "send this body once"; the trait seam keeps it
/// testable with a recording fake.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, body: &str) -> Result<DeliveryId, NotifyError>;
}

/// Build one human-readable message enumerating every match.
///
/// One aggregate message per dispatch, never one per match.
pub fn format_message(matches: &[SlotRecord]) -> String {
    let mut message = String::from("Slots available:\n");
    for record in matches {
        match record.start_date {
            Some(date) => {
                message.push_str(&format!(
                    "{} - {} slots - {}\n",
                    record.location, record.open_count, date
                ));
            }
            None => {
                message.push_str(&format!(
                    "{} - {} slots\n",
                    record.location, record.open_count
                ));
            }
        }
    }
    message
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

/// Twilio-backed sender: one form-encoded POST to the Messages endpoint with
/// basic auth.
pub struct TwilioSender {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: Secret<String>,
    from: String,
    to: String,
}

const TWILIO_BASE_URL: &str = "https://api.twilio.com";

impl TwilioSender {
    pub fn new(
        account_sid: String,
        auth_token: Secret<String>,
        from: String,
        to: String,
    ) -> Self {
        Self::with_base_url(TWILIO_BASE_URL, account_sid, auth_token, from, to)
    }

    /// Point the sender at a custom base URL (for testing with a mock server).
    pub fn with_base_url(
        base_url: &str,
        account_sid: String,
        auth_token: Secret<String>,
        from: String,
        to: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            account_sid,
            auth_token,
            from,
            to,
        }
    }
}

#[async_trait]
impl SmsSender for TwilioSender {
    async fn send(&self, body: &str) -> Result<DeliveryId, NotifyError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose()))
            .form(&[("Body", body), ("From", &self.from), ("To", &self.to)])
            .send()
            .await?;

        let status = response.status().as_u16();
        match status {
            200 | 201 => {
                let parsed: TwilioMessageResponse = response.json().await?;
                debug!(sid = %parsed.sid, "SMS accepted by provider");
                Ok(DeliveryId(parsed.sid))
            }
            401 | 403 => Err(NotifyError::Auth(status)),
            other => Err(NotifyError::Unexpected(other)),
        }
    }
}
