//! HTTP client for the Odd 2 web API.
//!
//! Payment collection itself happens on the backend; the client only ever
//! talks to the site's own endpoints. The initiation endpoint answers
//! HTTP 400 with a regular JSON body on business failures, so bodies are
//! parsed regardless of status code.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

// ─────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct InitiateRequest {
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
pub struct InitiateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Payment status reported by `/api/check-payment/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    /// Any status string we don't recognise (`not_found`, future additions).
    /// Treated like `pending`: the attempt budget decides when to give up.
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// `completed` and `failed` end the polling loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: PaymentStatus,
}

/// Acknowledgement shape shared by the demo-payment and admin endpoints.
#[derive(Debug, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Payload of `/api/countdown`: time remaining until the next prediction
/// update, pre-split by the server, plus a display label for the slot.
#[derive(Debug, Clone, Deserialize)]
pub struct CountdownResponse {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub total_seconds: u64,
    pub next_update: String,
}

// ─────────────────────────────────────────────────────────
// API seam
// ─────────────────────────────────────────────────────────

/// The slice of the Odd 2 web API the client consumes.
///
/// The payment flow takes this as an injected dependency, so the state
/// machine can be driven by scripted responses in tests.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// POST `/api/initiate-payment`.
    async fn initiate_payment(&self, phone_number: &str) -> Result<InitiateResponse>;

    /// GET `/api/check-payment/{transaction_id}`.
    async fn check_payment(&self, transaction_id: &str) -> Result<PaymentStatus>;

    /// POST `/api/demo-payment`.
    async fn demo_payment(&self) -> Result<AckResponse>;

    /// POST `/admin/generate-predictions`.
    async fn generate_predictions(&self) -> Result<AckResponse>;

    /// GET `/api/countdown`.
    async fn fetch_countdown(&self) -> Result<CountdownResponse>;
}

/// Production implementation backed by a shared [`reqwest::Client`].
pub struct HttpPaymentApi {
    client: Client,
    base_url: String,
}

impl HttpPaymentApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST without a body and decode the shared acknowledgement shape.
    async fn post_ack(&self, path: &str) -> Result<AckResponse> {
        let text = self.client.post(self.url(path)).send().await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl PaymentApi for HttpPaymentApi {
    async fn initiate_payment(&self, phone_number: &str) -> Result<InitiateResponse> {
        let body = InitiateRequest {
            phone_number: phone_number.to_string(),
        };
        let text = self
            .client
            .post(self.url("/api/initiate-payment"))
            .json(&body)
            .send()
            .await?
            .text()
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn check_payment(&self, transaction_id: &str) -> Result<PaymentStatus> {
        let text = self
            .client
            .get(self.url(&format!("/api/check-payment/{transaction_id}")))
            .send()
            .await?
            .text()
            .await?;
        let body: StatusResponse = serde_json::from_str(&text)?;
        Ok(body.status)
    }

    async fn demo_payment(&self) -> Result<AckResponse> {
        self.post_ack("/api/demo-payment").await
    }

    async fn generate_predictions(&self) -> Result<AckResponse> {
        self.post_ack("/admin/generate-predictions").await
    }

    async fn fetch_countdown(&self) -> Result<CountdownResponse> {
        let resp = self.client.get(self.url("/api/countdown")).send().await?;
        Ok(resp.json().await?)
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
