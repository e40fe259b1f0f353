//! A client for Stripe's payment intents API and its webhook signature scheme.
//!
//! Intents are created with a form-encoded `POST /v1/payment_intents`, authenticated with the secret key as a bearer
//! token. Webhooks carry a `Stripe-Signature: t=<unix time>,v1=<hex>` header, where `v1` is the HMAC-SHA256 of
//! `"{t}.{raw body}"` under the endpoint's signing secret.
use std::time::Duration;

use chrono::Utc;
use gs_common::{MinorUnits, Secret};
use log::*;
use serde::Deserialize;

use super::{
    ClientHandle,
    IntentRequest,
    PaymentGateway,
    PaymentGatewayError,
    PaymentIntent,
    SignatureError,
    SignedPayload,
};
use crate::helpers::{hmac_sha256_hex, verify_hmac_sha256_hex};

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub publishable_key: String,
    pub webhook_secret: Secret<String>,
    /// Maximum age, in seconds, of a webhook signature timestamp.
    pub tolerance_secs: i64,
}

impl StripeConfig {
    pub fn new<S: Into<String>>(secret_key: Secret<String>, publishable_key: S, webhook_secret: Secret<String>) -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key,
            publishable_key: publishable_key.into(),
            webhook_secret,
            tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        }
    }

    pub fn with_api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_tolerance(mut self, secs: i64) -> Self {
        self.tolerance_secs = secs;
        self
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentGatewayError> {
        if config.secret_key.is_empty() {
            return Err(PaymentGatewayError::Configuration("The Stripe secret key is not set".into()));
        }
        if config.webhook_secret.is_empty() {
            return Err(PaymentGatewayError::Configuration("The Stripe webhook signing secret is not set".into()));
        }
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    /// Produces a signature header for `body`, exactly as Stripe would at time `timestamp`.
    pub fn sign_payload(&self, body: &[u8], timestamp: i64) -> String {
        let sig = hmac_sha256_hex(self.config.webhook_secret.reveal().as_bytes(), &signed_message(timestamp, body));
        format!("t={timestamp},v1={sig}")
    }
}

fn signed_message(timestamp: i64, body: &[u8]) -> Vec<u8> {
    let mut message = format!("{timestamp}.").into_bytes();
    message.extend_from_slice(body);
    message
}

/// Splits `t=..,v1=..,v1=..` into the timestamp and every `v1` signature. Other schemes are ignored.
fn parse_signature_header(header: &str) -> Result<(i64, Vec<&str>), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            return Err(SignatureError::Malformed(format!("unexpected element '{part}'")));
        };
        match key.trim() {
            "t" => {
                let t = value.trim().parse::<i64>().map_err(|e| SignatureError::Malformed(e.to_string()))?;
                timestamp = Some(t);
            },
            "v1" => signatures.push(value.trim()),
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or_else(|| SignatureError::Malformed("no timestamp".into()))?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed("no v1 signature".into()));
    }
    Ok((timestamp, signatures))
}

impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, PaymentGatewayError> {
        let url = format!("{}/v1/payment_intents", self.config.api_url.trim_end_matches('/'));
        let form = [
            ("amount", request.amount.value().to_string()),
            ("currency", request.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[order_id]", request.metadata.order_id.to_string()),
            ("metadata[user_id]", request.metadata.user_id.clone()),
        ];
        trace!("🪝️ Creating payment intent for order {}", request.metadata.order_id);
        let response =
            self.client.post(url).bearer_auth(self.config.secret_key.reveal()).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
            warn!("🪝️ Stripe rejected the payment intent for {}: {status} {message}", request.metadata.order_id);
            return Err(PaymentGatewayError::Rejected { status: status.as_u16(), message });
        }
        let intent = response.json::<IntentResponse>().await?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentGatewayError::InvalidResponse(format!("Payment intent {} has no client secret", intent.id))
        })?;
        debug!("🪝️ Stripe payment intent {} created ({})", intent.id, intent.status);
        Ok(PaymentIntent {
            id: intent.id,
            client_handle: ClientHandle::ClientSecret(client_secret),
            amount: MinorUnits::from(intent.amount),
            currency: intent.currency,
            status: intent.status,
        })
    }

    fn verify_signature(&self, payload: SignedPayload<'_>, signature: &str) -> Result<(), SignatureError> {
        if signature.trim().is_empty() {
            return Err(SignatureError::Missing);
        }
        let (timestamp, candidates) = parse_signature_header(signature)?;
        let age = Utc::now()
            .timestamp()
            .checked_sub(timestamp)
            .ok_or_else(|| SignatureError::Malformed(format!("timestamp {timestamp} is out of range")))?;
        if age.unsigned_abs() > self.config.tolerance_secs.unsigned_abs() {
            return Err(SignatureError::Expired { age });
        }
        let message = signed_message(timestamp, payload.body);
        let secret = self.config.webhook_secret.reveal().as_bytes();
        if candidates.iter().any(|sig| verify_hmac_sha256_hex(secret, &message, sig)) {
            Ok(())
        } else {
            Err(SignatureError::Invalid)
        }
    }

    fn public_key(&self) -> String {
        self.config.publishable_key.clone()
    }

    fn signature_header(&self) -> &str {
        "Stripe-Signature"
    }
}
