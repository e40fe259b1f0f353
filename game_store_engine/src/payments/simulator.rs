//! A deterministic, offline stand-in for a card payment provider.
//!
//! Intents get provider-shaped ids (`order_<28 hex>`) and simulated payments get `pay_<28 hex>`, all derived by
//! HMAC from the shared secret, so the same order always maps to the same ids. Callbacks are signed with
//! HMAC-SHA256 over `"{provider_order_id}|{payment_id}"` and the signature travels hex-encoded in a header.
//!
//! Failure callbacks carry no payment id. A success notification without one is rejected, so a signed failure
//! cannot be replayed as a success.
use gs_common::Secret;
use log::*;

use super::{
    events::{PaymentEvent, PaymentEventKind, EVENT_PAYMENT_FAILED, EVENT_PAYMENT_SUCCEEDED},
    ClientHandle,
    IntentRequest,
    PaymentGateway,
    PaymentGatewayError,
    PaymentIntent,
    SignatureError,
    SignedPayload,
};
use crate::{
    db_types::OrderId,
    helpers::{hmac_sha256_hex, verify_hmac_sha256_hex},
};

pub const DEFAULT_SIMULATOR_KEY_ID: &str = "rzp_test_dummy_key";
pub const DEFAULT_SIMULATOR_SECRET: &str = "dummy_secret_key_for_testing";
const ID_HEX_LEN: usize = 28;

/// A signed notification, ready to be posted to the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedCallback {
    pub payload: String,
    pub signature: String,
}

#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    key_id: String,
    secret: Secret<String>,
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATOR_KEY_ID, Secret::new(DEFAULT_SIMULATOR_SECRET.to_string()))
    }
}

impl SimulatedGateway {
    pub fn new<S: Into<String>>(key_id: S, secret: Secret<String>) -> Self {
        Self { key_id: key_id.into(), secret }
    }

    fn derive_id(&self, prefix: &str, label: &str, subject: &str) -> String {
        let digest = hmac_sha256_hex(self.secret.reveal().as_bytes(), format!("{label}:{subject}").as_bytes());
        format!("{prefix}_{}", &digest[..ID_HEX_LEN])
    }

    /// The provider order id issued for one of our orders.
    pub fn provider_order_id(&self, order_id: &OrderId) -> String {
        self.derive_id("order", "intent", order_id.as_str())
    }

    /// The payment id a successful payment against `provider_order_id` receives.
    pub fn payment_id(&self, provider_order_id: &str) -> String {
        self.derive_id("pay", "payment", provider_order_id)
    }

    pub fn sign(&self, provider_order_id: &str, payment_id: &str) -> String {
        hmac_sha256_hex(self.secret.reveal().as_bytes(), canonical_message(provider_order_id, payment_id).as_bytes())
    }

    /// Manufactures the signed notification the provider would send after a successful payment.
    pub fn simulate_success(&self, provider_order_id: &str, order_id: &OrderId) -> SimulatedCallback {
        let payment_id = self.payment_id(provider_order_id);
        let event = PaymentEvent::new(EVENT_PAYMENT_SUCCEEDED, provider_order_id, Some(&payment_id), order_id);
        let signature = self.sign(provider_order_id, &payment_id);
        info!("🪝️ Simulated a successful payment {payment_id} for {provider_order_id}");
        SimulatedCallback { payload: to_payload(&event), signature }
    }

    /// Manufactures the signed notification the provider would send after a declined payment.
    pub fn simulate_failure(&self, provider_order_id: &str, order_id: &OrderId) -> SimulatedCallback {
        let event = PaymentEvent::new(EVENT_PAYMENT_FAILED, provider_order_id, None, order_id);
        let signature = self.sign(provider_order_id, "");
        info!("🪝️ Simulated a failed payment for {provider_order_id}");
        SimulatedCallback { payload: to_payload(&event), signature }
    }
}

fn canonical_message(provider_order_id: &str, payment_id: &str) -> String {
    format!("{provider_order_id}|{payment_id}")
}

fn to_payload(event: &PaymentEvent) -> String {
    // Plain structs of strings always serialize.
    serde_json::to_string(event).unwrap_or_default()
}

impl PaymentGateway for SimulatedGateway {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, PaymentGatewayError> {
        if request.amount.value() <= 0 {
            return Err(PaymentGatewayError::Rejected {
                status: 400,
                message: format!("Amount must be positive, got {}", request.amount),
            });
        }
        let id = self.provider_order_id(&request.metadata.order_id);
        debug!("🪝️ Simulated intent {id} created for order {} ({})", request.metadata.order_id, request.amount);
        Ok(PaymentIntent {
            client_handle: ClientHandle::ProviderOrderId(id.clone()),
            id,
            amount: request.amount,
            currency: request.currency,
            status: "created".to_string(),
        })
    }

    fn verify_signature(&self, payload: SignedPayload<'_>, signature: &str) -> Result<(), SignatureError> {
        let signature = signature.trim();
        if signature.is_empty() {
            return Err(SignatureError::Missing);
        }
        let event = payload.event;
        let payment_id = event.payment_id().unwrap_or_default();
        if event.kind() == PaymentEventKind::Succeeded && payment_id.is_empty() {
            return Err(SignatureError::Invalid);
        }
        let message = canonical_message(event.intent_id().unwrap_or_default(), payment_id);
        if verify_hmac_sha256_hex(self.secret.reveal().as_bytes(), message.as_bytes(), signature) {
            Ok(())
        } else {
            Err(SignatureError::Invalid)
        }
    }

    fn public_key(&self) -> String {
        self.key_id.clone()
    }
}
