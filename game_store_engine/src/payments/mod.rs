//! # Payment gateways
//!
//! Business logic talks to payment providers only through the [`PaymentGateway`] trait. Two implementations ship:
//!
//! * [`StripeGateway`] creates real payment intents over the provider's REST API and verifies its webhook signatures.
//! * [`SimulatedGateway`] fabricates provider-shaped intents locally and signs its own callbacks, so the whole
//!   checkout flow can run without network access.
//!
//! Provider notifications share one wire format, parsed by [`PaymentEvent`].
mod errors;
mod events;
mod simulator;
mod stripe;

use gs_common::MinorUnits;
use serde::{Deserialize, Serialize};

pub use errors::{PaymentGatewayError, SignatureError};
pub use events::{EventData, IntentObject, PaymentEvent, PaymentEventKind, EVENT_PAYMENT_FAILED, EVENT_PAYMENT_SUCCEEDED};
pub use simulator::{SimulatedCallback, SimulatedGateway, DEFAULT_SIMULATOR_KEY_ID, DEFAULT_SIMULATOR_SECRET};
pub use stripe::{StripeConfig, StripeGateway, DEFAULT_STRIPE_API_URL, DEFAULT_WEBHOOK_TOLERANCE_SECS};

use crate::db_types::OrderId;

/// The name of the header that carries webhook signatures unless a gateway says otherwise.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Payment-Signature";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMetadata {
    pub order_id: OrderId,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    /// The amount to charge, in minor units of `currency`.
    pub amount: MinorUnits,
    /// Lower-case ISO currency code.
    pub currency: String,
    pub metadata: IntentMetadata,
}

/// What the client needs to complete the payment with the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientHandle {
    /// A secret the client-side SDK uses to confirm a payment intent.
    ClientSecret(String),
    /// The provider's order id, for checkout flows keyed on an order.
    ProviderOrderId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// The provider's intent id. Payment notifications refer to the order by this id.
    pub id: String,
    pub client_handle: ClientHandle,
    pub amount: MinorUnits,
    pub currency: String,
    pub status: String,
}

/// A notification exactly as received, alongside its parsed form. Gateways sign different parts of it.
#[derive(Debug, Clone, Copy)]
pub struct SignedPayload<'a> {
    pub body: &'a [u8],
    pub event: &'a PaymentEvent,
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Asks the provider to prepare a payment for the given amount.
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, PaymentGatewayError>;

    /// Checks that a notification was produced by the provider. Comparison is constant-time.
    fn verify_signature(&self, payload: SignedPayload<'_>, signature: &str) -> Result<(), SignatureError>;

    /// The publishable key (or key id) the client needs to talk to the provider.
    fn public_key(&self) -> String;

    /// The HTTP header this provider puts its webhook signature in.
    fn signature_header(&self) -> &str {
        DEFAULT_SIGNATURE_HEADER
    }
}
