//! Consumes payment provider notifications and drives the order state machine.
//!
//! ```text
//!              succeeded (stock available)
//!   PENDING ──────────────────────────────▶ PAID / CONFIRMED
//!      │  │   succeeded (oversold)
//!      │  └───────────────────────────────▶ FAILED / CANCELLED
//!      │      failed
//!      └──────────────────────────────────▶ FAILED
//! ```
//!
//! `PAID` and `FAILED` are terminal. Providers deliver at least once, so a notification for an order that has already
//! left `PENDING` is acknowledged and ignored.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{GameId, OrderId},
    gs_api::errors::WebhookError,
    payments::{PaymentEvent, PaymentEventKind, PaymentGateway, SignatureError, SignedPayload},
    traits::{OrderManagement, PaymentGatewayDatabase, PaymentTransition},
};

/// What processing a notification did. Every variant is acknowledged to the provider as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The order is now `PAID` and its stock has been allocated.
    Paid(OrderId),
    /// The order's payment is now `FAILED`.
    Failed(OrderId),
    /// Payment was captured but the order could not be filled. A manual refund is needed.
    Oversold { order_id: OrderId, game_id: GameId },
    /// The order had already reached a final payment state.
    AlreadyProcessed(OrderId),
    /// No order carries this payment intent id.
    UnknownOrder(String),
    /// The event type is not one we act on.
    Ignored(String),
}

pub struct WebhookApi<B, G> {
    db: B,
    gateway: G,
}

impl<B, G> Debug for WebhookApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookApi")
    }
}

impl<B, G> WebhookApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> WebhookApi<B, G>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    /// Processes a raw notification body and the signature that accompanied it.
    ///
    /// The body is parsed and the signature verified before any lookup or mutation takes place. Structural problems
    /// yield [`WebhookError::MalformedPayload`] and verification failures [`WebhookError::InvalidSignature`]; in both
    /// cases nothing has been changed.
    pub async fn process(&self, body: &[u8], signature: Option<&str>) -> Result<WebhookOutcome, WebhookError> {
        let event = PaymentEvent::from_json(body).map_err(|e| {
            warn!("🪝️ Rejecting malformed payment notification: {e}");
            WebhookError::MalformedPayload(e)
        })?;
        let signature = signature.ok_or(SignatureError::Missing)?;
        self.gateway.verify_signature(SignedPayload { body, event: &event }, signature).map_err(|e| {
            warn!("🪝️ Payment notification {} failed verification: {e}", event.id);
            WebhookError::InvalidSignature(e)
        })?;
        trace!("🪝️ Notification {} ({}) verified", event.id, event.event_type);

        let kind = event.kind();
        if kind == PaymentEventKind::Other {
            info!("🪝️ Ignoring notification {} of type {}", event.id, event.event_type);
            return Ok(WebhookOutcome::Ignored(event.event_type));
        }
        let intent_id = event
            .intent_id()
            .ok_or_else(|| WebhookError::MalformedPayload(format!("{} event has no payment intent id", event.event_type)))?;
        let Some(order) = self.db.fetch_order_by_intent_id(intent_id).await? else {
            warn!("🪝️ Notification {} refers to payment intent {intent_id}, which matches no order", event.id);
            return Ok(WebhookOutcome::UnknownOrder(intent_id.to_string()));
        };
        if let Some(claimed) = event.order_id() {
            if claimed != order.order_id {
                warn!(
                    "🪝️ Notification {} names order {claimed} in its metadata, but intent {intent_id} belongs to {}. \
                     Using the intent's order.",
                    event.id, order.order_id
                );
            }
        }
        let order_id = order.order_id;
        let outcome = match kind {
            PaymentEventKind::Succeeded => match self.db.confirm_payment(&order_id).await? {
                PaymentTransition::Applied(_) => {
                    info!("🪝️ Order {order_id} is paid");
                    WebhookOutcome::Paid(order_id)
                },
                PaymentTransition::AlreadyFinal(o) => {
                    debug!("🪝️ Duplicate success notification for order {order_id} ({})", o.payment_status);
                    WebhookOutcome::AlreadyProcessed(order_id)
                },
                PaymentTransition::Oversold { order, game_id } => {
                    error!(
                        "🪝️ Payment {} captured for order {order_id}, but game #{game_id} is out of stock. The order \
                         has been cancelled and {} {} must be refunded manually.",
                        event.payment_id().unwrap_or("(unknown)"),
                        order.total,
                        order.currency
                    );
                    WebhookOutcome::Oversold { order_id, game_id }
                },
            },
            PaymentEventKind::Failed => match self.db.fail_payment(&order_id).await? {
                PaymentTransition::AlreadyFinal(o) => {
                    debug!("🪝️ Failure notification for order {order_id} ignored; payment is already {}", o.payment_status);
                    WebhookOutcome::AlreadyProcessed(order_id)
                },
                _ => {
                    info!("🪝️ Payment for order {order_id} failed");
                    WebhookOutcome::Failed(order_id)
                },
            },
            PaymentEventKind::Other => WebhookOutcome::Ignored(event.event_type),
        };
        Ok(outcome)
    }
}
