use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db_types::OrderId;

pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// A payment notification:
///
/// ```json
/// {"id": "evt_..", "type": "payment_intent.succeeded",
///  "data": {"object": {"id": "<intent id>", "latest_charge": "<payment id>", "metadata": {"order_id": ".."}}}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    pub object: IntentObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_charge: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
    Succeeded,
    Failed,
    Other,
}

impl PaymentEvent {
    /// Parses and structurally validates a notification body.
    ///
    /// Only payment events must name an intent. Other event types carry arbitrary objects and are accepted as long as
    /// the envelope is well formed.
    pub fn from_json(body: &[u8]) -> Result<Self, String> {
        let event: PaymentEvent = serde_json::from_slice(body).map_err(|e| e.to_string())?;
        if event.event_type.trim().is_empty() {
            return Err("event type is empty".into());
        }
        if event.kind() != PaymentEventKind::Other && event.intent_id().is_none() {
            return Err(format!("{} event has no payment intent id", event.event_type));
        }
        Ok(event)
    }

    pub fn new(event_type: &str, intent_id: &str, payment_id: Option<&str>, order_id: &OrderId) -> Self {
        let metadata = HashMap::from([("order_id".to_string(), order_id.to_string())]);
        Self {
            id: format!("evt_{}", crate::helpers::random_hex(12)),
            event_type: event_type.to_string(),
            data: EventData {
                object: IntentObject {
                    id: Some(intent_id.to_string()),
                    latest_charge: payment_id.map(String::from),
                    metadata,
                },
            },
        }
    }

    pub fn kind(&self) -> PaymentEventKind {
        match self.event_type.as_str() {
            EVENT_PAYMENT_SUCCEEDED => PaymentEventKind::Succeeded,
            EVENT_PAYMENT_FAILED => PaymentEventKind::Failed,
            _ => PaymentEventKind::Other,
        }
    }

    /// The payment intent id, if the object names a non-blank one.
    pub fn intent_id(&self) -> Option<&str> {
        self.data.object.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.data.object.latest_charge.as_deref()
    }

    /// The order id the intent was created for, as echoed back in its metadata.
    pub fn order_id(&self) -> Option<OrderId> {
        self.data.object.metadata.get("order_id").map(|s| OrderId::from(s.as_str()))
    }
}
