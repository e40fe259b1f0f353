use std::{fmt::Display, str::FromStr};

use game_store_engine::{
    db_types::{OrderStatusType, PaymentStatus},
    traits::Pagination,
};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// `?page=&limit=` query parameters. Missing or out-of-range values fall back to sensible defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminOrderQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AdminOrderQuery {
    pub fn payment_status(&self) -> Result<Option<PaymentStatus>, ServerError> {
        self.status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(PaymentStatus::from_str)
            .transpose()
            .map_err(|e| ServerError::ValidationError(e.to_string()))
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusParams {
    pub order_status: String,
}

impl UpdateOrderStatusParams {
    pub fn status(&self) -> Result<OrderStatusType, ServerError> {
        OrderStatusType::from_str(&self.order_status).map_err(|e| ServerError::ValidationError(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatedOutcome {
    #[default]
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimulatePaymentParams {
    #[serde(default)]
    pub outcome: SimulatedOutcome,
}

/// A signed notification for the client to forward to the webhook endpoint, in the header named by `header`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedCallbackResponse {
    pub payload: String,
    pub signature: String,
    pub header: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookReceipt {
    pub received: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub key: String,
}
