use serde::Serialize;

use crate::db_types::{GameId, Order, PaymentStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request. Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current: u32,
    pub pages: u32,
    pub total: i64,
    pub limit: u32,
}

impl PageInfo {
    pub fn new(pagination: Pagination, total: i64) -> Self {
        let limit = i64::from(pagination.limit);
        let pages = u32::try_from((total.max(0) + limit - 1) / limit).unwrap_or(u32::MAX);
        Self { current: pagination.page, pages, total, limit: pagination.limit }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    pub user_id: Option<String>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderQueryFilter {
    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.payment_status.is_none()
    }
}

/// The result of applying a payment outcome to an order.
#[derive(Debug, Clone)]
pub enum PaymentTransition {
    /// The order moved out of `PENDING`. For a confirmation, stock for every line item was decremented.
    Applied(Order),
    /// The order had already reached a final payment state. Nothing changed.
    AlreadyFinal(Order),
    /// The payment was confirmed, but `game_id` no longer had enough stock. No stock changed and the order is now
    /// `FAILED` / `CANCELLED`.
    Oversold { order: Order, game_id: GameId },
}
