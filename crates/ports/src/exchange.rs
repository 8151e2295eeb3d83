//! Centralized exchange capability

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use courier_core::{ExecutionReceipt, OrderTicket, Pair};

use crate::error::VenueResult;

/// Free balances keyed by currency code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSnapshot {
    free: HashMap<String, Decimal>,
}

impl BalanceSnapshot {
    pub fn new(free: HashMap<String, Decimal>) -> Self {
        BalanceSnapshot { free }
    }

    /// Free balance for a currency, zero when the venue omits it.
    pub fn free(&self, currency: &str) -> Decimal {
        self.free.get(currency).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Contract metadata the engine needs per market.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSpec {
    pub pair: Pair,
    /// Decimal places allowed in order quantities.
    pub amount_precision: u32,
}

/// One authenticated account on a centralized exchange.
#[async_trait]
pub trait ExchangeVenue: Send + Sync {
    /// Venue identifier for logs and reports, e.g. "binance".
    fn venue_name(&self) -> &str;

    async fn fetch_markets(&self) -> VenueResult<Vec<MarketSpec>>;

    async fn fetch_balance(&self) -> VenueResult<BalanceSnapshot>;

    /// Signed net position in contracts for one pair; zero when flat.
    async fn fetch_position(&self, pair: &Pair) -> VenueResult<Decimal>;

    async fn last_price(&self, pair: &Pair) -> VenueResult<Decimal>;

    /// Cancels all resting orders on a pair. Idempotent on an empty book.
    async fn cancel_open_orders(&self, pair: &Pair) -> VenueResult<()>;

    async fn create_order(&self, ticket: &OrderTicket) -> VenueResult<ExecutionReceipt>;
}
