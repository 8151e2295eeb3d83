//! Venue-neutral order tickets and receipts

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pair::Pair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Order type as carried by the alert payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertOrderType {
    Market,
    Limit,
    StopLimit,
}

impl AlertOrderType {
    /// Market-type orders size against live state rather than the cache.
    pub fn is_market(&self) -> bool {
        matches!(self, AlertOrderType::Market)
    }
}

impl fmt::Display for AlertOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertOrderType::Market => write!(f, "market"),
            AlertOrderType::Limit => write!(f, "limit"),
            AlertOrderType::StopLimit => write!(f, "stopLimit"),
        }
    }
}

/// What role the order plays in the position lifecycle. Decides which
/// venue-specific parameters the order carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Opens or adds to a position. Entries cancel resting orders first.
    Entry {
        order_type: AlertOrderType,
        price: Option<Decimal>,
    },
    /// Reduce-only order armed at a trigger price.
    StopLoss {
        order_type: AlertOrderType,
        stop_price: Decimal,
        price: Option<Decimal>,
    },
    /// Reduce-only limit order resting at the take-profit price.
    TakeProfitLimit { price: Decimal },
    /// Reduce-only market order closing at whatever the book gives.
    TakeProfitMarket,
}

impl OrderKind {
    pub fn is_reduce_only(&self) -> bool {
        !matches!(self, OrderKind::Entry { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderKind::Entry { .. } => "entry",
            OrderKind::StopLoss { .. } => "stop-loss",
            OrderKind::TakeProfitLimit { .. } => "take-profit-limit",
            OrderKind::TakeProfitMarket => "take-profit-market",
        }
    }
}

/// A fully sized and classified order, ready for a venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub client_order_id: Uuid,
    pub pair: Pair,
    pub side: Side,
    pub kind: OrderKind,
    /// Contract quantity, already floored to the pair's precision.
    pub quantity: Decimal,
}

impl OrderTicket {
    pub fn new(pair: Pair, side: Side, kind: OrderKind, quantity: Decimal) -> Self {
        OrderTicket {
            client_order_id: Uuid::new_v4(),
            pair,
            side,
            kind,
            quantity,
        }
    }
}

/// Opaque acknowledgement from an exchange venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub venue_order_id: String,
    /// Venue-specific detail, passed through for the report.
    pub info: serde_json::Value,
}

/// A swap instruction for a chain venue, produced only after the
/// slippage and gas gates have passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapOrder {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    /// Floor on the output, below which the swap reverts on-chain.
    pub min_amount_out: Decimal,
    /// Unix timestamp after which the swap is void.
    pub deadline_unix: i64,
}

/// Acknowledgement of a submitted swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub tx_hash: String,
    pub amount_out: Decimal,
}
