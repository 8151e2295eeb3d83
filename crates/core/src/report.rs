//! Execution reports
//!
//! One `OrderReport` per (alert, account) pair, success or failure alike.
//! The raw alert is echoed so downstream consumers can correlate without
//! keeping their own copy of the batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::RawAlert;
use crate::error::DispatchError;
use crate::order::{ExecutionReceipt, SwapReceipt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderOutcome {
    /// Order accepted by an exchange venue.
    Submitted(ExecutionReceipt),
    /// Swap accepted by a chain venue.
    Swapped(SwapReceipt),
    /// The alert produced no order on this account.
    Rejected(DispatchError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReport {
    /// Account label, absent when the alert failed before routing.
    pub account: Option<String>,
    pub alert: RawAlert,
    pub outcome: OrderOutcome,
    pub timestamp: DateTime<Utc>,
}

impl OrderReport {
    pub fn submitted(account: &str, alert: RawAlert, receipt: ExecutionReceipt) -> Self {
        OrderReport {
            account: Some(account.to_string()),
            alert,
            outcome: OrderOutcome::Submitted(receipt),
            timestamp: Utc::now(),
        }
    }

    pub fn swapped(account: &str, alert: RawAlert, receipt: SwapReceipt) -> Self {
        OrderReport {
            account: Some(account.to_string()),
            alert,
            outcome: OrderOutcome::Swapped(receipt),
            timestamp: Utc::now(),
        }
    }

    pub fn rejected(account: Option<&str>, alert: RawAlert, error: &DispatchError) -> Self {
        OrderReport {
            account: account.map(str::to_string),
            alert,
            outcome: OrderOutcome::Rejected(error.clone()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, OrderOutcome::Rejected(_))
    }

    /// True when the alert was turned away by one of the protective
    /// gates rather than failing on infrastructure.
    pub fn is_protective_rejection(&self) -> bool {
        matches!(&self.outcome, OrderOutcome::Rejected(err) if err.is_protective())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> RawAlert {
        RawAlert {
            symbol: Some("BTC/USDT".to_string()),
            exchange: Some("binance".to_string()),
            side: Some("buy".to_string()),
            order_type: Some("market".to_string()),
            quantity_percent: None,
            price: None,
            reduce_only: None,
            stop_price: None,
            comment: None,
        }
    }

    #[test]
    fn test_rejection_carries_error_and_echoes_alert() {
        let report = OrderReport::rejected(None, alert(), &DispatchError::InsufficientSize);
        assert!(report.is_rejected());
        assert!(report.is_protective_rejection());
        assert!(report.account.is_none());
        assert_eq!(report.alert.symbol.as_deref(), Some("BTC/USDT"));
        assert_eq!(
            report.outcome,
            OrderOutcome::Rejected(DispatchError::InsufficientSize)
        );

        let venue = OrderReport::rejected(
            Some("binance-main"),
            alert(),
            &DispatchError::Venue("timeout".to_string()),
        );
        assert!(venue.is_rejected());
        assert!(!venue.is_protective_rejection());
    }

    #[test]
    fn test_submitted_report() {
        let receipt = ExecutionReceipt {
            venue_order_id: "12345".to_string(),
            info: serde_json::json!({"status": "NEW"}),
        };
        let report = OrderReport::submitted("binance-main", alert(), receipt);
        assert!(!report.is_rejected());
        assert_eq!(report.account.as_deref(), Some("binance-main"));
    }
}
