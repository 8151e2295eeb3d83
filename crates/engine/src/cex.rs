//! Centralized exchange executor
//!
//! One `CexExecutor` per configured account. `execute` takes an alert the
//! whole way: refresh-if-stale, size, classify, submit, reconcile - all
//! under the account lock, so two alerts for the same account never size
//! against the same balance.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use courier_core::{
    Alert, DispatchError, ExecutionReceipt, OrderKind, OrderTicket, Pair, PositionTag,
};
use courier_ports::{BalanceSnapshot, ExchangeVenue};

use crate::sizing;
use crate::state::AccountState;

pub struct CexExecutor {
    label: String,
    exchange_id: String,
    venue: Arc<dyn ExchangeVenue>,
    pairs: Vec<Pair>,
    state: Mutex<AccountState>,
}

impl CexExecutor {
    pub fn new(
        label: &str,
        exchange_id: &str,
        venue: Arc<dyn ExchangeVenue>,
        pairs: Vec<Pair>,
    ) -> Self {
        CexExecutor {
            label: label.to_string(),
            exchange_id: exchange_id.to_lowercase(),
            venue,
            pairs,
            state: Mutex::new(AccountState::new()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn exchange_id(&self) -> &str {
        &self.exchange_id
    }

    pub fn supports(&self, exchange: &str, pair: &Pair) -> bool {
        self.exchange_id == exchange && self.pairs.contains(pair)
    }

    /// Startup sync: market precision for every configured pair, then an
    /// initial balance and position snapshot. Pairs the venue does not
    /// list are dropped with a warning rather than failing the account.
    pub async fn connect(&mut self) -> Result<(), DispatchError> {
        let markets = self.venue.fetch_markets().await?;
        let state = self.state.get_mut();

        let mut kept = Vec::with_capacity(self.pairs.len());
        for pair in self.pairs.drain(..) {
            match markets.iter().find(|m| m.pair == pair) {
                Some(spec) => {
                    state.set_precision(&pair, spec.amount_precision);
                    kept.push(pair);
                }
                None => warn!(
                    "[{}] {} is not listed on {}, dropping it",
                    self.label,
                    pair,
                    self.venue.venue_name()
                ),
            }
        }
        self.pairs = kept;

        let (balances, positions) = Self::fetch_snapshot(&*self.venue, &self.pairs).await?;
        state.replace(balances, positions);
        info!(
            "[{}] connected to {} with {} pair(s)",
            self.label,
            self.venue.venue_name(),
            self.pairs.len()
        );
        Ok(())
    }

    /// Fetches a complete snapshot without touching the cache, so a
    /// failure partway leaves the old state intact.
    async fn fetch_snapshot(
        venue: &dyn ExchangeVenue,
        pairs: &[Pair],
    ) -> Result<(BalanceSnapshot, HashMap<String, Decimal>), DispatchError> {
        let balances = venue.fetch_balance().await?;
        let mut positions = HashMap::with_capacity(pairs.len());
        for pair in pairs {
            let contracts = venue.fetch_position(pair).await?;
            positions.insert(pair.symbol().to_string(), contracts);
        }
        Ok((balances, positions))
    }

    pub async fn execute(&self, alert: &Alert) -> Result<ExecutionReceipt, DispatchError> {
        let mut state = self.state.lock().await;

        if state.is_stale() {
            debug!("[{}] snapshot stale, refreshing before use", self.label);
            let (balances, positions) = Self::fetch_snapshot(&*self.venue, &self.pairs).await?;
            state.replace(balances, positions);
        }

        let precision = state.precision(&alert.pair).ok_or_else(|| {
            DispatchError::UnsupportedRoute {
                exchange: self.exchange_id.clone(),
                symbol: alert.pair.symbol().to_string(),
            }
        })?;

        if alert.tag.is_open() && alert.reduce_only {
            return Err(DispatchError::Validation(format!(
                "open tag {:?} on a reduce-only alert",
                alert.tag
            )));
        }
        if alert.tag.is_close() && !alert.reduce_only {
            return Err(DispatchError::Validation(format!(
                "close tag {:?} on a non-reduce-only alert",
                alert.tag
            )));
        }

        let quantity = if alert.reduce_only {
            // Market-type closes and full closes size against the live
            // position; partial resting closes trust the cache.
            let live = alert.order_type.is_market()
                || alert.quantity_percent == Decimal::ONE_HUNDRED;
            let position = if live {
                self.venue.fetch_position(&alert.pair).await?
            } else {
                state.position(&alert.pair)
            };
            sizing::close_contracts(position, alert.quantity_percent)
        } else {
            let price = self.venue.last_price(&alert.pair).await?;
            let free = state.free(alert.pair.quote());
            sizing::open_contracts(free, price, alert.quantity_percent)
        };
        let quantity = sizing::floor_to_precision(quantity, precision);
        if quantity <= Decimal::ZERO {
            return Err(DispatchError::InsufficientSize);
        }

        let kind = classify(alert);
        let ticket = OrderTicket::new(alert.pair.clone(), alert.side, kind, quantity);

        // A fresh entry supersedes whatever protective orders are resting.
        if !ticket.kind.is_reduce_only() {
            self.venue.cancel_open_orders(&alert.pair).await?;
        }

        info!(
            "[{}] submitting {} {} {} x{}",
            self.label,
            ticket.kind.label(),
            ticket.side,
            ticket.pair,
            ticket.quantity
        );
        let receipt = self.venue.create_order(&ticket).await?;

        match self.reconcile(&mut state, alert, quantity).await {
            Ok(()) => {}
            Err(err @ DispatchError::Consistency(_)) => {
                state.mark_stale();
                return Err(err);
            }
            Err(err) => {
                warn!(
                    "[{}] post-trade sync failed, snapshot marked stale: {err}",
                    self.label
                );
                state.mark_stale();
            }
        }
        Ok(receipt)
    }

    /// Brings the cache back in line with what the order just did. Open
    /// tags and unknown tags re-query the live position; close tags
    /// decrement by the executed quantity.
    async fn reconcile(
        &self,
        state: &mut AccountState,
        alert: &Alert,
        executed: Decimal,
    ) -> Result<(), DispatchError> {
        match &alert.tag {
            PositionTag::OpenLong | PositionTag::OpenShort | PositionTag::Other(_) => {
                let live = self.venue.fetch_position(&alert.pair).await?;
                state.set_position(&alert.pair, live);
            }
            PositionTag::CloseLong | PositionTag::CloseShort | PositionTag::SetTakeProfit => {
                state.reduce_position(&alert.pair, executed)?;
            }
        }
        let balances = self.venue.fetch_balance().await?;
        state.set_balances(balances);
        Ok(())
    }
}

fn classify(alert: &Alert) -> OrderKind {
    let limit_price = (!alert.order_type.is_market()).then_some(alert.price);
    if !alert.reduce_only {
        OrderKind::Entry {
            order_type: alert.order_type,
            price: limit_price,
        }
    } else if let Some(stop_price) = alert.stop_price {
        OrderKind::StopLoss {
            order_type: alert.order_type,
            stop_price,
            price: limit_price,
        }
    } else if alert.order_type.is_market() {
        OrderKind::TakeProfitMarket
    } else {
        OrderKind::TakeProfitLimit { price: alert.price }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{AlertOrderType, RawAlert, Side};
    use courier_ports::VenueError;
    use courier_venue_sim::SimExchange;
    use rust_decimal_macros::dec;

    fn alert(overrides: impl FnOnce(&mut RawAlert)) -> Alert {
        let mut raw = RawAlert {
            symbol: Some("BTC/USDT".to_string()),
            exchange: Some("binance".to_string()),
            side: Some("buy".to_string()),
            order_type: Some("market".to_string()),
            quantity_percent: Some(dec!(50)),
            price: Some(dec!(2000)),
            reduce_only: Some(false),
            stop_price: None,
            comment: Some("openlong".to_string()),
        };
        overrides(&mut raw);
        Alert::try_from(&raw).unwrap()
    }

    async fn connected(venue: Arc<SimExchange>) -> CexExecutor {
        let mut executor = CexExecutor::new(
            "binance-main",
            "binance",
            venue,
            vec![Pair::parse("BTC/USDT").unwrap()],
        );
        executor.connect().await.unwrap();
        executor
    }

    #[tokio::test]
    async fn test_market_entry_sizes_against_free_balance() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_balance("USDT", dec!(1000))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;

        executor.execute(&alert(|_| {})).await.unwrap();

        let orders = venue.submitted_orders();
        assert_eq!(orders.len(), 1);
        // 1000 / 2000 * 50 / 100.5 = 0.2487..., floored at 3 decimals
        assert_eq!(orders[0].quantity, dec!(0.248));
        assert_eq!(orders[0].side, Side::Buy);
        // entries clear the book first
        assert_eq!(venue.cancelled_pairs(), vec!["BTC/USDT".to_string()]);
    }

    #[tokio::test]
    async fn test_limit_close_sizes_against_cached_position() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_position("BTC/USDT", dec!(0.8))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;
        // live position moves after connect; a partial limit close must
        // keep using the snapshot
        venue.set_position("BTC/USDT", dec!(2.0));

        let close = alert(|raw| {
            raw.side = Some("sell".to_string());
            raw.order_type = Some("limit".to_string());
            raw.quantity_percent = Some(dec!(25));
            raw.reduce_only = Some(true);
            raw.comment = Some("closelong".to_string());
        });
        executor.execute(&close).await.unwrap();

        let orders = venue.submitted_orders();
        assert_eq!(orders[0].quantity, dec!(0.2));
        assert!(orders[0].kind.is_reduce_only());
        assert!(venue.cancelled_pairs().is_empty());
    }

    #[tokio::test]
    async fn test_full_close_requeries_live_position() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_position("BTC/USDT", dec!(0.8))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;
        // part of the position was closed elsewhere; a 100% close must
        // not trust the cached 0.8
        venue.set_position("BTC/USDT", dec!(0.5));

        let close = alert(|raw| {
            raw.side = Some("sell".to_string());
            raw.order_type = Some("limit".to_string());
            raw.quantity_percent = Some(dec!(100));
            raw.reduce_only = Some(true);
            raw.comment = Some("closelong".to_string());
        });
        executor.execute(&close).await.unwrap();

        assert_eq!(venue.submitted_orders()[0].quantity, dec!(0.5));
    }

    #[tokio::test]
    async fn test_zero_sized_order_is_rejected_without_submission() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_balance("USDT", dec!(0.5))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;

        let err = executor.execute(&alert(|_| {})).await.unwrap_err();
        assert_eq!(err, DispatchError::InsufficientSize);
        assert!(venue.submitted_orders().is_empty());
    }

    #[tokio::test]
    async fn test_stop_alert_becomes_stop_loss_order() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_position("BTC/USDT", dec!(1.0))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;

        let stop = alert(|raw| {
            raw.side = Some("sell".to_string());
            raw.order_type = Some("stopLimit".to_string());
            raw.quantity_percent = Some(dec!(50));
            raw.price = Some(dec!(1900));
            raw.stop_price = Some(dec!(1910));
            raw.reduce_only = Some(true);
            raw.comment = Some("closelong".to_string());
        });
        executor.execute(&stop).await.unwrap();

        match &venue.submitted_orders()[0].kind {
            OrderKind::StopLoss {
                stop_price, price, ..
            } => {
                assert_eq!(*stop_price, dec!(1910));
                assert_eq!(*price, Some(dec!(1900)));
            }
            other => panic!("expected stop-loss, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reduce_only_without_stop_is_take_profit() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_position("BTC/USDT", dec!(1.0))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;

        let tp = alert(|raw| {
            raw.side = Some("sell".to_string());
            raw.order_type = Some("limit".to_string());
            raw.quantity_percent = Some(dec!(50));
            raw.price = Some(dec!(2100));
            raw.reduce_only = Some(true);
            raw.comment = Some("set take profit".to_string());
        });
        executor.execute(&tp).await.unwrap();

        assert_eq!(
            venue.submitted_orders()[0].kind,
            OrderKind::TakeProfitLimit { price: dec!(2100) }
        );
    }

    #[tokio::test]
    async fn test_venue_rejection_surfaces_without_cache_damage() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_balance("USDT", dec!(1000))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;
        venue.fail_next_order(VenueError::Rejected("margin check".to_string()));

        let err = executor.execute(&alert(|_| {})).await.unwrap_err();
        assert!(matches!(err, DispatchError::Venue(_)));

        // next alert on the same account still goes through
        executor.execute(&alert(|_| {})).await.unwrap();
        assert_eq!(venue.submitted_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_over_close_reports_consistency_but_order_stands() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_position("BTC/USDT", dec!(0.2))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;
        // live grows past the cache; a market close sizes live and then
        // cannot be booked against the stale cached 0.2
        venue.set_position("BTC/USDT", dec!(1.0));

        let close = alert(|raw| {
            raw.side = Some("sell".to_string());
            raw.quantity_percent = Some(dec!(50));
            raw.reduce_only = Some(true);
            raw.comment = Some("closelong".to_string());
        });
        let err = executor.execute(&close).await.unwrap_err();
        assert!(matches!(err, DispatchError::Consistency(_)));
        // the order was submitted before the bookkeeping failed
        assert_eq!(venue.submitted_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_balance_sync_failure_keeps_receipt_and_marks_stale() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_balance("USDT", dec!(1000))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;
        venue.fail_next_balance(VenueError::Network("timeout".to_string()));

        let receipt = executor.execute(&alert(|_| {})).await.unwrap();
        assert!(!receipt.venue_order_id.is_empty());

        // the forced refresh on next use sees the post-fill balance, so
        // the second entry sizes against what is actually left
        let first_qty = venue.submitted_orders()[0].quantity;
        executor.execute(&alert(|_| {})).await.unwrap();
        let second_qty = venue.submitted_orders()[1].quantity;
        assert!(second_qty < first_qty);
    }

    #[tokio::test]
    async fn test_connect_drops_unlisted_pairs() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_price("BTC/USDT", dec!(2000)),
        );
        let mut executor = CexExecutor::new(
            "binance-main",
            "binance",
            venue,
            vec![
                Pair::parse("BTC/USDT").unwrap(),
                Pair::parse("DOGE/USDT").unwrap(),
            ],
        );
        executor.connect().await.unwrap();

        assert!(executor.supports("binance", &Pair::parse("BTC/USDT").unwrap()));
        assert!(!executor.supports("binance", &Pair::parse("DOGE/USDT").unwrap()));
    }

    #[tokio::test]
    async fn test_mismatched_tag_and_reduce_only_rejected() {
        let venue = Arc::new(
            SimExchange::new("binance")
                .with_market("BTC/USDT", 3)
                .with_balance("USDT", dec!(1000))
                .with_price("BTC/USDT", dec!(2000)),
        );
        let executor = connected(venue.clone()).await;

        let bad = alert(|raw| {
            raw.reduce_only = Some(true);
            raw.comment = Some("openlong".to_string());
        });
        assert!(matches!(
            executor.execute(&bad).await,
            Err(DispatchError::Validation(_))
        ));
        assert!(venue.submitted_orders().is_empty());
    }
}
