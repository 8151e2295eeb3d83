//! In-memory centralized exchange

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;

use courier_core::{ExecutionReceipt, OrderKind, OrderTicket, Pair, Side};
use courier_ports::{BalanceSnapshot, ExchangeVenue, MarketSpec, VenueError, VenueResult};

/// An exchange account backed by in-memory maps.
///
/// Market-type orders fill immediately against the configured last price,
/// moving balances and positions; limit and stop orders only get recorded.
pub struct SimExchange {
    name: String,
    markets: Mutex<Vec<MarketSpec>>,
    balances: DashMap<String, Decimal>,
    positions: DashMap<String, Decimal>,
    prices: DashMap<String, Decimal>,
    orders: Mutex<Vec<OrderTicket>>,
    cancelled_pairs: Mutex<Vec<String>>,
    fail_next_order: Mutex<Option<VenueError>>,
    fail_next_balance: Mutex<Option<VenueError>>,
    order_latency: Mutex<Option<Duration>>,
    next_order_id: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SimExchange {
    pub fn new(name: &str) -> Self {
        SimExchange {
            name: name.to_string(),
            markets: Mutex::new(Vec::new()),
            balances: DashMap::new(),
            positions: DashMap::new(),
            prices: DashMap::new(),
            orders: Mutex::new(Vec::new()),
            cancelled_pairs: Mutex::new(Vec::new()),
            fail_next_order: Mutex::new(None),
            fail_next_balance: Mutex::new(None),
            order_latency: Mutex::new(None),
            next_order_id: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_market(self, symbol: &str, amount_precision: u32) -> Self {
        let pair = Pair::parse(symbol).unwrap();
        self.markets.lock().unwrap().push(MarketSpec {
            pair,
            amount_precision,
        });
        self
    }

    pub fn with_balance(self, currency: &str, amount: Decimal) -> Self {
        self.balances.insert(currency.to_string(), amount);
        self
    }

    pub fn with_position(self, symbol: &str, contracts: Decimal) -> Self {
        self.positions.insert(symbol.to_string(), contracts);
        self
    }

    pub fn with_price(self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    /// Delays every `create_order` call, so overlapping submissions on
    /// the same account become observable.
    pub fn with_order_latency(self, latency: Duration) -> Self {
        *self.order_latency.lock().unwrap() = Some(latency);
        self
    }

    pub fn fail_next_order(&self, err: VenueError) {
        *self.fail_next_order.lock().unwrap() = Some(err);
    }

    pub fn fail_next_balance(&self, err: VenueError) {
        *self.fail_next_balance.lock().unwrap() = Some(err);
    }

    pub fn set_position(&self, symbol: &str, contracts: Decimal) {
        self.positions.insert(symbol.to_string(), contracts);
    }

    pub fn set_balance(&self, currency: &str, amount: Decimal) {
        self.balances.insert(currency.to_string(), amount);
    }

    pub fn submitted_orders(&self) -> Vec<OrderTicket> {
        self.orders.lock().unwrap().clone()
    }

    pub fn cancelled_pairs(&self) -> Vec<String> {
        self.cancelled_pairs.lock().unwrap().clone()
    }

    /// Highest number of `create_order` calls observed in flight at once.
    pub fn max_concurrent_orders(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn apply_fill(&self, ticket: &OrderTicket) {
        let symbol = ticket.pair.symbol().to_string();
        let price = self
            .prices
            .get(&symbol)
            .map(|p| *p)
            .unwrap_or(Decimal::ZERO);
        let signed = match ticket.side {
            Side::Buy => ticket.quantity,
            Side::Sell => -ticket.quantity,
        };
        *self.positions.entry(symbol).or_insert(Decimal::ZERO) += signed;
        *self
            .balances
            .entry(ticket.pair.quote().to_string())
            .or_insert(Decimal::ZERO) -= signed * price;
    }
}

#[async_trait]
impl ExchangeVenue for SimExchange {
    fn venue_name(&self) -> &str {
        &self.name
    }

    async fn fetch_markets(&self) -> VenueResult<Vec<MarketSpec>> {
        Ok(self.markets.lock().unwrap().clone())
    }

    async fn fetch_balance(&self) -> VenueResult<BalanceSnapshot> {
        if let Some(err) = self.fail_next_balance.lock().unwrap().take() {
            return Err(err);
        }
        let free = self
            .balances
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        Ok(BalanceSnapshot::new(free))
    }

    async fn fetch_position(&self, pair: &Pair) -> VenueResult<Decimal> {
        Ok(self
            .positions
            .get(pair.symbol())
            .map(|p| *p)
            .unwrap_or(Decimal::ZERO))
    }

    async fn last_price(&self, pair: &Pair) -> VenueResult<Decimal> {
        self.prices
            .get(pair.symbol())
            .map(|p| *p)
            .ok_or_else(|| VenueError::Rejected(format!("no market for {pair}")))
    }

    async fn cancel_open_orders(&self, pair: &Pair) -> VenueResult<()> {
        self.cancelled_pairs
            .lock()
            .unwrap()
            .push(pair.symbol().to_string());
        Ok(())
    }

    async fn create_order(&self, ticket: &OrderTicket) -> VenueResult<ExecutionReceipt> {
        let latency = *self.order_latency.lock().unwrap();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.max_in_flight
            .fetch_max(self.in_flight.load(Ordering::SeqCst), Ordering::SeqCst);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = self.fail_next_order.lock().unwrap().take() {
            return Err(err);
        }

        let fills_now = match &ticket.kind {
            OrderKind::Entry { order_type, .. } => order_type.is_market(),
            OrderKind::StopLoss { .. } | OrderKind::TakeProfitLimit { .. } => false,
            OrderKind::TakeProfitMarket => true,
        };
        if fills_now {
            self.apply_fill(ticket);
        }
        self.orders.lock().unwrap().push(ticket.clone());

        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        Ok(ExecutionReceipt {
            venue_order_id: id.to_string(),
            info: serde_json::json!({
                "status": if fills_now { "FILLED" } else { "NEW" },
                "kind": ticket.kind.label(),
            }),
        })
    }
}
