//! In-memory chain venue

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;

use courier_core::{SwapOrder, SwapReceipt};
use courier_ports::{ChainVenue, VenueError, VenueResult};

/// A wallet plus constant-rate swap router.
///
/// Quotes are `amount_in * rate(token_in, token_out)`; submitting a swap
/// moves the wallet's token balances at the quoted rate and burns the
/// configured gas cost.
pub struct SimChain {
    name: String,
    native: Mutex<Decimal>,
    token_balances: DashMap<String, Decimal>,
    token_symbols: DashMap<String, String>,
    rates: DashMap<(String, String), Decimal>,
    gas_cost: Mutex<Decimal>,
    swaps: Mutex<Vec<SwapOrder>>,
    fail_next_swap: Mutex<Option<VenueError>>,
    next_nonce: AtomicU64,
}

impl SimChain {
    pub fn new(name: &str) -> Self {
        SimChain {
            name: name.to_string(),
            native: Mutex::new(Decimal::ZERO),
            token_balances: DashMap::new(),
            token_symbols: DashMap::new(),
            rates: DashMap::new(),
            gas_cost: Mutex::new(Decimal::ZERO),
            swaps: Mutex::new(Vec::new()),
            fail_next_swap: Mutex::new(None),
            next_nonce: AtomicU64::new(1),
        }
    }

    /// Registers a token contract: its symbol and the wallet's balance.
    pub fn with_token(self, address: &str, symbol: &str, balance: Decimal) -> Self {
        self.token_symbols
            .insert(address.to_string(), symbol.to_string());
        self.token_balances.insert(address.to_string(), balance);
        self
    }

    pub fn with_native_balance(self, amount: Decimal) -> Self {
        *self.native.lock().unwrap() = amount;
        self
    }

    /// Pool rate for one direction: output per unit of input.
    pub fn with_rate(self, token_in: &str, token_out: &str, rate: Decimal) -> Self {
        self.rates
            .insert((token_in.to_string(), token_out.to_string()), rate);
        self
    }

    pub fn with_gas_cost(self, cost: Decimal) -> Self {
        *self.gas_cost.lock().unwrap() = cost;
        self
    }

    pub fn set_rate(&self, token_in: &str, token_out: &str, rate: Decimal) {
        self.rates
            .insert((token_in.to_string(), token_out.to_string()), rate);
    }

    pub fn fail_next_swap(&self, err: VenueError) {
        *self.fail_next_swap.lock().unwrap() = Some(err);
    }

    pub fn submitted_swaps(&self) -> Vec<SwapOrder> {
        self.swaps.lock().unwrap().clone()
    }

    fn rate(&self, token_in: &str, token_out: &str) -> VenueResult<Decimal> {
        self.rates
            .get(&(token_in.to_string(), token_out.to_string()))
            .map(|r| *r)
            .ok_or_else(|| {
                VenueError::Rejected(format!("no pool for {token_in} -> {token_out}"))
            })
    }
}

#[async_trait]
impl ChainVenue for SimChain {
    fn chain_name(&self) -> &str {
        &self.name
    }

    async fn native_balance(&self) -> VenueResult<Decimal> {
        Ok(*self.native.lock().unwrap())
    }

    async fn token_balance(&self, token_address: &str) -> VenueResult<Decimal> {
        Ok(self
            .token_balances
            .get(token_address)
            .map(|b| *b)
            .unwrap_or(Decimal::ZERO))
    }

    async fn token_symbol(&self, token_address: &str) -> VenueResult<String> {
        self.token_symbols
            .get(token_address)
            .map(|s| s.clone())
            .ok_or_else(|| VenueError::Rejected(format!("no contract at {token_address}")))
    }

    async fn quote_swap(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: Decimal,
    ) -> VenueResult<Decimal> {
        Ok(amount_in * self.rate(token_in, token_out)?)
    }

    async fn estimate_swap_gas(&self, _order: &SwapOrder) -> VenueResult<Decimal> {
        Ok(*self.gas_cost.lock().unwrap())
    }

    async fn submit_swap(&self, order: &SwapOrder) -> VenueResult<SwapReceipt> {
        if let Some(err) = self.fail_next_swap.lock().unwrap().take() {
            return Err(err);
        }
        let amount_out = order.amount_in * self.rate(&order.token_in, &order.token_out)?;

        *self
            .token_balances
            .entry(order.token_in.clone())
            .or_insert(Decimal::ZERO) -= order.amount_in;
        *self
            .token_balances
            .entry(order.token_out.clone())
            .or_insert(Decimal::ZERO) += amount_out;
        *self.native.lock().unwrap() -= *self.gas_cost.lock().unwrap();

        self.swaps.lock().unwrap().push(order.clone());
        let nonce = self.next_nonce.fetch_add(1, Ordering::SeqCst);
        Ok(SwapReceipt {
            tx_hash: format!("0x{nonce:064x}"),
            amount_out,
        })
    }
}
