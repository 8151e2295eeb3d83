//! Per-account state snapshot
//!
//! One `AccountState` lives behind each executor's account lock. It caches
//! free balances, net positions, and market precision so sizing does not
//! round-trip the venue on every alert. A snapshot marked stale is refreshed
//! before its next use; refreshes swap the whole snapshot in at once.

use std::collections::HashMap;

use rust_decimal::Decimal;

use courier_core::{DispatchError, Pair};
use courier_ports::BalanceSnapshot;

#[derive(Debug, Default)]
pub struct AccountState {
    balances: BalanceSnapshot,
    positions: HashMap<String, Decimal>,
    precision: HashMap<String, u32>,
    stale: bool,
}

impl AccountState {
    pub fn new() -> Self {
        AccountState {
            stale: true,
            ..Default::default()
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Flags the snapshot for a forced refresh before its next use.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Swaps in a complete snapshot. Precision survives, it only changes
    /// when markets are re-fetched.
    pub fn replace(&mut self, balances: BalanceSnapshot, positions: HashMap<String, Decimal>) {
        self.balances = balances;
        self.positions = positions;
        self.stale = false;
    }

    pub fn set_precision(&mut self, pair: &Pair, precision: u32) {
        self.precision.insert(pair.symbol().to_string(), precision);
    }

    pub fn precision(&self, pair: &Pair) -> Option<u32> {
        self.precision.get(pair.symbol()).copied()
    }

    pub fn free(&self, currency: &str) -> Decimal {
        self.balances.free(currency)
    }

    pub fn set_balances(&mut self, balances: BalanceSnapshot) {
        self.balances = balances;
    }

    pub fn position(&self, pair: &Pair) -> Decimal {
        self.positions
            .get(pair.symbol())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn set_position(&mut self, pair: &Pair, contracts: Decimal) {
        self.positions.insert(pair.symbol().to_string(), contracts);
    }

    /// Moves the cached position toward zero by `executed` contracts.
    /// Closing more than the cache holds is a bookkeeping fault, not a
    /// clamp: the venue accepted an order this snapshot cannot explain.
    pub fn reduce_position(&mut self, pair: &Pair, executed: Decimal) -> Result<(), DispatchError> {
        let current = self.position(pair);
        if executed > current.abs() {
            return Err(DispatchError::Consistency(format!(
                "closed {executed} contracts on {pair} but cache holds {current}"
            )));
        }
        let reduced = if current.is_sign_negative() {
            current + executed
        } else {
            current - executed
        };
        self.positions.insert(pair.symbol().to_string(), reduced);
        Ok(())
    }
}
