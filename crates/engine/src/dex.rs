//! On-chain swap executor
//!
//! One `DexExecutor` per configured wallet. Swaps are market-only and gated
//! twice before signing: the simulated pool output must sit within 1% of
//! what the alert's price implies, and the wallet must afford the estimated
//! gas. Only then is the transaction submitted, with a minimum-output floor
//! and a deadline so a stuck transaction cannot fill at a worse rate later.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use courier_core::{Alert, DispatchError, Side, SwapOrder, SwapReceipt};
use courier_ports::ChainVenue;

/// Tolerated deviation of the simulated output from the expected one.
const SLIPPAGE_TOLERANCE: Decimal = dec!(0.01);
/// Minimum output as a fraction of the simulated quote.
const MIN_OUT_FACTOR: Decimal = dec!(0.99);
/// Seconds a submitted swap stays valid.
const SWAP_DEADLINE_SECS: i64 = 600;

pub struct DexExecutor {
    label: String,
    dex_id: String,
    venue: Arc<dyn ChainVenue>,
    /// Uppercased token symbol to contract address.
    tokens: HashMap<String, String>,
    /// Serializes swaps per wallet; two swaps spending the same balance
    /// must not be sized concurrently.
    guard: Mutex<()>,
}

impl DexExecutor {
    pub fn new(
        label: &str,
        dex_id: &str,
        venue: Arc<dyn ChainVenue>,
        tokens: HashMap<String, String>,
    ) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|(symbol, address)| (symbol.to_uppercase(), address))
            .collect();
        DexExecutor {
            label: label.to_string(),
            dex_id: dex_id.to_lowercase(),
            venue,
            tokens,
            guard: Mutex::new(()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dex_id(&self) -> &str {
        &self.dex_id
    }

    /// Any two distinct configured tokens form a tradable pair; the alert
    /// side decides the swap direction.
    pub fn supports(&self, exchange: &str, base: &str, quote: &str) -> bool {
        self.dex_id == exchange
            && !base.eq_ignore_ascii_case(quote)
            && self.tokens.contains_key(&base.to_uppercase())
            && self.tokens.contains_key(&quote.to_uppercase())
    }

    /// Startup check: every configured address must report the symbol it
    /// was configured under. A typo in an address list must not surface
    /// as a mispriced swap later.
    pub async fn connect(&self) -> Result<(), DispatchError> {
        for (symbol, address) in &self.tokens {
            let reported = self.venue.token_symbol(address).await?;
            if !reported.eq_ignore_ascii_case(symbol) {
                return Err(DispatchError::Validation(format!(
                    "token {address} reports symbol '{reported}', configured as '{symbol}'"
                )));
            }
            let balance = self.venue.token_balance(address).await?;
            debug!("[{}] {symbol} balance: {balance}", self.label);
        }
        info!(
            "[{}] connected to {} with {} token(s)",
            self.label,
            self.venue.chain_name(),
            self.tokens.len()
        );
        Ok(())
    }

    pub async fn execute(&self, alert: &Alert) -> Result<SwapReceipt, DispatchError> {
        let _guard = self.guard.lock().await;

        if !alert.order_type.is_market() {
            return Err(DispatchError::Validation(format!(
                "{} orders are not supported on-chain, only market swaps",
                alert.order_type
            )));
        }

        let base = alert.pair.base().to_uppercase();
        let quote = alert.pair.quote().to_uppercase();
        let (spend, receive) = match alert.side {
            Side::Buy => (&quote, &base),
            Side::Sell => (&base, &quote),
        };
        let token_in = self.token_address(spend)?;
        let token_out = self.token_address(receive)?;

        let balance = self.venue.token_balance(token_in).await?;
        let amount_in = balance * alert.quantity_percent / Decimal::ONE_HUNDRED;
        if amount_in <= Decimal::ZERO {
            return Err(DispatchError::InsufficientSize);
        }

        // the alert price is quote-per-base regardless of direction
        let expected_out = match alert.side {
            Side::Buy => amount_in / alert.price,
            Side::Sell => amount_in * alert.price,
        };
        let simulated = self
            .venue
            .quote_swap(token_in, token_out, amount_in)
            .await?;

        let lower = expected_out * (Decimal::ONE - SLIPPAGE_TOLERANCE);
        let upper = expected_out * (Decimal::ONE + SLIPPAGE_TOLERANCE);
        if simulated < lower || simulated > upper {
            return Err(DispatchError::SlippageExceeded {
                expected: expected_out,
                simulated,
            });
        }

        let order = SwapOrder {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount_in,
            min_amount_out: simulated * MIN_OUT_FACTOR,
            deadline_unix: Utc::now().timestamp() + SWAP_DEADLINE_SECS,
        };

        let gas = self.venue.estimate_swap_gas(&order).await?;
        let native = self.venue.native_balance().await?;
        if native < gas {
            return Err(DispatchError::InsufficientGas {
                available: native,
                required: gas,
            });
        }

        info!(
            "[{}] swapping {amount_in} {spend} -> {receive} (min out {})",
            self.label, order.min_amount_out
        );
        let receipt = self.venue.submit_swap(&order).await?;
        Ok(receipt)
    }

    fn token_address(&self, symbol: &str) -> Result<&str, DispatchError> {
        self.tokens
            .get(symbol)
            .map(String::as_str)
            .ok_or_else(|| DispatchError::UnsupportedRoute {
                exchange: self.dex_id.clone(),
                symbol: symbol.to_string(),
            })
    }
}
