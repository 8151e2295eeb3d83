//! On-chain swap capability

use async_trait::async_trait;
use rust_decimal::Decimal;

use courier_core::{SwapOrder, SwapReceipt};

use crate::error::VenueResult;

/// One wallet plus swap router on a chain.
///
/// Tokens are addressed by their contract address; symbol resolution is
/// the caller's concern (verified once at startup via `token_symbol`).
#[async_trait]
pub trait ChainVenue: Send + Sync {
    /// Chain identifier for logs and reports, e.g. "uniswap".
    fn chain_name(&self) -> &str;

    /// Wallet balance of the native (gas) currency.
    async fn native_balance(&self) -> VenueResult<Decimal>;

    async fn token_balance(&self, token_address: &str) -> VenueResult<Decimal>;

    /// Symbol the token contract reports for itself.
    async fn token_symbol(&self, token_address: &str) -> VenueResult<String>;

    /// Simulated output of swapping `amount_in` of `token_in` for
    /// `token_out` at current pool state. No state change.
    async fn quote_swap(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: Decimal,
    ) -> VenueResult<Decimal>;

    /// Estimated gas cost of the swap in the native currency.
    async fn estimate_swap_gas(&self, order: &SwapOrder) -> VenueResult<Decimal>;

    /// Signs and submits the swap transaction.
    async fn submit_swap(&self, order: &SwapOrder) -> VenueResult<SwapReceipt>;
}
