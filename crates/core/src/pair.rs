//! Trading pair identity
//!
//! Symbols arrive in `BASE/QUOTE` form, with perpetual markets carrying a
//! settle suffix (`BTC/USD:USD`). The quote currency is whatever follows the
//! `:` when present, otherwise whatever follows the `/`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// A base/quote trading pair parsed from an alert symbol.
///
/// The original symbol string is preserved so venue calls can send it
/// back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    symbol: String,
    base: String,
    quote: String,
}

impl Pair {
    /// Parses a `BASE/QUOTE` or `BASE/QUOTE:SETTLE` symbol.
    pub fn parse(symbol: &str) -> Result<Self, DispatchError> {
        let trimmed = symbol.trim();
        let (head, settle) = match trimmed.split_once(':') {
            Some((head, settle)) if !settle.is_empty() => (head, Some(settle)),
            Some(_) => {
                return Err(DispatchError::Validation(format!(
                    "symbol '{symbol}' has an empty settle currency"
                )));
            }
            None => (trimmed, None),
        };

        let (base, slash_quote) = head.split_once('/').ok_or_else(|| {
            DispatchError::Validation(format!("symbol '{symbol}' is not in BASE/QUOTE form"))
        })?;
        if base.is_empty() || slash_quote.is_empty() {
            return Err(DispatchError::Validation(format!(
                "symbol '{symbol}' has an empty base or quote"
            )));
        }

        Ok(Pair {
            symbol: trimmed.to_string(),
            base: base.to_string(),
            quote: settle.unwrap_or(slash_quote).to_string(),
        })
    }

    /// The full symbol as it arrived, settle suffix included.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The currency balances are spent and received in. For settle-suffixed
    /// symbols this is the settle currency, not the slash quote.
    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spot_symbol() {
        let pair = Pair::parse("BTC/USDT").unwrap();
        assert_eq!(pair.base(), "BTC");
        assert_eq!(pair.quote(), "USDT");
        assert_eq!(pair.symbol(), "BTC/USDT");
    }

    #[test]
    fn test_settle_suffix_overrides_quote() {
        let pair = Pair::parse("BTC/USD:USD").unwrap();
        assert_eq!(pair.base(), "BTC");
        assert_eq!(pair.quote(), "USD");
        assert_eq!(pair.symbol(), "BTC/USD:USD");

        let pair = Pair::parse("ETH/USD:BTC").unwrap();
        assert_eq!(pair.quote(), "BTC");
    }

    #[test]
    fn test_rejects_malformed_symbols() {
        assert!(Pair::parse("BTCUSDT").is_err());
        assert!(Pair::parse("/USDT").is_err());
        assert!(Pair::parse("BTC/").is_err());
        assert!(Pair::parse("BTC/USD:").is_err());
        assert!(Pair::parse("").is_err());
    }
}
