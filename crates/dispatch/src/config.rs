//! Account configuration
//!
//! Declarative descriptors for every account the dispatcher should route
//! to, loaded from one JSON document. Credentials stay opaque strings
//! here; venue implementations interpret them.

use std::collections::HashMap;

use serde::Deserialize;

use courier_core::DispatchError;

#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
    #[serde(default)]
    pub cex: Vec<CexAccountConfig>,
    #[serde(default)]
    pub dex: Vec<DexAccountConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CexAccountConfig {
    /// Exchange identifier alerts route on, e.g. "binance".
    pub exchange: String,
    pub subaccount: Option<String>,
    /// Point the venue at its testnet instead of production.
    #[serde(default)]
    pub test_mode: bool,
    /// Symbols this account trades, in BASE/QUOTE form.
    pub pairs: Vec<String>,
    pub api_key: String,
    pub secret: String,
}

impl CexAccountConfig {
    /// Stable label for logs and reports.
    pub fn label(&self) -> String {
        match &self.subaccount {
            Some(subaccount) => format!("{}:{}", self.exchange, subaccount),
            None => self.exchange.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexAccountConfig {
    /// Wallet label for logs and reports.
    pub client_name: String,
    /// DEX identifier alerts route on, e.g. "uniswap".
    pub dex: String,
    pub public_key: String,
    pub private_key: String,
    /// Token symbol to contract address. Every pairwise combination of
    /// these tokens is a tradable route.
    pub tokens: HashMap<String, String>,
}

impl AccountsConfig {
    pub fn from_json(payload: &str) -> Result<Self, DispatchError> {
        serde_json::from_str(payload)
            .map_err(|err| DispatchError::Validation(format!("bad accounts config: {err}")))
    }
}
