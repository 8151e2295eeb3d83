//! Registry construction
//!
//! Builds and connects every configured account. Venue construction is
//! injected through factories, so wiring is identical whether the venues
//! are live clients or the in-memory sims.

use std::sync::Arc;

use log::info;

use courier_core::{DispatchError, Pair};
use courier_engine::{CexExecutor, DexExecutor};
use courier_ports::{ChainVenue, ExchangeVenue};

use crate::config::{AccountsConfig, CexAccountConfig, DexAccountConfig};
use crate::registry::{AccountHandle, AccountRegistry};

pub type ExchangeFactory = dyn Fn(&CexAccountConfig) -> Arc<dyn ExchangeVenue> + Send + Sync;
pub type ChainFactory = dyn Fn(&DexAccountConfig) -> Arc<dyn ChainVenue> + Send + Sync;

/// Connects every account in the config and returns the populated
/// registry. A failing account fails the whole bootstrap; better to not
/// start than to silently trade on a subset.
pub async fn build_registry(
    config: &AccountsConfig,
    exchange_factory: &ExchangeFactory,
    chain_factory: &ChainFactory,
) -> Result<AccountRegistry, DispatchError> {
    let mut registry = AccountRegistry::default();

    for account in &config.cex {
        let pairs = account
            .pairs
            .iter()
            .map(|symbol| Pair::parse(symbol))
            .collect::<Result<Vec<_>, _>>()?;
        let mut executor = CexExecutor::new(
            &account.label(),
            &account.exchange,
            exchange_factory(account),
            pairs,
        );
        executor.connect().await?;
        registry.push(AccountHandle::Cex(Arc::new(executor)));
    }

    for account in &config.dex {
        let executor = DexExecutor::new(
            &account.client_name,
            &account.dex,
            chain_factory(account),
            account.tokens.clone(),
        );
        executor.connect().await?;
        registry.push(AccountHandle::Dex(Arc::new(executor)));
    }

    info!("registry ready with {} account(s)", registry.len());
    Ok(registry)
}
