//! Account registry
//!
//! Uniform handle over the two executor kinds plus the lookup the
//! dispatcher routes with. An alert matching zero accounts is a routing
//! miss, not a registry error; the dispatcher reports it per alert.

use std::sync::Arc;

use log::{info, warn};

use courier_core::{Alert, OrderReport, RawAlert};
use courier_engine::{CexExecutor, DexExecutor};

#[derive(Clone)]
pub enum AccountHandle {
    Cex(Arc<CexExecutor>),
    Dex(Arc<DexExecutor>),
}

impl AccountHandle {
    pub fn label(&self) -> &str {
        match self {
            AccountHandle::Cex(executor) => executor.label(),
            AccountHandle::Dex(executor) => executor.label(),
        }
    }

    pub fn supports(&self, alert: &Alert) -> bool {
        match self {
            AccountHandle::Cex(executor) => executor.supports(&alert.exchange, &alert.pair),
            AccountHandle::Dex(executor) => {
                executor.supports(&alert.exchange, alert.pair.base(), alert.pair.quote())
            }
        }
    }

    /// Runs the alert on this account and folds the result into a report.
    /// Failures never escape; they become rejection reports.
    pub async fn execute(&self, alert: &Alert, raw: &RawAlert) -> OrderReport {
        let result = match self {
            AccountHandle::Cex(executor) => executor
                .execute(alert)
                .await
                .map(|receipt| OrderReport::submitted(executor.label(), raw.clone(), receipt)),
            AccountHandle::Dex(executor) => executor
                .execute(alert)
                .await
                .map(|receipt| OrderReport::swapped(executor.label(), raw.clone(), receipt)),
        };
        result.unwrap_or_else(|err| {
            // protective gates are expected no-ops, not faults
            if err.is_protective() {
                info!("[{}] alert skipped: {err}", self.label());
            } else {
                warn!("[{}] alert rejected: {err}", self.label());
            }
            OrderReport::rejected(Some(self.label()), raw.clone(), &err)
        })
    }
}

#[derive(Clone, Default)]
pub struct AccountRegistry {
    accounts: Vec<AccountHandle>,
}

impl AccountRegistry {
    pub fn new(accounts: Vec<AccountHandle>) -> Self {
        AccountRegistry { accounts }
    }

    pub fn push(&mut self, account: AccountHandle) {
        self.accounts.push(account);
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Every account that trades the alert's route. Empty means no
    /// account was configured for it.
    pub fn resolve(&self, alert: &Alert) -> Vec<AccountHandle> {
        self.accounts
            .iter()
            .filter(|account| account.supports(alert))
            .cloned()
            .collect()
    }
}
