//! Batch fan-out
//!
//! One batch in, one report per (alert, account) out. Alerts for the same
//! account run in arrival order on a single task with a pacing delay
//! between orders; different accounts run concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::sync::mpsc;
use tokio::time::sleep;

use courier_core::{Alert, AlertBatch, DispatchError, OrderReport, RawAlert};

use crate::feed::AlertFeed;
use crate::registry::{AccountHandle, AccountRegistry};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Pause after each order on the same account, so a burst of alerts
    /// does not trip venue rate limits.
    pub inter_order_delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            inter_order_delay: Duration::from_secs(2),
        }
    }
}

pub struct Dispatcher {
    registry: Arc<AccountRegistry>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<AccountRegistry>, config: DispatcherConfig) -> Self {
        Dispatcher { registry, config }
    }

    /// Processes one batch to completion and returns all reports.
    pub async fn dispatch(&self, batch: &AlertBatch) -> Vec<OrderReport> {
        let mut reports = Vec::new();
        let mut queues: HashMap<String, Vec<(AccountHandle, Alert, RawAlert)>> = HashMap::new();

        for raw in &batch.data {
            let alert = match Alert::try_from(raw) {
                Ok(alert) => alert,
                Err(err) => {
                    reports.push(OrderReport::rejected(None, raw.clone(), &err));
                    continue;
                }
            };
            let accounts = self.registry.resolve(&alert);
            if accounts.is_empty() {
                let err = DispatchError::UnsupportedRoute {
                    exchange: alert.exchange.clone(),
                    symbol: alert.pair.symbol().to_string(),
                };
                reports.push(OrderReport::rejected(None, raw.clone(), &err));
                continue;
            }
            for account in accounts {
                queues
                    .entry(account.label().to_string())
                    .or_default()
                    .push((account, alert.clone(), raw.clone()));
            }
        }

        let mut tasks = Vec::with_capacity(queues.len());
        for (label, queue) in queues {
            let delay = self.config.inter_order_delay;
            tasks.push(tokio::spawn(async move {
                let total = queue.len();
                let mut out = Vec::with_capacity(total);
                for (index, (account, alert, raw)) in queue.into_iter().enumerate() {
                    out.push(account.execute(&alert, &raw).await);
                    // pacing only matters between orders
                    if index + 1 < total {
                        sleep(delay).await;
                    }
                }
                info!("[{label}] processed {} alert(s)", out.len());
                out
            }));
        }
        for task in tasks {
            match task.await {
                Ok(mut out) => reports.append(&mut out),
                Err(err) => error!("account task panicked: {err}"),
            }
        }
        reports
    }

    /// Drains the feed until it closes, forwarding every report.
    pub async fn run(&self, mut feed: AlertFeed, reports: mpsc::Sender<OrderReport>) {
        while let Some(batch) = feed.recv().await {
            for report in self.dispatch(&batch).await {
                if reports.send(report).await.is_err() {
                    info!("report receiver dropped, dispatcher stopping");
                    return;
                }
            }
        }
        info!("alert feed closed, dispatcher stopping");
    }
}
