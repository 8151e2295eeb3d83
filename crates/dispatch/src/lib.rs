//! Alert dispatch
//!
//! The outer layer of the engine: receives alert batches from a feed,
//! validates and routes each alert to every account that trades its
//! (exchange, pair) route, and fans execution out - sequential within an
//! account, concurrent across accounts. Produces one `OrderReport` per
//! (alert, account) pair.

pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod feed;
pub mod registry;

pub use bootstrap::build_registry;
pub use config::{AccountsConfig, CexAccountConfig, DexAccountConfig};
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use feed::AlertFeed;
pub use registry::{AccountHandle, AccountRegistry};
