//! Venue capability traits
//!
//! The engine talks to venues only through these traits:
//! - `ExchangeVenue`: a centralized exchange account (balances, positions,
//!   markets, orders).
//! - `ChainVenue`: an on-chain wallet plus router (token balances, swap
//!   quotes, gas estimates, swap submission).
//!
//! Implementations live outside this crate. Tests use the in-memory ones
//! from `courier-venue-sim`.

pub mod chain;
pub mod error;
pub mod exchange;

pub use chain::ChainVenue;
pub use error::{VenueError, VenueResult};
pub use exchange::{BalanceSnapshot, ExchangeVenue, MarketSpec};
