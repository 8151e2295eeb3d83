//! In-memory venues for tests
//!
//! `SimExchange` and `SimChain` implement the venue ports against dashmap
//! state, with failure injection and optional per-order latency so callers
//! can exercise error paths and concurrency behavior deterministically.

pub mod chain;
pub mod exchange;

pub use chain::SimChain;
pub use exchange::SimExchange;
