//! Courier execution engine
//!
//! Turns validated alerts into venue orders:
//! - `sizing`: pure percentage-to-contracts arithmetic.
//! - `state`: the per-account snapshot of balances, positions, and
//!   market precision.
//! - `cex`: the centralized-exchange executor (size, classify, submit,
//!   reconcile under one account lock).
//! - `dex`: the on-chain swap executor (simulation-gated, gas-checked).

pub mod cex;
pub mod dex;
pub mod sizing;
pub mod state;

pub use cex::CexExecutor;
pub use dex::DexExecutor;
pub use state::AccountState;
