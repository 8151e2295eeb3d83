//! Courier core domain types
//!
//! Shared vocabulary for the alert execution engine:
//! - **Alerts**: the raw transport payload and its validated, strongly-typed
//!   form. Alerts are trade instructions, not strategy signals - they arrive
//!   already decided and are immutable once accepted.
//! - **Pairs**: base/quote trading pair identity, including the settle-suffix
//!   form used by perpetual symbols.
//! - **Orders**: venue-neutral order tickets, swap orders, and the opaque
//!   receipts venues return.
//! - **Reports**: one `OrderReport` per (alert, account) pair - the only
//!   output the engine produces.
//! - **Errors**: the `DispatchError` taxonomy. Every error is local to its
//!   (alert, account) pair; nothing in this crate is fatal to the process.

pub mod alert;
pub mod error;
pub mod order;
pub mod pair;
pub mod report;

// Re-export main types
pub use alert::{Alert, AlertBatch, PositionTag, RawAlert};
pub use error::DispatchError;
pub use order::{
    AlertOrderType, ExecutionReceipt, OrderKind, OrderTicket, Side, SwapOrder, SwapReceipt,
};
pub use pair::Pair;
pub use report::{OrderOutcome, OrderReport};
