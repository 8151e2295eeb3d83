//! Percentage-to-contracts sizing
//!
//! Pure arithmetic, no venue calls. The caller decides which balance or
//! position figure to size against; these functions only do the math.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Divisor for opening sizes. The extra 0.5% over a straight percentage
/// leaves headroom for fees, so a 100% alert never overdraws the account.
const OPEN_DIVISOR: Decimal = dec!(100.5);

/// Contracts to open: the percentage of the free quote balance, converted
/// at the given price, with fee headroom.
pub fn open_contracts(free_quote: Decimal, price: Decimal, percent: Decimal) -> Decimal {
    free_quote / price * percent / OPEN_DIVISOR
}

/// Contracts to close: the percentage of the current position. Sign of
/// the position is irrelevant, only its magnitude is closed.
pub fn close_contracts(position: Decimal, percent: Decimal) -> Decimal {
    position.abs() * percent / Decimal::ONE_HUNDRED
}

/// Floors a quantity to a market's amount precision. Always rounds toward
/// zero so the order never exceeds what the sizing allows.
pub fn floor_to_precision(quantity: Decimal, precision: u32) -> Decimal {
    quantity.trunc_with_scale(precision)
}
