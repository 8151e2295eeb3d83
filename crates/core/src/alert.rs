//! Alert payloads
//!
//! `RawAlert` mirrors the wire JSON field-for-field, everything optional so a
//! malformed message deserializes and fails validation with a reason instead
//! of a serde error. `Alert` is the validated form the engine works with.
//! Validation happens once at the dispatch boundary; past it, fields are
//! well-typed and non-optional.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::order::{AlertOrderType, Side};
use crate::pair::Pair;

/// The envelope alert batches arrive in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertBatch {
    pub data: Vec<RawAlert>,
}

/// One alert exactly as it came off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAlert {
    pub symbol: Option<String>,
    pub exchange: Option<String>,
    pub side: Option<String>,
    pub order_type: Option<String>,
    #[serde(rename = "qty_perc")]
    pub quantity_percent: Option<Decimal>,
    pub price: Option<Decimal>,
    #[serde(rename = "reduceOnly", default)]
    pub reduce_only: Option<bool>,
    #[serde(rename = "stopPrice")]
    pub stop_price: Option<Decimal>,
    pub comment: Option<String>,
}

/// The comment tag alerts carry to describe their position intent.
/// Drives post-trade reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionTag {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
    SetTakeProfit,
    Other(String),
}

impl PositionTag {
    pub fn parse(comment: &str) -> Self {
        match comment.trim().to_lowercase().as_str() {
            "openlong" => PositionTag::OpenLong,
            "openshort" => PositionTag::OpenShort,
            "closelong" => PositionTag::CloseLong,
            "closeshort" => PositionTag::CloseShort,
            "set take profit" => PositionTag::SetTakeProfit,
            _ => PositionTag::Other(comment.trim().to_string()),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, PositionTag::OpenLong | PositionTag::OpenShort)
    }

    pub fn is_close(&self) -> bool {
        matches!(
            self,
            PositionTag::CloseLong | PositionTag::CloseShort | PositionTag::SetTakeProfit
        )
    }
}

/// A validated alert. Construction via `TryFrom<&RawAlert>` is the only
/// path, so holding one means every field constraint already passed.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub pair: Pair,
    pub exchange: String,
    pub side: Side,
    pub order_type: AlertOrderType,
    /// Percentage of the relevant balance or position, in (0, 100].
    pub quantity_percent: Decimal,
    pub price: Decimal,
    pub reduce_only: bool,
    /// Trigger price for stop orders. A wire value of zero means "no stop".
    pub stop_price: Option<Decimal>,
    pub tag: PositionTag,
}

fn required<T>(field: Option<T>, name: &str) -> Result<T, DispatchError> {
    field.ok_or_else(|| DispatchError::Validation(format!("missing field '{name}'")))
}

impl TryFrom<&RawAlert> for Alert {
    type Error = DispatchError;

    fn try_from(raw: &RawAlert) -> Result<Self, Self::Error> {
        let symbol = required(raw.symbol.as_deref(), "symbol")?;
        let pair = Pair::parse(symbol)?;

        let exchange = required(raw.exchange.as_deref(), "exchange")?
            .trim()
            .to_lowercase();
        if exchange.is_empty() {
            return Err(DispatchError::Validation("empty exchange".to_string()));
        }

        let side = match required(raw.side.as_deref(), "side")?.trim().to_lowercase().as_str() {
            "buy" => Side::Buy,
            "sell" => Side::Sell,
            other => {
                return Err(DispatchError::Validation(format!(
                    "unknown side '{other}'"
                )));
            }
        };

        let order_type = match required(raw.order_type.as_deref(), "order_type")?.trim() {
            "market" => AlertOrderType::Market,
            "limit" => AlertOrderType::Limit,
            "stopLimit" => AlertOrderType::StopLimit,
            other => {
                return Err(DispatchError::Validation(format!(
                    "unknown order type '{other}'"
                )));
            }
        };

        let quantity_percent = required(raw.quantity_percent, "qty_perc")?;
        if quantity_percent <= Decimal::ZERO || quantity_percent > Decimal::ONE_HUNDRED {
            return Err(DispatchError::Validation(format!(
                "qty_perc {quantity_percent} outside (0, 100]"
            )));
        }

        let price = required(raw.price, "price")?;
        if price <= Decimal::ZERO {
            return Err(DispatchError::Validation(format!(
                "non-positive price {price}"
            )));
        }

        let stop_price = raw.stop_price.filter(|p| !p.is_zero());
        if let Some(stop) = stop_price {
            if stop < Decimal::ZERO {
                return Err(DispatchError::Validation(format!(
                    "negative stop price {stop}"
                )));
            }
        }

        let comment = required(raw.comment.as_deref(), "comment")?;

        Ok(Alert {
            pair,
            exchange,
            side,
            order_type,
            quantity_percent,
            price,
            reduce_only: required(raw.reduce_only, "reduceOnly")?,
            stop_price,
            tag: PositionTag::parse(comment),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw() -> RawAlert {
        RawAlert {
            symbol: Some("BTC/USDT".to_string()),
            exchange: Some("binance".to_string()),
            side: Some("buy".to_string()),
            order_type: Some("market".to_string()),
            quantity_percent: Some(dec!(50)),
            price: Some(dec!(95000)),
            reduce_only: Some(false),
            stop_price: None,
            comment: Some("openlong".to_string()),
        }
    }

    #[test]
    fn test_valid_alert_converts() {
        let alert = Alert::try_from(&raw()).unwrap();
        assert_eq!(alert.pair.symbol(), "BTC/USDT");
        assert_eq!(alert.side, Side::Buy);
        assert_eq!(alert.order_type, AlertOrderType::Market);
        assert_eq!(alert.quantity_percent, dec!(50));
        assert_eq!(alert.tag, PositionTag::OpenLong);
        assert!(!alert.reduce_only);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let strips: [fn(&mut RawAlert); 8] = [
            |r| r.symbol = None,
            |r| r.exchange = None,
            |r| r.side = None,
            |r| r.order_type = None,
            |r| r.quantity_percent = None,
            |r| r.price = None,
            |r| r.reduce_only = None,
            |r| r.comment = None,
        ];
        for strip in strips {
            let mut bad = raw();
            strip(&mut bad);
            assert!(matches!(
                Alert::try_from(&bad),
                Err(DispatchError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_percent_bounds() {
        let mut bad = raw();
        bad.quantity_percent = Some(dec!(0));
        assert!(Alert::try_from(&bad).is_err());
        bad.quantity_percent = Some(dec!(100.5));
        assert!(Alert::try_from(&bad).is_err());
        bad.quantity_percent = Some(dec!(100));
        assert!(Alert::try_from(&bad).is_ok());
    }

    #[test]
    fn test_close_alert_missing_reduce_only_flag_is_rejected() {
        // a close whose reduceOnly was dropped in transit must not be
        // allowed to fall through as an entry
        let mut a = raw();
        a.side = Some("sell".to_string());
        a.reduce_only = None;
        a.comment = Some("closelong".to_string());
        assert!(matches!(
            Alert::try_from(&a),
            Err(DispatchError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_stop_price_means_no_stop() {
        let mut a = raw();
        a.stop_price = Some(dec!(0));
        assert_eq!(Alert::try_from(&a).unwrap().stop_price, None);
        a.stop_price = Some(dec!(94000));
        assert_eq!(Alert::try_from(&a).unwrap().stop_price, Some(dec!(94000)));
    }

    #[test]
    fn test_unknown_comment_keeps_text() {
        let mut a = raw();
        a.comment = Some("rebalance".to_string());
        assert_eq!(
            Alert::try_from(&a).unwrap().tag,
            PositionTag::Other("rebalance".to_string())
        );
    }

    #[test]
    fn test_wire_field_names() {
        let json = r#"{
            "symbol": "ETH/USD:USD",
            "exchange": "phemex",
            "side": "sell",
            "order_type": "stopLimit",
            "qty_perc": 25,
            "price": 4400,
            "reduceOnly": true,
            "stopPrice": 4500,
            "comment": "closelong"
        }"#;
        let raw: RawAlert = serde_json::from_str(json).unwrap();
        let alert = Alert::try_from(&raw).unwrap();
        assert_eq!(alert.order_type, AlertOrderType::StopLimit);
        assert!(alert.reduce_only);
        assert_eq!(alert.stop_price, Some(dec!(4500)));
        assert_eq!(alert.pair.quote(), "USD");
    }
}
