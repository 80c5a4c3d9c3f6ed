//! Conditions that trigger submission or cancellation of an order.
//!
//! Conditions arrive as a count-prefixed list. Each entry starts with an
//! integer discriminator followed by a variant specific field sequence, so
//! decoding is per variant and consumes a known number of tokens.

use serde::{Deserialize, Serialize};

use crate::messages::{RequestMessage, ResponseMessage};
use crate::Error;

const CONJUNCTION_AND: &str = "a";
const CONJUNCTION_OR: &str = "o";

/// Order condition as a tagged sum. The discriminator values are fixed by the
/// wire protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OrderCondition {
    Price(PriceCondition),
    Time(TimeCondition),
    Margin(MarginCondition),
    Execution(ExecutionCondition),
    Volume(VolumeCondition),
    PercentChange(PercentChangeCondition),
}

impl OrderCondition {
    /// Wire discriminator for this condition.
    pub fn condition_type(&self) -> i32 {
        match self {
            OrderCondition::Price(_) => 1,
            OrderCondition::Time(_) => 3,
            OrderCondition::Margin(_) => 4,
            OrderCondition::Execution(_) => 5,
            OrderCondition::Volume(_) => 6,
            OrderCondition::PercentChange(_) => 7,
        }
    }

    /// Whether this condition is AND-connected to the next one.
    pub fn is_conjunction(&self) -> bool {
        match self {
            OrderCondition::Price(c) => c.is_conjunction,
            OrderCondition::Time(c) => c.is_conjunction,
            OrderCondition::Margin(c) => c.is_conjunction,
            OrderCondition::Execution(c) => c.is_conjunction,
            OrderCondition::Volume(c) => c.is_conjunction,
            OrderCondition::PercentChange(c) => c.is_conjunction,
        }
    }

    /// Decode the fields following an already consumed discriminator.
    pub(crate) fn decode(condition_type: i32, message: &mut ResponseMessage) -> Result<OrderCondition, Error> {
        let is_conjunction = message.next_string()? == CONJUNCTION_AND;

        match condition_type {
            1 => {
                let is_more = message.next_bool()?;
                let price = message.next_string()?.parse::<f64>()?;
                let contract_id = message.next_int()?;
                let exchange = message.next_string()?;
                let trigger_method = message.next_int()?;
                Ok(OrderCondition::Price(PriceCondition {
                    is_conjunction,
                    is_more,
                    price,
                    contract_id,
                    exchange,
                    trigger_method,
                }))
            }
            3 => {
                let is_more = message.next_bool()?;
                let time = message.next_string()?;
                Ok(OrderCondition::Time(TimeCondition {
                    is_conjunction,
                    is_more,
                    time,
                }))
            }
            4 => {
                let is_more = message.next_bool()?;
                let percent = message.next_string()?.parse::<i32>()?;
                Ok(OrderCondition::Margin(MarginCondition {
                    is_conjunction,
                    is_more,
                    percent,
                }))
            }
            5 => {
                let security_type = message.next_string()?;
                let exchange = message.next_string()?;
                let symbol = message.next_string()?;
                Ok(OrderCondition::Execution(ExecutionCondition {
                    is_conjunction,
                    security_type,
                    exchange,
                    symbol,
                }))
            }
            6 => {
                let is_more = message.next_bool()?;
                let volume = message.next_string()?.parse::<i32>()?;
                let contract_id = message.next_int()?;
                let exchange = message.next_string()?;
                Ok(OrderCondition::Volume(VolumeCondition {
                    is_conjunction,
                    is_more,
                    volume,
                    contract_id,
                    exchange,
                }))
            }
            7 => {
                let is_more = message.next_bool()?;
                let change_percent = message.next_string()?.parse::<f64>()?;
                let contract_id = message.next_int()?;
                let exchange = message.next_string()?;
                Ok(OrderCondition::PercentChange(PercentChangeCondition {
                    is_conjunction,
                    is_more,
                    change_percent,
                    contract_id,
                    exchange,
                }))
            }
            _ => Err(Error::Simple(format!("unsupported condition type: {condition_type}"))),
        }
    }

    /// Append this condition's fields, discriminator excluded, to a message.
    pub(crate) fn encode(&self, message: &mut RequestMessage) {
        let conjunction = if self.is_conjunction() { CONJUNCTION_AND } else { CONJUNCTION_OR };
        message.push_field(&conjunction);

        match self {
            OrderCondition::Price(c) => {
                message.push_field(&c.is_more);
                message.push_field(&c.price.to_string());
                message.push_field(&c.contract_id);
                message.push_field(&c.exchange.as_str());
                message.push_field(&c.trigger_method);
            }
            OrderCondition::Time(c) => {
                message.push_field(&c.is_more);
                message.push_field(&c.time.as_str());
            }
            OrderCondition::Margin(c) => {
                message.push_field(&c.is_more);
                message.push_field(&c.percent.to_string());
            }
            OrderCondition::Execution(c) => {
                message.push_field(&c.security_type.as_str());
                message.push_field(&c.exchange.as_str());
                message.push_field(&c.symbol.as_str());
            }
            OrderCondition::Volume(c) => {
                message.push_field(&c.is_more);
                message.push_field(&c.volume.to_string());
                message.push_field(&c.contract_id);
                message.push_field(&c.exchange.as_str());
            }
            OrderCondition::PercentChange(c) => {
                message.push_field(&c.is_more);
                message.push_field(&c.change_percent.to_string());
                message.push_field(&c.contract_id);
                message.push_field(&c.exchange.as_str());
            }
        }
    }
}

/// Triggers when the price of an instrument crosses a threshold.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceCondition {
    pub is_conjunction: bool,
    pub is_more: bool,
    pub price: f64,
    pub contract_id: i32,
    pub exchange: String,
    pub trigger_method: i32,
}

/// Triggers before or after a point in time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeCondition {
    pub is_conjunction: bool,
    pub is_more: bool,
    /// "YYYYMMDD HH:MM:SS" gateway time.
    pub time: String,
}

/// Triggers on the account margin cushion percentage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginCondition {
    pub is_conjunction: bool,
    pub is_more: bool,
    pub percent: i32,
}

/// Triggers when an execution for the matching instrument occurs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionCondition {
    pub is_conjunction: bool,
    pub security_type: String,
    pub exchange: String,
    pub symbol: String,
}

/// Triggers on traded volume of an instrument.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeCondition {
    pub is_conjunction: bool,
    pub is_more: bool,
    pub volume: i32,
    pub contract_id: i32,
    pub exchange: String,
}

/// Triggers on the daily percent change of an instrument.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentChangeCondition {
    pub is_conjunction: bool,
    pub is_more: bool,
    pub change_percent: f64,
    pub contract_id: i32,
    pub exchange: String,
}
