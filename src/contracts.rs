//! Tradable instrument descriptions and their decoders.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::messages::ResponseMessage;
use crate::{server_versions, Error};

/// Instrument category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityType {
    #[default]
    Stock,
    Option,
    Future,
    Index,
    FuturesOption,
    ForexPair,
    Spread,
    Warrant,
    Bond,
    Crypto,
    Fund,
    Other(String),
}

impl SecurityType {
    pub fn as_str(&self) -> &str {
        match self {
            SecurityType::Stock => "STK",
            SecurityType::Option => "OPT",
            SecurityType::Future => "FUT",
            SecurityType::Index => "IND",
            SecurityType::FuturesOption => "FOP",
            SecurityType::ForexPair => "CASH",
            SecurityType::Spread => "BAG",
            SecurityType::Warrant => "WAR",
            SecurityType::Bond => "BOND",
            SecurityType::Crypto => "CRYPTO",
            SecurityType::Fund => "FUND",
            SecurityType::Other(name) => name,
        }
    }

    pub fn from(name: &str) -> SecurityType {
        match name {
            "STK" => SecurityType::Stock,
            "OPT" => SecurityType::Option,
            "FUT" => SecurityType::Future,
            "IND" => SecurityType::Index,
            "FOP" => SecurityType::FuturesOption,
            "CASH" => SecurityType::ForexPair,
            "BAG" => SecurityType::Spread,
            "WAR" => SecurityType::Warrant,
            "BOND" => SecurityType::Bond,
            "CRYPTO" => SecurityType::Crypto,
            "FUND" => SecurityType::Fund,
            other => {
                if !other.is_empty() {
                    warn!("unknown security type: {other}");
                }
                SecurityType::Other(other.into())
            }
        }
    }
}

impl std::fmt::Display for SecurityType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Open/close semantics of a combo leg relative to the combo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboLegOpenClose {
    #[default]
    Same = 0,
    Open = 1,
    Close = 2,
    Unknown = 3,
}

impl From<i32> for ComboLegOpenClose {
    fn from(value: i32) -> Self {
        match value {
            0 => ComboLegOpenClose::Same,
            1 => ComboLegOpenClose::Open,
            2 => ComboLegOpenClose::Close,
            _ => ComboLegOpenClose::Unknown,
        }
    }
}

/// One leg of a combination order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComboLeg {
    pub contract_id: i32,
    /// Relative number of contracts for this leg.
    pub ratio: i32,
    /// BUY, SELL or SSHORT.
    pub action: String,
    pub exchange: String,
    pub open_close: ComboLegOpenClose,
    /// For stock legs when doing a short sale.
    pub short_sale_slot: i32,
    pub designated_location: String,
    pub exempt_code: i32,
}

impl Default for ComboLeg {
    fn default() -> Self {
        ComboLeg {
            contract_id: 0,
            ratio: 0,
            action: String::new(),
            exchange: String::new(),
            open_close: ComboLegOpenClose::Same,
            short_sale_slot: 0,
            designated_location: String::new(),
            exempt_code: -1,
        }
    }
}

/// Delta and price of the underlying hedging a combination order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaNeutralContract {
    pub contract_id: i32,
    pub delta: f64,
    pub price: f64,
}

/// Free-form parameter attached to orders and contract details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagValue {
    pub tag: String,
    pub value: String,
}

/// Description of a tradable instrument.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub contract_id: i32,
    pub symbol: String,
    pub security_type: SecurityType,
    /// Contract month for derivatives, or the full expiry date.
    pub last_trade_date_or_contract_month: String,
    pub last_trade_date: String,
    pub strike: f64,
    /// Option right: P or C.
    pub right: String,
    pub multiplier: String,
    pub exchange: String,
    pub primary_exchange: String,
    pub currency: String,
    pub local_symbol: String,
    pub trading_class: String,
    pub include_expired: bool,
    /// CUSIP, SEDOL, ISIN or RIC.
    pub security_id_type: String,
    pub security_id: String,
    pub description: String,
    pub issuer_id: String,
    pub combo_legs_description: String,
    pub combo_legs: Vec<ComboLeg>,
    pub delta_neutral_contract: Option<DeltaNeutralContract>,
}

impl Contract {
    /// Stock contract on the smart router, USD by default.
    pub fn stock(symbol: &str) -> Contract {
        Contract {
            symbol: symbol.into(),
            security_type: SecurityType::Stock,
            exchange: "SMART".into(),
            currency: "USD".into(),
            ..Default::default()
        }
    }
}

/// Extended instrument data returned for a contract details request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractDetails {
    pub contract: Contract,
    pub market_name: String,
    pub min_tick: f64,
    pub order_types: Vec<String>,
    pub valid_exchanges: Vec<String>,
    pub price_magnifier: i32,
    pub under_contract_id: i32,
    pub long_name: String,
    pub contract_month: String,
    pub industry: String,
    pub category: String,
    pub subcategory: String,
    pub time_zone_id: String,
    pub trading_hours: Vec<String>,
    pub liquid_hours: Vec<String>,
    pub ev_rule: String,
    pub ev_multiplier: f64,
    pub sec_id_list: Vec<TagValue>,
    pub agg_group: i32,
    pub under_symbol: String,
    pub under_security_type: String,
    pub market_rule_ids: Vec<String>,
    pub real_expiration_date: String,
    pub last_trade_time: String,
    pub stock_type: String,
    pub maturity: String,
    pub min_size: Option<f64>,
    pub size_increment: Option<f64>,
    pub suggested_size_increment: Option<f64>,
}

pub(crate) fn decode_contract_details(server_version: i32, message: &mut ResponseMessage) -> Result<ContractDetails, Error> {
    message.skip(); // message type

    let mut message_version = 8;
    if server_version < server_versions::SIZE_RULES {
        message_version = message.next_int()?;
    }

    if message_version >= 3 {
        message.skip(); // request id
    }

    let mut details = ContractDetails::default();

    details.contract.symbol = message.next_string()?;
    details.contract.security_type = SecurityType::from(&message.next_string()?);
    read_last_trade_date(&mut details, &message.next_string()?, false)?;
    details.contract.strike = message.next_double()?;
    details.contract.right = message.next_string()?;
    details.contract.exchange = message.next_string()?;
    details.contract.currency = message.next_string()?;
    details.contract.local_symbol = message.next_string()?;
    details.market_name = message.next_string()?;
    details.contract.trading_class = message.next_string()?;
    details.contract.contract_id = message.next_int()?;
    details.min_tick = message.next_double()?;
    if (server_versions::MD_SIZE_MULTIPLIER..server_versions::SIZE_RULES).contains(&server_version) {
        message.skip(); // mdSizeMultiplier, no longer used
    }
    details.contract.multiplier = message.next_string()?;
    details.order_types = split_to_vec(&message.next_string()?);
    details.valid_exchanges = split_to_vec(&message.next_string()?);
    if message_version >= 2 {
        details.price_magnifier = message.next_int()?;
    }
    if message_version >= 4 {
        details.under_contract_id = message.next_int()?;
    }
    if message_version >= 5 {
        details.long_name = message.next_string()?;
        details.contract.primary_exchange = message.next_string()?;
    }
    if message_version >= 6 {
        details.contract_month = message.next_string()?;
        details.industry = message.next_string()?;
        details.category = message.next_string()?;
        details.subcategory = message.next_string()?;
        details.time_zone_id = message.next_string()?;
        details.trading_hours = split_hours(&message.next_string()?);
        details.liquid_hours = split_hours(&message.next_string()?);
    }
    if message_version >= 8 {
        details.ev_rule = message.next_string()?;
        details.ev_multiplier = message.next_double()?;
    }
    if message_version >= 7 {
        let sec_id_list_count = message.next_int()?;
        for _ in 0..sec_id_list_count {
            let tag = message.next_string()?;
            let value = message.next_string()?;
            details.sec_id_list.push(TagValue { tag, value });
        }
    }
    if server_version >= server_versions::AGG_GROUP {
        details.agg_group = message.next_int()?;
    }
    if server_version >= server_versions::UNDERLYING_INFO {
        details.under_symbol = message.next_string()?;
        details.under_security_type = message.next_string()?;
    }
    if server_version >= server_versions::MARKET_RULES {
        details.market_rule_ids = split_to_vec(&message.next_string()?);
    }
    if server_version >= server_versions::REAL_EXPIRATION_DATE {
        details.real_expiration_date = message.next_string()?;
    }
    if server_version >= server_versions::STOCK_TYPE {
        details.stock_type = message.next_string()?;
    }
    if (server_versions::FRACTIONAL_SIZE_SUPPORT..server_versions::SIZE_RULES).contains(&server_version) {
        message.skip(); // sizeMinTick, no longer used
    }
    if server_version >= server_versions::SIZE_RULES {
        details.min_size = message.next_optional_decimal()?;
        details.size_increment = message.next_optional_decimal()?;
        details.suggested_size_increment = message.next_optional_decimal()?;
    }

    Ok(details)
}

fn split_hours(hours: &str) -> Vec<String> {
    hours.split(';').map(|s| s.to_string()).collect()
}

fn split_to_vec(s: &str) -> Vec<String> {
    s.split(',').map(|s| s.to_string()).collect()
}

// Expiry arrives as "date", "date time" or "date-time-timezone" for bonds.
fn read_last_trade_date(details: &mut ContractDetails, last_trade_date_or_contract_month: &str, is_bond: bool) -> Result<(), Error> {
    if last_trade_date_or_contract_month.is_empty() {
        return Ok(());
    }

    let parts: Vec<&str> = if last_trade_date_or_contract_month.contains('-') {
        last_trade_date_or_contract_month.split('-').collect()
    } else {
        last_trade_date_or_contract_month.split(' ').collect()
    };

    if !parts.is_empty() {
        if is_bond {
            details.maturity = parts[0].to_string();
        } else {
            details.contract.last_trade_date_or_contract_month = parts[0].to_string();
        }
    }
    if parts.len() > 1 {
        details.last_trade_time = parts[1].to_string();
    }
    if is_bond && parts.len() > 2 {
        details.time_zone_id = parts[2].to_string();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const CONTRACT_DETAILS: &str = "10\
|9001|TSLA|STK|20250620 15:00:00|0||SMART|USD|TSLA|NMS|NMS|76792991|0.01|\
100|ACTIVETIM,AD|SMART,AMEX,NYSE|1|0|TESLA INC|NASDAQ||Consumer|Auto|Auto Manufacturers|\
US/Eastern|20221229:0400-20221229:2000|20221229:0930-20221229:1600||0|\
1|ISIN|US88160R1014|1|||26,26,26|20250620|COMMON|100|0.0001|100|";

    #[test]
    fn test_decode_contract_details() {
        let mut message = ResponseMessage::from_simple(CONTRACT_DETAILS);

        let details = decode_contract_details(server_versions::SIZE_RULES, &mut message).unwrap();

        assert_eq!(details.contract.symbol, "TSLA");
        assert_eq!(details.contract.security_type, SecurityType::Stock);
        assert_eq!(details.contract.last_trade_date_or_contract_month, "20250620");
        assert_eq!(details.last_trade_time, "15:00:00");
        assert_eq!(details.contract.exchange, "SMART");
        assert_eq!(details.contract.currency, "USD");
        assert_eq!(details.market_name, "NMS");
        assert_eq!(details.contract.trading_class, "NMS");
        assert_eq!(details.contract.contract_id, 76792991);
        assert_eq!(details.min_tick, 0.01);
        assert_eq!(details.contract.multiplier, "100");
        assert_eq!(details.order_types, vec!["ACTIVETIM", "AD"]);
        assert_eq!(details.valid_exchanges, vec!["SMART", "AMEX", "NYSE"]);
        assert_eq!(details.price_magnifier, 1);
        assert_eq!(details.long_name, "TESLA INC");
        assert_eq!(details.contract.primary_exchange, "NASDAQ");
        assert_eq!(details.industry, "Consumer");
        assert_eq!(details.time_zone_id, "US/Eastern");
        assert_eq!(details.ev_multiplier, 0.0);
        assert_eq!(details.sec_id_list, vec![TagValue { tag: "ISIN".into(), value: "US88160R1014".into() }]);
        assert_eq!(details.agg_group, 1);
        assert_eq!(details.under_symbol, "");
        assert_eq!(details.market_rule_ids, vec!["26", "26", "26"]);
        assert_eq!(details.real_expiration_date, "20250620");
        assert_eq!(details.stock_type, "COMMON");
        assert_eq!(details.min_size, Some(100.0));
        assert_eq!(details.size_increment, Some(0.0001));
        assert_eq!(details.suggested_size_increment, Some(100.0));
    }

    #[test]
    fn test_security_type_round_trip() {
        for name in ["STK", "OPT", "FUT", "IND", "FOP", "CASH", "BAG", "WAR", "BOND", "CRYPTO", "FUND"] {
            assert_eq!(SecurityType::from(name).as_str(), name);
        }
        assert_eq!(SecurityType::from("CMDTY"), SecurityType::Other("CMDTY".into()));
    }

    #[test]
    fn test_combo_leg_default_exempt_code() {
        assert_eq!(ComboLeg::default().exempt_code, -1);
    }

    #[test]
    fn test_stock_constructor() {
        let contract = Contract::stock("AAPL");
        assert_eq!(contract.symbol, "AAPL");
        assert_eq!(contract.security_type, SecurityType::Stock);
        assert_eq!(contract.exchange, "SMART");
        assert_eq!(contract.currency, "USD");
    }
}
