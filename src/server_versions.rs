//! Protocol history as minimum server version constants.
//!
//! Each constant names the server version that introduced a capability or a
//! wire layout change. Decoders compare the negotiated server version against
//! these thresholds to decide which fields are present. The values are part of
//! the wire protocol and must never be edited.

pub const REAL_TIME_BARS: i32 = 34;
pub const SCALE_ORDERS: i32 = 35;
pub const SSHORT_COMBO_LEGS: i32 = 35;
pub const WHAT_IF_ORDERS: i32 = 36;
pub const CONTRACT_CONID: i32 = 37;
pub const PTA_ORDERS: i32 = 39;
pub const DELTA_NEUTRAL: i32 = 40;
pub const ALGO_ORDERS: i32 = 41;
pub const EXECUTION_DATA_CHAIN: i32 = 42;
pub const NOT_HELD: i32 = 44;
pub const SEC_ID_TYPE: i32 = 45;
pub const PLACE_ORDER_CONID: i32 = 46;
/// Exempt code on this exact version is carried as a throwaway integer.
pub const SSHORTX_OLD: i32 = 51;
pub const SSHORTX: i32 = 52;
pub const HEDGE_ORDERS: i32 = 54;
pub const OPT_OUT_SMART_ROUTING: i32 = 56;
pub const SMART_COMBO_ROUTING_PARAMS: i32 = 57;
pub const DELTA_NEUTRAL_CONID: i32 = 58;
pub const ORDER_COMBO_LEGS_PRICE: i32 = 61;
pub const TRAILING_PERCENT: i32 = 62;
pub const DELTA_NEUTRAL_OPEN_CLOSE: i32 = 66;
pub const TRADING_CLASS: i32 = 68;
pub const SCALE_TABLE: i32 = 69;
pub const LINKING: i32 = 70;
pub const ALGO_ID: i32 = 71;
/// Start API accepts an optional capabilities field above this version.
pub const OPTIONAL_CAPABILITIES: i32 = 72;
pub const ORDER_SOLICITED: i32 = 73;
pub const RANDOMIZE_SIZE_AND_PRICE: i32 = 76;
pub const FRACTIONAL_POSITIONS: i32 = 101;
pub const PEGGED_TO_BENCHMARK: i32 = 102;
pub const MODELS_SUPPORT: i32 = 103;
pub const EXT_OPERATOR: i32 = 105;
pub const SOFT_DOLLAR_TIER: i32 = 106;
pub const PAST_LIMIT: i32 = 109;
/// Deprecated mdSizeMultiplier occupies a slot between this and SIZE_RULES.
pub const MD_SIZE_MULTIPLIER: i32 = 110;
pub const CASH_QTY: i32 = 111;
pub const AGG_GROUP: i32 = 121;
pub const UNDERLYING_INFO: i32 = 122;
pub const SYNT_REALTIME_BARS: i32 = 124;
pub const MARKET_RULES: i32 = 126;
pub const MARKET_CAP_PRICE: i32 = 131;
pub const PRE_OPEN_BID_ASK: i32 = 132;
pub const REAL_EXPIRATION_DATE: i32 = 134;
pub const LAST_LIQUIDITY: i32 = 136;
pub const DECISION_MAKER: i32 = 138;
pub const MIFID_EXECUTION: i32 = 139;
pub const AUTO_PRICE_FOR_HEDGE: i32 = 141;
pub const WHAT_IF_EXT_FIELDS: i32 = 142;
pub const API_BIND_ORDER: i32 = 144;
pub const ORDER_CONTAINER: i32 = 145;
pub const D_PEG_ORDERS: i32 = 148;
pub const COMPLETED_ORDERS: i32 = 150;
pub const PRICE_MGMT_ALGO: i32 = 151;
pub const STOCK_TYPE: i32 = 152;
pub const NO_DEFAULT_OPEN_CLOSE: i32 = 155;
pub const PRICE_BASED_VOLATILITY: i32 = 156;
pub const DURATION: i32 = 158;
pub const POST_TO_ATS: i32 = 160;
pub const AUTO_CANCEL_PARENT: i32 = 162;
/// Deprecated sizeMinTick occupies a slot between this and SIZE_RULES.
pub const FRACTIONAL_SIZE_SUPPORT: i32 = 163;
pub const SIZE_RULES: i32 = 164;
pub const HISTORICAL_SCHEDULE: i32 = 165;
pub const ADVANCED_ORDER_REJECT: i32 = 166;
pub const MANUAL_ORDER_TIME: i32 = 169;
pub const PEGBEST_PEGMID_OFFSETS: i32 = 170;
pub const INSTRUMENT_TIMEZONE: i32 = 174;
pub const BOND_ISSUERID: i32 = 176;
pub const FA_PROFILE_DESUPPORT: i32 = 177;
pub const PENDING_PRICE_REVISION: i32 = 178;
pub const CUSTOMER_ACCOUNT: i32 = 183;
pub const PROFESSIONAL_CUSTOMER: i32 = 184;
pub const BOND_ACCRUED_INTEREST: i32 = 186;
