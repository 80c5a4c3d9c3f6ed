//! Order domain model: orders, execution reports and order conditions.

use serde::{Deserialize, Serialize};

use crate::contracts::{Contract, TagValue};

pub mod conditions;
pub(crate) mod decoders;

pub use conditions::{
    ExecutionCondition, MarginCondition, OrderCondition, PercentChangeCondition, PriceCondition, TimeCondition, VolumeCondition,
};
pub(crate) use decoders::{decode_commission_report, decode_completed_order, decode_execution_data, decode_open_order, decode_order_status};

/// An order attached to a contract. Field meanings follow the gateway order
/// ticket; unset wire values are `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order id assigned by the client.
    pub order_id: i32,
    /// Id of the client that placed the order.
    pub client_id: i32,
    /// Host-assigned permanent order id.
    pub perm_id: i32,
    /// Parent order id for child orders such as stop losses.
    pub parent_id: i32,
    /// BUY, SELL or SSHORT.
    pub action: String,
    pub total_quantity: Option<f64>,
    pub order_type: String,
    pub limit_price: Option<f64>,
    pub aux_price: Option<f64>,
    /// Time in force: DAY, GTC, IOC, GTD...
    pub tif: String,
    pub oca_group: String,
    pub oca_type: i32,
    pub order_ref: String,
    pub transmit: bool,
    pub block_order: bool,
    pub sweep_to_fill: bool,
    pub display_size: Option<i32>,
    pub trigger_method: i32,
    pub outside_rth: bool,
    pub hidden: bool,
    pub good_after_time: String,
    pub good_till_date: String,
    pub override_percentage_constraints: bool,
    pub rule_80_a: String,
    pub all_or_none: bool,
    pub min_qty: Option<i32>,
    pub percent_offset: Option<f64>,
    pub trail_stop_price: Option<f64>,
    pub trailing_percent: Option<f64>,
    // Financial advisor allocation.
    pub fa_group: String,
    pub fa_method: String,
    pub fa_percentage: String,
    /// Institutional account open/close flag.
    pub open_close: String,
    /// 0 customer, 1 firm.
    pub origin: i32,
    pub short_sale_slot: i32,
    pub designated_location: String,
    pub exempt_code: i32,
    pub discretionary_amt: f64,
    pub opt_out_smart_routing: bool,
    pub auction_strategy: i32,
    // Box order parameters.
    pub starting_price: Option<f64>,
    pub stock_ref_price: Option<f64>,
    pub delta: Option<f64>,
    // Peg-to-stock and volatility order parameters.
    pub stock_range_lower: Option<f64>,
    pub stock_range_upper: Option<f64>,
    pub volatility: Option<f64>,
    pub volatility_type: Option<i32>,
    pub delta_neutral_order_type: String,
    pub delta_neutral_aux_price: Option<f64>,
    pub delta_neutral_con_id: i32,
    pub delta_neutral_settling_firm: String,
    pub delta_neutral_clearing_account: String,
    pub delta_neutral_clearing_intent: String,
    pub delta_neutral_open_close: String,
    pub delta_neutral_short_sale: bool,
    pub delta_neutral_short_sale_slot: i32,
    pub delta_neutral_designated_location: String,
    pub continuous_update: bool,
    pub reference_price_type: Option<i32>,
    // EFP order parameters.
    pub basis_points: Option<f64>,
    pub basis_points_type: Option<i32>,
    // Scale order parameters.
    pub scale_init_level_size: Option<i32>,
    pub scale_subs_level_size: Option<i32>,
    pub scale_price_increment: Option<f64>,
    pub scale_price_adjust_value: Option<f64>,
    pub scale_price_adjust_interval: Option<i32>,
    pub scale_profit_offset: Option<f64>,
    pub scale_auto_reset: bool,
    pub scale_init_position: Option<i32>,
    pub scale_init_fill_qty: Option<i32>,
    pub scale_random_percent: bool,
    // Hedge order parameters.
    pub hedge_type: String,
    pub hedge_param: String,
    // Clearing.
    pub account: String,
    pub settling_firm: String,
    pub clearing_account: String,
    pub clearing_intent: String,
    // Algo orders.
    pub algo_strategy: String,
    pub algo_params: Vec<TagValue>,
    pub algo_id: String,
    pub what_if: bool,
    pub not_held: bool,
    pub solicited: bool,
    pub model_code: String,
    pub smart_combo_routing_params: Vec<TagValue>,
    pub order_combo_legs: Vec<OrderComboLeg>,
    pub order_misc_options: Vec<TagValue>,
    pub randomize_size: bool,
    pub randomize_price: bool,
    // Pegged-to-benchmark orders.
    pub reference_contract_id: i32,
    pub is_pegged_change_amount_decrease: bool,
    pub pegged_change_amount: Option<f64>,
    pub reference_change_amount: Option<f64>,
    pub reference_exchange: String,
    pub adjusted_order_type: String,
    pub trigger_price: Option<f64>,
    pub limit_price_offset: Option<f64>,
    pub adjusted_stop_price: Option<f64>,
    pub adjusted_stop_limit_price: Option<f64>,
    pub adjusted_trailing_amount: Option<f64>,
    pub adjustable_trailing_unit: i32,
    // Conditions.
    pub conditions: Vec<OrderCondition>,
    pub conditions_ignore_rth: bool,
    pub conditions_cancel_order: bool,
    pub soft_dollar_tier: SoftDollarTier,
    pub cash_qty: Option<f64>,
    pub dont_use_auto_price_for_hedge: bool,
    pub is_oms_container: bool,
    pub discretionary_up_to_limit_price: bool,
    pub use_price_mgmt_algo: Option<bool>,
    pub duration: Option<i32>,
    pub post_to_ats: Option<i32>,
    pub auto_cancel_parent: bool,
    // Peg-best and peg-mid order attributes.
    pub min_trade_qty: Option<i32>,
    pub min_compete_size: Option<i32>,
    pub compete_against_best_offset: Option<f64>,
    pub mid_offset_at_whole: Option<f64>,
    pub mid_offset_at_half: Option<f64>,
    pub customer_account: String,
    pub professional_customer: bool,
    pub bond_accrued_interest: String,
    // Completed order fields.
    pub auto_cancel_date: String,
    pub filled_quantity: Option<f64>,
    pub ref_futures_con_id: Option<i32>,
    pub shareholder: String,
    pub imbalance_only: bool,
    pub route_marketable_to_bbo: bool,
    pub parent_perm_id: Option<i64>,
}

impl Order {
    pub fn is_peg_bench(&self) -> bool {
        matches!(self.order_type.as_str(), "PEG BENCH" | "PEGBENCH")
    }

    pub fn is_peg_best(&self) -> bool {
        matches!(self.order_type.as_str(), "PEG BEST" | "PEGBEST")
    }

    pub fn is_peg_mid(&self) -> bool {
        matches!(self.order_type.as_str(), "PEG MID" | "PEGMID")
    }
}

/// Price attached to one leg of a combination order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderComboLeg {
    pub price: Option<f64>,
}

/// Soft dollar tier the order executes under.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDollarTier {
    pub name: String,
    pub value: String,
    pub display_name: String,
}

/// Margin and commission impact reported alongside an order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderState {
    /// Current order status: PendingSubmit, Submitted, Filled, Cancelled...
    pub status: String,
    pub initial_margin_before: Option<f64>,
    pub maintenance_margin_before: Option<f64>,
    pub equity_with_loan_before: Option<f64>,
    pub initial_margin_change: Option<f64>,
    pub maintenance_margin_change: Option<f64>,
    pub equity_with_loan_change: Option<f64>,
    pub initial_margin_after: Option<f64>,
    pub maintenance_margin_after: Option<f64>,
    pub equity_with_loan_after: Option<f64>,
    pub commission: Option<f64>,
    pub minimum_commission: Option<f64>,
    pub maximum_commission: Option<f64>,
    pub commission_currency: String,
    pub warning_text: String,
    pub completed_time: String,
    pub completed_status: String,
}

/// Open or completed order as pushed by the gateway.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: i32,
    pub contract: Contract,
    pub order: Order,
    pub order_state: OrderState,
}

/// Order status update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub order_id: i32,
    pub status: String,
    pub filled: Option<f64>,
    pub remaining: Option<f64>,
    pub average_fill_price: f64,
    pub perm_id: i32,
    pub parent_id: i32,
    pub last_fill_price: f64,
    pub client_id: i32,
    pub why_held: String,
    pub market_cap_price: f64,
}

/// Fill report for one execution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub execution_id: String,
    pub time: String,
    pub account_number: String,
    pub exchange: String,
    /// BOT or SLD.
    pub side: String,
    pub shares: Option<f64>,
    pub price: f64,
    pub perm_id: i32,
    pub client_id: i32,
    pub order_id: i32,
    pub liquidation: i32,
    pub cumulative_quantity: Option<f64>,
    pub average_price: f64,
    pub order_reference: String,
    pub ev_rule: String,
    pub ev_multiplier: f64,
    pub model_code: String,
    pub last_liquidity: i32,
    pub pending_price_revision: bool,
}

/// Execution paired with the contract it filled.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionData {
    pub request_id: i32,
    pub contract: Contract,
    pub execution: Execution,
}

/// Commission charged for an execution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommissionReport {
    pub execution_id: String,
    pub commission: f64,
    pub currency: String,
    pub realized_pnl: Option<f64>,
    pub yields: Option<f64>,
    /// YYYYMMDD format.
    pub yield_redemption_date: String,
}
