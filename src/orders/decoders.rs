//! Decoders for order related messages.
//!
//! Order payloads are gated twice: by the per-message version (read from the
//! payload when talking to servers that predate the order container era,
//! assumed latest otherwise) and by the negotiated server version. Every
//! threshold lives in [crate::server_versions]. A skipped deprecated field
//! still consumes exactly one token.

use crate::connection::MIN_CLIENT_VERSION;
use crate::contracts::{ComboLeg, ComboLegOpenClose, Contract, DeltaNeutralContract, SecurityType, TagValue};
use crate::messages::ResponseMessage;
use crate::{server_versions, Error};

use super::{CommissionReport, ExecutionData, OpenOrder, Order, OrderComboLeg, OrderCondition, OrderState, OrderStatus};

pub(crate) fn decode_open_order(server_version: i32, message: &mut ResponseMessage) -> Result<OpenOrder, Error> {
    message.skip(); // message type

    let message_version = if server_version < server_versions::ORDER_CONTAINER {
        message.next_int()?
    } else {
        server_version
    };

    let mut open_order = OpenOrder::default();

    let mut decoder = OrderDecoder {
        server_version,
        version: message_version,
        contract: &mut open_order.contract,
        order: &mut open_order.order,
        order_state: &mut open_order.order_state,
    };

    decoder.read_order_id(message)?;
    decoder.read_contract_fields(message)?;
    decoder.read_action(message)?;
    decoder.read_total_quantity(message)?;
    decoder.read_order_type(message)?;
    decoder.read_limit_price(message)?;
    decoder.read_aux_price(message)?;
    decoder.read_tif(message)?;
    decoder.read_oca_group(message)?;
    decoder.read_account(message)?;
    decoder.read_open_close(message)?;
    decoder.read_origin(message)?;
    decoder.read_order_ref(message)?;
    decoder.read_client_id(message)?;
    decoder.read_perm_id(message)?;
    decoder.read_outside_rth(message)?;
    decoder.read_hidden(message)?;
    decoder.read_discretionary_amount(message)?;
    decoder.read_good_after_time(message)?;
    decoder.skip_shares_allocation(message);
    decoder.read_fa_params(message)?;
    decoder.read_model_code(message)?;
    decoder.read_good_till_date(message)?;
    decoder.read_rule_80_a(message)?;
    decoder.read_percent_offset(message)?;
    decoder.read_settling_firm(message)?;
    decoder.read_short_sale_params(message)?;
    decoder.read_auction_strategy(message)?;
    decoder.read_box_order_params(message)?;
    decoder.read_peg_to_stock_or_vol_order_params(message)?;
    decoder.read_display_size(message)?;
    decoder.read_block_order(message)?;
    decoder.read_sweep_to_fill(message)?;
    decoder.read_all_or_none(message)?;
    decoder.read_min_qty(message)?;
    decoder.read_oca_type(message)?;
    decoder.skip_etrade_only(message);
    decoder.skip_firm_quote_only(message);
    decoder.skip_nbbo_price_cap(message);
    decoder.read_parent_id(message)?;
    decoder.read_trigger_method(message)?;
    decoder.read_vol_order_params(message, true)?;
    decoder.read_trail_params(message)?;
    decoder.read_basis_points(message)?;
    decoder.read_combo_legs(message)?;
    decoder.read_smart_combo_routing_params(message)?;
    decoder.read_scale_order_params(message)?;
    decoder.read_hedge_params(message)?;
    decoder.read_opt_out_smart_routing(message)?;
    decoder.read_clearing_params(message)?;
    decoder.read_not_held(message)?;
    decoder.read_delta_neutral(message)?;
    decoder.read_algo_params(message)?;
    decoder.read_solicited(message)?;
    decoder.read_what_if_info_and_commission(message)?;
    decoder.read_vol_randomize_flags(message)?;
    decoder.read_peg_to_bench_params(message)?;
    decoder.read_conditions(message)?;
    decoder.read_adjusted_order_params(message)?;
    decoder.read_soft_dollar_tier(message)?;
    decoder.read_cash_qty(message)?;
    decoder.read_dont_use_auto_price_for_hedge(message)?;
    decoder.read_is_oms_container(message)?;
    decoder.read_discretionary_up_to_limit_price(message)?;
    decoder.read_use_price_mgmt_algo(message)?;
    decoder.read_duration(message)?;
    decoder.read_post_to_ats(message)?;
    decoder.read_auto_cancel_parent(message, server_versions::AUTO_CANCEL_PARENT)?;
    decoder.read_peg_best_peg_mid_order_attributes(message)?;
    decoder.read_customer_account(message)?;
    decoder.read_professional_customer(message)?;
    decoder.read_bond_accrued_interest(message)?;

    open_order.order_id = open_order.order.order_id;

    Ok(open_order)
}

pub(crate) fn decode_completed_order(server_version: i32, message: &mut ResponseMessage) -> Result<OpenOrder, Error> {
    message.skip(); // message type

    let mut open_order = OpenOrder::default();

    // Completed orders postdate per-message versioning.
    let mut decoder = OrderDecoder {
        server_version,
        version: i32::MAX,
        contract: &mut open_order.contract,
        order: &mut open_order.order,
        order_state: &mut open_order.order_state,
    };

    decoder.read_contract_fields(message)?;
    decoder.read_action(message)?;
    decoder.read_total_quantity(message)?;
    decoder.read_order_type(message)?;
    decoder.read_limit_price(message)?;
    decoder.read_aux_price(message)?;
    decoder.read_tif(message)?;
    decoder.read_oca_group(message)?;
    decoder.read_account(message)?;
    decoder.read_open_close(message)?;
    decoder.read_origin(message)?;
    decoder.read_order_ref(message)?;
    decoder.read_perm_id(message)?;
    decoder.read_outside_rth(message)?;
    decoder.read_hidden(message)?;
    decoder.read_discretionary_amount(message)?;
    decoder.read_good_after_time(message)?;
    decoder.read_fa_params(message)?;
    decoder.read_model_code(message)?;
    decoder.read_good_till_date(message)?;
    decoder.read_rule_80_a(message)?;
    decoder.read_percent_offset(message)?;
    decoder.read_settling_firm(message)?;
    decoder.read_short_sale_params(message)?;
    decoder.read_box_order_params(message)?;
    decoder.read_peg_to_stock_or_vol_order_params(message)?;
    decoder.read_display_size(message)?;
    decoder.read_sweep_to_fill(message)?;
    decoder.read_all_or_none(message)?;
    decoder.read_min_qty(message)?;
    decoder.read_oca_type(message)?;
    decoder.read_trigger_method(message)?;
    decoder.read_vol_order_params(message, false)?;
    decoder.read_trail_params(message)?;
    decoder.read_combo_legs(message)?;
    decoder.read_smart_combo_routing_params(message)?;
    decoder.read_scale_order_params(message)?;
    decoder.read_hedge_params(message)?;
    decoder.read_clearing_params(message)?;
    decoder.read_not_held(message)?;
    decoder.read_delta_neutral(message)?;
    decoder.read_algo_params(message)?;
    decoder.read_solicited(message)?;
    decoder.read_order_status(message)?;
    decoder.read_vol_randomize_flags(message)?;
    decoder.read_peg_to_bench_params(message)?;
    decoder.read_conditions(message)?;
    decoder.read_stop_price_and_limit_price_offset(message)?;
    decoder.read_cash_qty(message)?;
    decoder.read_dont_use_auto_price_for_hedge(message)?;
    decoder.read_is_oms_container(message)?;
    decoder.read_auto_cancel_date(message)?;
    decoder.read_filled_quantity(message)?;
    decoder.read_ref_futures_con_id(message)?;
    decoder.read_auto_cancel_parent(message, MIN_CLIENT_VERSION)?;
    decoder.read_shareholder(message)?;
    decoder.read_imbalance_only(message)?;
    decoder.read_route_marketable_to_bbo(message)?;
    decoder.read_parent_perm_id(message)?;
    decoder.read_completed_time(message)?;
    decoder.read_completed_status(message)?;
    decoder.read_peg_best_peg_mid_order_attributes(message)?;
    decoder.read_customer_account(message)?;
    decoder.read_professional_customer(message)?;

    Ok(open_order)
}

pub(crate) fn decode_order_status(server_version: i32, message: &mut ResponseMessage) -> Result<OrderStatus, Error> {
    message.skip(); // message type

    let message_version = if server_version < server_versions::MARKET_CAP_PRICE {
        message.next_int()?
    } else {
        i32::MAX
    };

    let mut status = OrderStatus {
        order_id: message.next_int()?,
        status: message.next_string()?,
        filled: message.next_optional_decimal()?,
        remaining: message.next_optional_decimal()?,
        average_fill_price: message.next_double()?,
        ..Default::default()
    };

    if message_version >= 2 {
        status.perm_id = message.next_int()?;
    }
    if message_version >= 3 {
        status.parent_id = message.next_int()?;
    }
    if message_version >= 4 {
        status.last_fill_price = message.next_double()?;
    }
    if message_version >= 5 {
        status.client_id = message.next_int()?;
    }
    if message_version >= 6 {
        status.why_held = message.next_string()?;
    }
    if server_version >= server_versions::MARKET_CAP_PRICE {
        status.market_cap_price = message.next_double()?;
    }

    Ok(status)
}

pub(crate) fn decode_execution_data(server_version: i32, message: &mut ResponseMessage) -> Result<ExecutionData, Error> {
    message.skip(); // message type

    let message_version = if server_version < server_versions::LAST_LIQUIDITY {
        message.next_int()?
    } else {
        server_version
    };

    let mut execution_data = ExecutionData::default();

    if message_version >= 7 {
        execution_data.request_id = message.next_int()?;
    } else {
        execution_data.request_id = -1;
    }

    let order_id = message.next_int()?;

    let contract = &mut execution_data.contract;
    if message_version >= 5 {
        contract.contract_id = message.next_int()?;
    }
    contract.symbol = message.next_string()?;
    contract.security_type = SecurityType::from(&message.next_string()?);
    contract.last_trade_date_or_contract_month = message.next_string()?;
    contract.strike = message.next_double()?;
    contract.right = message.next_string()?;
    if message_version >= 9 {
        contract.multiplier = message.next_string()?;
    }
    contract.exchange = message.next_string()?;
    contract.currency = message.next_string()?;
    contract.local_symbol = message.next_string()?;
    if message_version >= 10 {
        contract.trading_class = message.next_string()?;
    }

    let execution = &mut execution_data.execution;
    execution.order_id = order_id;
    execution.execution_id = message.next_string()?;
    execution.time = message.next_string()?;
    execution.account_number = message.next_string()?;
    execution.exchange = message.next_string()?;
    execution.side = message.next_string()?;
    execution.shares = message.next_optional_decimal()?;
    execution.price = message.next_double()?;
    if message_version >= 2 {
        execution.perm_id = message.next_int()?;
    }
    if message_version >= 3 {
        execution.client_id = message.next_int()?;
    }
    if message_version >= 4 {
        execution.liquidation = message.next_int()?;
    }
    if message_version >= 6 {
        execution.cumulative_quantity = message.next_optional_decimal()?;
        execution.average_price = message.next_double()?;
    }
    if message_version >= 8 {
        execution.order_reference = message.next_string()?;
    }
    if message_version >= 9 {
        execution.ev_rule = message.next_string()?;
        execution.ev_multiplier = message.next_double()?;
    }
    if server_version >= server_versions::MODELS_SUPPORT {
        execution.model_code = message.next_string()?;
    }
    if server_version >= server_versions::LAST_LIQUIDITY {
        execution.last_liquidity = message.next_int()?;
    }
    if server_version >= server_versions::PENDING_PRICE_REVISION {
        execution.pending_price_revision = message.next_bool()?;
    }

    Ok(execution_data)
}

pub(crate) fn decode_commission_report(_server_version: i32, message: &mut ResponseMessage) -> Result<CommissionReport, Error> {
    message.skip(); // message type
    message.skip(); // message version

    Ok(CommissionReport {
        execution_id: message.next_string()?,
        commission: message.next_double()?,
        currency: message.next_string()?,
        realized_pnl: message.next_optional_double()?,
        yields: message.next_optional_double()?,
        yield_redemption_date: message.next_string()?,
    })
}

/// Walks an order payload block by block. Each `read_*` method mirrors one
/// protocol block and owns its version gates, so the consumption of any given
/// field is auditable in a single place.
struct OrderDecoder<'a> {
    server_version: i32,
    version: i32,
    contract: &'a mut Contract,
    order: &'a mut Order,
    order_state: &'a mut OrderState,
}

impl OrderDecoder<'_> {
    fn read_order_id(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.order_id = message.next_int()?;
        Ok(())
    }

    fn read_contract_fields(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        let contract = &mut self.contract;
        contract.contract_id = message.next_int()?;
        contract.symbol = message.next_string()?;
        contract.security_type = SecurityType::from(&message.next_string()?);
        contract.last_trade_date_or_contract_month = message.next_string()?;
        contract.strike = message.next_double()?;
        contract.right = message.next_string()?;
        if self.version >= 32 {
            contract.multiplier = message.next_string()?;
        }
        contract.exchange = message.next_string()?;
        contract.currency = message.next_string()?;
        contract.local_symbol = message.next_string()?;
        if self.version >= 32 {
            contract.trading_class = message.next_string()?;
        }
        Ok(())
    }

    fn read_action(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.action = message.next_string()?;
        Ok(())
    }

    fn read_total_quantity(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.total_quantity = message.next_optional_decimal()?;
        Ok(())
    }

    fn read_order_type(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.order_type = message.next_string()?;
        Ok(())
    }

    fn read_limit_price(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version < 29 {
            self.order.limit_price = Some(message.next_double()?);
        } else {
            self.order.limit_price = message.next_optional_double()?;
        }
        Ok(())
    }

    fn read_aux_price(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version < 30 {
            self.order.aux_price = Some(message.next_double()?);
        } else {
            self.order.aux_price = message.next_optional_double()?;
        }
        Ok(())
    }

    fn read_tif(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.tif = message.next_string()?;
        Ok(())
    }

    fn read_oca_group(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.oca_group = message.next_string()?;
        Ok(())
    }

    fn read_account(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.account = message.next_string()?;
        Ok(())
    }

    fn read_open_close(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.open_close = message.next_string()?;
        Ok(())
    }

    fn read_origin(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.origin = message.next_int()?;
        Ok(())
    }

    fn read_order_ref(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.order_ref = message.next_string()?;
        Ok(())
    }

    fn read_client_id(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.client_id = message.next_int()?;
        Ok(())
    }

    fn read_perm_id(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.perm_id = message.next_int()?;
        Ok(())
    }

    fn read_outside_rth(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.outside_rth = message.next_bool()?;
        Ok(())
    }

    fn read_hidden(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.hidden = message.next_bool()?;
        Ok(())
    }

    fn read_discretionary_amount(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.discretionary_amt = message.next_double()?;
        Ok(())
    }

    fn read_good_after_time(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.good_after_time = message.next_string()?;
        Ok(())
    }

    // Deprecated sharesAllocation field.
    fn skip_shares_allocation(&mut self, message: &mut ResponseMessage) {
        message.skip();
    }

    fn read_fa_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.fa_group = message.next_string()?;
        self.order.fa_method = message.next_string()?;
        self.order.fa_percentage = message.next_string()?;
        if self.server_version < server_versions::FA_PROFILE_DESUPPORT {
            message.skip(); // deprecated faProfile
        }
        Ok(())
    }

    fn read_model_code(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::MODELS_SUPPORT {
            self.order.model_code = message.next_string()?;
        }
        Ok(())
    }

    fn read_good_till_date(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.good_till_date = message.next_string()?;
        Ok(())
    }

    fn read_rule_80_a(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.rule_80_a = message.next_string()?;
        Ok(())
    }

    fn read_percent_offset(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.percent_offset = message.next_optional_double()?;
        Ok(())
    }

    fn read_settling_firm(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.settling_firm = message.next_string()?;
        Ok(())
    }

    fn read_short_sale_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.short_sale_slot = message.next_int()?;
        self.order.designated_location = message.next_string()?;
        if self.server_version == server_versions::SSHORTX_OLD {
            message.skip(); // exempt code was a throwaway on this exact version
        } else if self.version >= 23 {
            self.order.exempt_code = message.next_int()?;
        }
        Ok(())
    }

    fn read_auction_strategy(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.auction_strategy = message.next_int()?;
        Ok(())
    }

    fn read_box_order_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.starting_price = message.next_optional_double()?;
        self.order.stock_ref_price = message.next_optional_double()?;
        self.order.delta = message.next_optional_double()?;
        Ok(())
    }

    fn read_peg_to_stock_or_vol_order_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.stock_range_lower = message.next_optional_double()?;
        self.order.stock_range_upper = message.next_optional_double()?;
        Ok(())
    }

    fn read_display_size(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.display_size = message.next_optional_int()?;
        Ok(())
    }

    fn read_block_order(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.block_order = message.next_bool()?;
        Ok(())
    }

    fn read_sweep_to_fill(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.sweep_to_fill = message.next_bool()?;
        Ok(())
    }

    fn read_all_or_none(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.all_or_none = message.next_bool()?;
        Ok(())
    }

    fn read_min_qty(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.min_qty = message.next_optional_int()?;
        Ok(())
    }

    fn read_oca_type(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.oca_type = message.next_int()?;
        Ok(())
    }

    fn skip_etrade_only(&mut self, message: &mut ResponseMessage) {
        message.skip();
    }

    fn skip_firm_quote_only(&mut self, message: &mut ResponseMessage) {
        message.skip();
    }

    fn skip_nbbo_price_cap(&mut self, message: &mut ResponseMessage) {
        message.skip();
    }

    fn read_parent_id(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.parent_id = message.next_int()?;
        Ok(())
    }

    fn read_trigger_method(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.trigger_method = message.next_int()?;
        Ok(())
    }

    // Open orders carry clearing attributes for the hedging leg that
    // completed orders drop, hence `read_open_order_attribs`.
    fn read_vol_order_params(&mut self, message: &mut ResponseMessage, read_open_order_attribs: bool) -> Result<(), Error> {
        let order = &mut self.order;
        order.volatility = message.next_optional_double()?;
        order.volatility_type = message.next_optional_int()?;
        order.delta_neutral_order_type = message.next_string()?;
        order.delta_neutral_aux_price = message.next_optional_double()?;

        if self.version >= 27 && !order.delta_neutral_order_type.is_empty() {
            order.delta_neutral_con_id = message.next_int()?;
            if read_open_order_attribs {
                order.delta_neutral_settling_firm = message.next_string()?;
                order.delta_neutral_clearing_account = message.next_string()?;
                order.delta_neutral_clearing_intent = message.next_string()?;
            }
        }

        if self.version >= 31 && !order.delta_neutral_order_type.is_empty() {
            if read_open_order_attribs {
                order.delta_neutral_open_close = message.next_string()?;
            }
            order.delta_neutral_short_sale = message.next_bool()?;
            order.delta_neutral_short_sale_slot = message.next_int()?;
            order.delta_neutral_designated_location = message.next_string()?;
        }

        order.continuous_update = message.next_bool()?;
        order.reference_price_type = message.next_optional_int()?;
        Ok(())
    }

    fn read_trail_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.trail_stop_price = message.next_optional_double()?;
        if self.version >= 30 {
            self.order.trailing_percent = message.next_optional_double()?;
        }
        Ok(())
    }

    fn read_basis_points(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.basis_points = message.next_optional_double()?;
        self.order.basis_points_type = message.next_optional_int()?;
        Ok(())
    }

    fn read_combo_legs(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.contract.combo_legs_description = message.next_string()?;

        if self.version >= 29 {
            let combo_legs_count = message.next_int()?;
            for _ in 0..combo_legs_count {
                self.contract.combo_legs.push(ComboLeg {
                    contract_id: message.next_int()?,
                    ratio: message.next_int()?,
                    action: message.next_string()?,
                    exchange: message.next_string()?,
                    open_close: ComboLegOpenClose::from(message.next_int()?),
                    short_sale_slot: message.next_int()?,
                    designated_location: message.next_string()?,
                    exempt_code: message.next_int()?,
                });
            }

            let order_combo_legs_count = message.next_int()?;
            for _ in 0..order_combo_legs_count {
                self.order.order_combo_legs.push(OrderComboLeg {
                    price: message.next_optional_double()?,
                });
            }
        }
        Ok(())
    }

    fn read_smart_combo_routing_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version >= 26 {
            let count = message.next_int()?;
            for _ in 0..count {
                self.order.smart_combo_routing_params.push(TagValue {
                    tag: message.next_string()?,
                    value: message.next_string()?,
                });
            }
        }
        Ok(())
    }

    fn read_scale_order_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        let order = &mut self.order;
        if self.version >= 20 {
            order.scale_init_level_size = message.next_optional_int()?;
            order.scale_subs_level_size = message.next_optional_int()?;
        } else {
            message.skip(); // deprecated scale component count
            order.scale_init_level_size = message.next_optional_int()?;
        }

        order.scale_price_increment = message.next_optional_double()?;

        // Adjustment block only exists for a present, positive increment.
        let has_adjust_block = matches!(order.scale_price_increment, Some(increment) if increment > 0.0);
        if self.version >= 28 && has_adjust_block {
            order.scale_price_adjust_value = message.next_optional_double()?;
            order.scale_price_adjust_interval = message.next_optional_int()?;
            order.scale_profit_offset = message.next_optional_double()?;
            order.scale_auto_reset = message.next_bool()?;
            order.scale_init_position = message.next_optional_int()?;
            order.scale_init_fill_qty = message.next_optional_int()?;
            order.scale_random_percent = message.next_bool()?;
        }
        Ok(())
    }

    fn read_hedge_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version >= 24 {
            self.order.hedge_type = message.next_string()?;
            if !self.order.hedge_type.is_empty() {
                self.order.hedge_param = message.next_string()?;
            }
        }
        Ok(())
    }

    fn read_opt_out_smart_routing(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version >= 25 {
            self.order.opt_out_smart_routing = message.next_bool()?;
        }
        Ok(())
    }

    fn read_clearing_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.clearing_account = message.next_string()?;
        self.order.clearing_intent = message.next_string()?;
        Ok(())
    }

    fn read_not_held(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version >= 22 {
            self.order.not_held = message.next_bool()?;
        }
        Ok(())
    }

    fn read_delta_neutral(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version >= 20 {
            let has_delta_neutral_contract = message.next_bool()?;
            if has_delta_neutral_contract {
                self.contract.delta_neutral_contract = Some(DeltaNeutralContract {
                    contract_id: message.next_int()?,
                    delta: message.next_double()?,
                    price: message.next_double()?,
                });
            }
        }
        Ok(())
    }

    fn read_algo_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version >= 21 {
            self.order.algo_strategy = message.next_string()?;
            if !self.order.algo_strategy.is_empty() {
                let count = message.next_int()?;
                for _ in 0..count {
                    self.order.algo_params.push(TagValue {
                        tag: message.next_string()?,
                        value: message.next_string()?,
                    });
                }
            }
        }
        Ok(())
    }

    fn read_solicited(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version >= 33 {
            self.order.solicited = message.next_bool()?;
        }
        Ok(())
    }

    fn read_order_status(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order_state.status = message.next_string()?;
        Ok(())
    }

    fn read_what_if_info_and_commission(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.what_if = message.next_bool()?;
        self.read_order_status(message)?;

        let state = &mut self.order_state;
        if self.server_version >= server_versions::WHAT_IF_EXT_FIELDS {
            state.initial_margin_before = message.next_optional_double()?;
            state.maintenance_margin_before = message.next_optional_double()?;
            state.equity_with_loan_before = message.next_optional_double()?;
            state.initial_margin_change = message.next_optional_double()?;
            state.maintenance_margin_change = message.next_optional_double()?;
            state.equity_with_loan_change = message.next_optional_double()?;
        }
        state.initial_margin_after = message.next_optional_double()?;
        state.maintenance_margin_after = message.next_optional_double()?;
        state.equity_with_loan_after = message.next_optional_double()?;
        state.commission = message.next_optional_double()?;
        state.minimum_commission = message.next_optional_double()?;
        state.maximum_commission = message.next_optional_double()?;
        state.commission_currency = message.next_string()?;
        state.warning_text = message.next_string()?;
        Ok(())
    }

    fn read_vol_randomize_flags(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.version >= 34 {
            self.order.randomize_size = message.next_bool()?;
            self.order.randomize_price = message.next_bool()?;
        }
        Ok(())
    }

    fn read_peg_to_bench_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::PEGGED_TO_BENCHMARK && self.order.is_peg_bench() {
            self.order.reference_contract_id = message.next_int()?;
            self.order.is_pegged_change_amount_decrease = message.next_bool()?;
            self.order.pegged_change_amount = message.next_optional_double()?;
            self.order.reference_change_amount = message.next_optional_double()?;
            self.order.reference_exchange = message.next_string()?;
        }
        Ok(())
    }

    fn read_conditions(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::PEGGED_TO_BENCHMARK {
            let conditions_count = message.next_int()?;
            for _ in 0..conditions_count {
                let condition_type = message.next_int()?;
                self.order.conditions.push(OrderCondition::decode(condition_type, message)?);
            }
            if conditions_count > 0 {
                self.order.conditions_ignore_rth = message.next_bool()?;
                self.order.conditions_cancel_order = message.next_bool()?;
            }
        }
        Ok(())
    }

    fn read_adjusted_order_params(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::PEGGED_TO_BENCHMARK {
            self.order.adjusted_order_type = message.next_string()?;
            self.order.trigger_price = message.next_optional_double()?;
            self.read_stop_price_and_limit_price_offset(message)?;
            self.order.adjusted_stop_price = message.next_optional_double()?;
            self.order.adjusted_stop_limit_price = message.next_optional_double()?;
            self.order.adjusted_trailing_amount = message.next_optional_double()?;
            self.order.adjustable_trailing_unit = message.next_int()?;
        }
        Ok(())
    }

    fn read_stop_price_and_limit_price_offset(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.trail_stop_price = message.next_optional_double()?;
        self.order.limit_price_offset = message.next_optional_double()?;
        Ok(())
    }

    fn read_soft_dollar_tier(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::SOFT_DOLLAR_TIER {
            self.order.soft_dollar_tier.name = message.next_string()?;
            self.order.soft_dollar_tier.value = message.next_string()?;
            self.order.soft_dollar_tier.display_name = message.next_string()?;
        }
        Ok(())
    }

    fn read_cash_qty(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::CASH_QTY {
            self.order.cash_qty = message.next_optional_double()?;
        }
        Ok(())
    }

    fn read_dont_use_auto_price_for_hedge(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::AUTO_PRICE_FOR_HEDGE {
            self.order.dont_use_auto_price_for_hedge = message.next_bool()?;
        }
        Ok(())
    }

    fn read_is_oms_container(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::ORDER_CONTAINER {
            self.order.is_oms_container = message.next_bool()?;
        }
        Ok(())
    }

    fn read_discretionary_up_to_limit_price(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::D_PEG_ORDERS {
            self.order.discretionary_up_to_limit_price = message.next_bool()?;
        }
        Ok(())
    }

    fn read_use_price_mgmt_algo(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::PRICE_MGMT_ALGO {
            self.order.use_price_mgmt_algo = Some(message.next_bool()?);
        }
        Ok(())
    }

    fn read_duration(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::DURATION {
            self.order.duration = message.next_optional_int()?;
        }
        Ok(())
    }

    fn read_post_to_ats(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::POST_TO_ATS {
            self.order.post_to_ats = message.next_optional_int()?;
        }
        Ok(())
    }

    fn read_auto_cancel_parent(&mut self, message: &mut ResponseMessage, min_version: i32) -> Result<(), Error> {
        if self.server_version >= min_version {
            self.order.auto_cancel_parent = message.next_bool()?;
        }
        Ok(())
    }

    fn read_peg_best_peg_mid_order_attributes(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::PEGBEST_PEGMID_OFFSETS {
            self.order.min_trade_qty = message.next_optional_int()?;
            self.order.min_compete_size = message.next_optional_int()?;
            self.order.compete_against_best_offset = message.next_optional_double()?;
            self.order.mid_offset_at_whole = message.next_optional_double()?;
            self.order.mid_offset_at_half = message.next_optional_double()?;
        }
        Ok(())
    }

    fn read_customer_account(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::CUSTOMER_ACCOUNT {
            self.order.customer_account = message.next_string()?;
        }
        Ok(())
    }

    fn read_professional_customer(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::PROFESSIONAL_CUSTOMER {
            self.order.professional_customer = message.next_bool()?;
        }
        Ok(())
    }

    fn read_bond_accrued_interest(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        if self.server_version >= server_versions::BOND_ACCRUED_INTEREST {
            self.order.bond_accrued_interest = message.next_string()?;
        }
        Ok(())
    }

    fn read_auto_cancel_date(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.auto_cancel_date = message.next_string()?;
        Ok(())
    }

    fn read_filled_quantity(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.filled_quantity = message.next_optional_decimal()?;
        Ok(())
    }

    fn read_ref_futures_con_id(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.ref_futures_con_id = message.next_optional_int()?;
        Ok(())
    }

    fn read_shareholder(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.shareholder = message.next_string()?;
        Ok(())
    }

    fn read_imbalance_only(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.imbalance_only = message.next_bool()?;
        Ok(())
    }

    fn read_route_marketable_to_bbo(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.route_marketable_to_bbo = message.next_bool()?;
        Ok(())
    }

    fn read_parent_perm_id(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order.parent_perm_id = message.next_optional_long()?;
        Ok(())
    }

    fn read_completed_time(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order_state.completed_time = message.next_string()?;
        Ok(())
    }

    fn read_completed_status(&mut self, message: &mut ResponseMessage) -> Result<(), Error> {
        self.order_state.completed_status = message.next_string()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::orders::PriceCondition;

    // Captured from a paper account on a SIZE_RULES era server.
    const OPEN_ORDER: &str = "5|13|76792991|TSLA|STK||0|?||SMART|USD|TSLA|NMS|BUY|100|MKT|0.0|0.0|DAY||DU1234567||0||100|1376327563|0|0|0||1376327563.0/DU1234567/100||||||||||0||-1|0||||||2147483647|0|0|0||3|0|0||0|0||0|None||0||||?|0|0||0|0||||||0|0|0|2147483647|2147483647|||0||IB|0|0||0|0|PreSubmitted|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308||||||0|0|0|None|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|1.7976931348623157E308|0||||0|1|0|0|0|||0||";

    const ORDER_STATUS: &str = "3|13|PreSubmitted|0|100|0|1376327563|0|0|100||0||";

    const EXECUTION_DATA: &str = "11|-1|13|76792991|TSLA|STK||0.0|||ISLAND|USD|TSLA|NMS|00025b46.63f8f39c.01.01|20230224  12:04:56|DU1234567|ISLAND|BOT|100|196.52|1376327563|100|0|100|196.52|||||2||";

    const COMMISSION_REPORT: &str = "59|1|00025b46.63f8f39c.01.01|1.0|USD|1.7976931348623157E308|1.7976931348623157E308|||";

    const COMPLETED_ORDER: &str = "101|265598|AAPL|STK||0||100|SMART|USD|AAPL|NMS|BUY|100|LMT|195.5|0|DAY||DU1234567||0||1827301|0|0|0|||||||||||0||-1|||||||0|0||3|0|||||0|||||0|0|0|2147483647|2147483647||||IB|0|0||0|Filled|0|0|0|1.7976931348623157E308|1.7976931348623157E308||1|0||100||0||0|0||20240115 10:30:22 EST|Filled|";

    #[test]
    fn test_decode_open_order() {
        let mut message = ResponseMessage::from_simple(OPEN_ORDER);

        let open_order = decode_open_order(server_versions::SIZE_RULES, &mut message).unwrap();

        assert_eq!(open_order.order_id, 13);

        let contract = &open_order.contract;
        assert_eq!(contract.contract_id, 76792991);
        assert_eq!(contract.symbol, "TSLA");
        assert_eq!(contract.security_type, SecurityType::Stock);
        assert_eq!(contract.right, "?");
        assert_eq!(contract.exchange, "SMART");
        assert_eq!(contract.currency, "USD");
        assert_eq!(contract.local_symbol, "TSLA");
        assert_eq!(contract.trading_class, "NMS");
        assert!(contract.combo_legs.is_empty(), "zero count list must decode empty");
        assert_eq!(contract.delta_neutral_contract, None);

        let order = &open_order.order;
        assert_eq!(order.order_id, 13);
        assert_eq!(order.action, "BUY");
        assert_eq!(order.total_quantity, Some(100.0));
        assert_eq!(order.order_type, "MKT");
        assert_eq!(order.limit_price, Some(0.0));
        assert_eq!(order.aux_price, Some(0.0));
        assert_eq!(order.tif, "DAY");
        assert_eq!(order.account, "DU1234567");
        assert_eq!(order.origin, 0);
        assert_eq!(order.client_id, 100);
        assert_eq!(order.perm_id, 1376327563);
        assert!(!order.outside_rth);
        assert!(!order.hidden);
        assert_eq!(order.exempt_code, -1);
        assert_eq!(order.display_size, None);
        assert_eq!(order.oca_type, 3);
        assert_eq!(order.min_qty, None);
        assert_eq!(order.delta_neutral_order_type, "None");
        assert_eq!(order.delta_neutral_open_close, "?");
        assert_eq!(order.reference_price_type, Some(0));
        assert_eq!(order.scale_init_level_size, None);
        assert_eq!(order.scale_price_increment, None);
        assert_eq!(order.clearing_intent, "IB");
        assert!(!order.not_held);
        assert_eq!(order.algo_strategy, "");
        assert!(!order.what_if);
        assert!(order.conditions.is_empty());
        assert_eq!(order.adjusted_order_type, "None");
        assert_eq!(order.trigger_price, None);
        assert_eq!(order.cash_qty, Some(0.0));
        assert!(order.dont_use_auto_price_for_hedge);
        assert!(!order.is_oms_container);
        assert_eq!(order.use_price_mgmt_algo, Some(false));
        assert_eq!(order.duration, None);
        assert_eq!(order.post_to_ats, None);
        assert!(!order.auto_cancel_parent);
        // Below the peg best/mid threshold these stay unset.
        assert_eq!(order.min_trade_qty, None);
        assert_eq!(order.compete_against_best_offset, None);

        let state = &open_order.order_state;
        assert_eq!(state.status, "PreSubmitted");
        assert_eq!(state.initial_margin_before, None);
        assert_eq!(state.equity_with_loan_after, None);
        assert_eq!(state.commission, None);
        assert_eq!(state.commission_currency, "");
    }

    #[test]
    fn test_decode_open_order_with_condition() {
        // Splice one price condition into the conditions block.
        let raw = OPEN_ORDER.replace(
            "|0|0|0|None|1.7976931348623157E308|",
            "|0|0|1|1|a|1|262.5|265598|SMART|2|1|0|None|1.7976931348623157E308|",
        );
        assert_ne!(raw, OPEN_ORDER, "fixture splice failed");

        let mut message = ResponseMessage::from_simple(&raw);
        let open_order = decode_open_order(server_versions::SIZE_RULES, &mut message).unwrap();

        let order = &open_order.order;
        assert_eq!(order.conditions.len(), 1);
        assert_eq!(
            order.conditions[0],
            OrderCondition::Price(PriceCondition {
                is_conjunction: true,
                is_more: true,
                price: 262.5,
                contract_id: 265598,
                exchange: "SMART".into(),
                trigger_method: 2,
            })
        );
        assert!(order.conditions_ignore_rth);
        assert!(!order.conditions_cancel_order);
        // The remainder of the payload still lines up.
        assert_eq!(order.adjusted_order_type, "None");
        assert_eq!(order.cash_qty, Some(0.0));
    }

    #[test]
    fn test_open_order_masking_is_monotonic() {
        let mut modern = ResponseMessage::from_simple(OPEN_ORDER);
        let decoded_modern = decode_open_order(server_versions::SIZE_RULES, &mut modern).unwrap();
        let consumed_modern = modern.i;

        // COMPLETED_ORDERS era server: same payload, later gates stay closed.
        let mut older = ResponseMessage::from_simple(OPEN_ORDER);
        let decoded_older = decode_open_order(server_versions::COMPLETED_ORDERS, &mut older).unwrap();
        let consumed_older = older.i;

        assert!(consumed_older < consumed_modern);
        assert_eq!(decoded_modern.order.use_price_mgmt_algo, Some(false));
        assert_eq!(decoded_older.order.use_price_mgmt_algo, None);
        assert_eq!(decoded_older.order.duration, None);
        assert!(!decoded_older.order.auto_cancel_parent);
        // Fields before the gates are unaffected.
        assert_eq!(decoded_older.order.account, decoded_modern.order.account);
        assert_eq!(decoded_older.order_state.status, decoded_modern.order_state.status);
    }

    #[test]
    fn test_decode_order_status() {
        let mut message = ResponseMessage::from_simple(ORDER_STATUS);

        let status = decode_order_status(server_versions::SIZE_RULES, &mut message).unwrap();

        assert_eq!(status.order_id, 13);
        assert_eq!(status.status, "PreSubmitted");
        assert_eq!(status.filled, Some(0.0));
        assert_eq!(status.remaining, Some(100.0));
        assert_eq!(status.average_fill_price, 0.0);
        assert_eq!(status.perm_id, 1376327563);
        assert_eq!(status.parent_id, 0);
        assert_eq!(status.last_fill_price, 0.0);
        assert_eq!(status.client_id, 100);
        assert_eq!(status.why_held, "");
        assert_eq!(status.market_cap_price, 0.0);
    }

    #[test]
    fn test_order_status_masking_is_monotonic() {
        // Pre MARKET_CAP_PRICE servers prefix a message version instead.
        let mut message = ResponseMessage::from_simple("3|4|13|Submitted|50|50|196.5|1376327563|0|196.5|");

        let status = decode_order_status(server_versions::SYNT_REALTIME_BARS, &mut message).unwrap();

        assert_eq!(status.order_id, 13);
        assert_eq!(status.status, "Submitted");
        assert_eq!(status.filled, Some(50.0));
        assert_eq!(status.last_fill_price, 196.5);
        // Version 4 payloads stop before these fields.
        assert_eq!(status.client_id, 0);
        assert_eq!(status.why_held, "");
        assert_eq!(status.market_cap_price, 0.0);
    }

    #[test]
    fn test_decode_execution_data() {
        let mut message = ResponseMessage::from_simple(EXECUTION_DATA);

        let execution_data = decode_execution_data(server_versions::SIZE_RULES, &mut message).unwrap();

        assert_eq!(execution_data.request_id, -1);
        assert_eq!(execution_data.contract.contract_id, 76792991);
        assert_eq!(execution_data.contract.symbol, "TSLA");
        assert_eq!(execution_data.contract.trading_class, "NMS");

        let execution = &execution_data.execution;
        assert_eq!(execution.order_id, 13);
        assert_eq!(execution.execution_id, "00025b46.63f8f39c.01.01");
        assert_eq!(execution.time, "20230224  12:04:56");
        assert_eq!(execution.account_number, "DU1234567");
        assert_eq!(execution.exchange, "ISLAND");
        assert_eq!(execution.side, "BOT");
        assert_eq!(execution.shares, Some(100.0));
        assert_eq!(execution.price, 196.52);
        assert_eq!(execution.perm_id, 1376327563);
        assert_eq!(execution.client_id, 100);
        assert_eq!(execution.liquidation, 0);
        assert_eq!(execution.cumulative_quantity, Some(100.0));
        assert_eq!(execution.average_price, 196.52);
        assert_eq!(execution.last_liquidity, 2);
        assert!(!execution.pending_price_revision);
    }

    #[test]
    fn test_decode_commission_report() {
        let mut message = ResponseMessage::from_simple(COMMISSION_REPORT);

        let report = decode_commission_report(server_versions::SIZE_RULES, &mut message).unwrap();

        assert_eq!(report.execution_id, "00025b46.63f8f39c.01.01");
        assert_eq!(report.commission, 1.0);
        assert_eq!(report.currency, "USD");
        assert_eq!(report.realized_pnl, None);
        assert_eq!(report.yields, None);
        assert_eq!(report.yield_redemption_date, "");
    }

    #[test]
    fn test_decode_completed_order() {
        let mut message = ResponseMessage::from_simple(COMPLETED_ORDER);

        let completed = decode_completed_order(server_versions::SIZE_RULES, &mut message).unwrap();

        assert_eq!(completed.contract.contract_id, 265598);
        assert_eq!(completed.contract.symbol, "AAPL");
        assert_eq!(completed.contract.multiplier, "100");
        assert_eq!(completed.order.action, "BUY");
        assert_eq!(completed.order.total_quantity, Some(100.0));
        assert_eq!(completed.order.order_type, "LMT");
        assert_eq!(completed.order.limit_price, Some(195.5));
        assert_eq!(completed.order.perm_id, 1827301);
        assert_eq!(completed.order.exempt_code, -1);
        assert_eq!(completed.order.filled_quantity, Some(100.0));
        assert_eq!(completed.order.ref_futures_con_id, None);
        assert!(completed.order.dont_use_auto_price_for_hedge);
        assert_eq!(completed.order.parent_perm_id, None);
        assert_eq!(completed.order_state.status, "Filled");
        assert_eq!(completed.order_state.completed_time, "20240115 10:30:22 EST");
        assert_eq!(completed.order_state.completed_status, "Filled");
    }

    #[test]
    fn test_truncated_message_is_decode_error() {
        let mut message = ResponseMessage::from_simple("3|13|PreSubmitted|0|");

        let err = decode_order_status(server_versions::SIZE_RULES, &mut message).unwrap_err();
        assert!(format!("{err}").contains("end of message"));
    }
}
