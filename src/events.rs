//! Callback sink for messages pushed by the gateway.

use log::{error, warn};

use crate::contracts::ContractDetails;
use crate::market_data::{Bar, TickAttribute};
use crate::orders::{CommissionReport, ExecutionData, OpenOrder, OrderStatus};

/// Receiver for decoded gateway messages. One handler per message type; every
/// handler has a no-op default so implementations only override what they
/// consume. Handlers are invoked from the reader thread and must not block.
#[allow(unused_variables)]
pub trait GatewayEvents: Send + Sync {
    /// Errors and notices, both server-sent and client-generated. A negative
    /// `request_id` means the error is not tied to a request.
    fn error(&self, request_id: i32, code: i32, message: &str) {
        if request_id < 0 {
            warn!("notice: {code} {message}");
        } else {
            error!("request {request_id}: {code} {message}");
        }
    }

    /// The connection was closed, locally or by the peer. Fired exactly once
    /// per established connection.
    fn connection_closed(&self) {}

    fn managed_accounts(&self, accounts: &str) {}

    fn next_valid_id(&self, order_id: i32) {}

    fn current_time(&self, timestamp: i64) {}

    fn account_value(&self, key: &str, value: &str, currency: &str, account: &str) {}

    fn tick_price(&self, request_id: i32, tick_type: i32, price: f64, attribute: &TickAttribute) {}

    fn tick_size(&self, request_id: i32, tick_type: i32, size: f64) {}

    fn order_status(&self, status: &OrderStatus) {}

    fn open_order(&self, open_order: &OpenOrder) {}

    fn open_order_end(&self) {}

    fn completed_order(&self, completed_order: &OpenOrder) {}

    fn completed_orders_end(&self) {}

    fn contract_details(&self, request_id: i32, details: &ContractDetails) {}

    fn contract_details_end(&self, request_id: i32) {}

    fn execution_data(&self, execution: &ExecutionData) {}

    fn execution_data_end(&self, request_id: i32) {}

    fn commission_report(&self, report: &CommissionReport) {}

    fn historical_data(&self, request_id: i32, bars: &[Bar]) {}
}
