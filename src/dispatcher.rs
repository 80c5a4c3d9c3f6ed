//! Routes inbound messages to decode routines and on to the event sink.

use std::sync::Arc;

use log::{debug, error, warn};
use time_tz::Tz;

use crate::contracts::decode_contract_details;
use crate::errors::{BAD_MESSAGE, NO_VALID_ID, UNKNOWN_ID};
use crate::events::GatewayEvents;
use crate::market_data::{decode_historical_data, decode_tick_price, decode_tick_size};
use crate::messages::{IncomingMessages, ResponseMessage};
use crate::orders::{decode_commission_report, decode_completed_order, decode_execution_data, decode_open_order, decode_order_status};
use crate::{server_versions, Error};

// Server error codes 2100-2169 are warnings, not failures.
const WARNING_CODES: std::ops::RangeInclusive<i32> = 2100..=2169;

/// Maps each inbound message to its decode routine and fires the matching
/// [GatewayEvents] callback. A message that fails to decode is reported
/// through the sink and dropped; the connection and subsequent messages are
/// unaffected.
pub struct Dispatcher {
    server_version: i32,
    time_zone: &'static Tz,
    events: Arc<dyn GatewayEvents>,
}

impl Dispatcher {
    pub fn new(server_version: i32, time_zone: &'static Tz, events: Arc<dyn GatewayEvents>) -> Self {
        Dispatcher {
            server_version,
            time_zone,
            events,
        }
    }

    /// Decode one message and deliver it. Unknown tags are reported with the
    /// unknown-id notice, decode failures with the bad-message notice, both
    /// tied to the request id when the payload carries one.
    pub fn dispatch(&self, mut message: ResponseMessage) {
        let request_id = message.request_id().unwrap_or(NO_VALID_ID);

        match self.route(&mut message) {
            Ok(()) => {}
            Err(Error::UnknownMessageType(tag)) => {
                warn!("unknown message type {tag}: {:?}", message.encode_simple());
                self.events.error(NO_VALID_ID, UNKNOWN_ID.code, UNKNOWN_ID.message);
            }
            Err(err) => {
                error!("failed to decode {:?}: {err}", message.message_type());
                self.events.error(request_id, BAD_MESSAGE.code, &format!("{} {err}", BAD_MESSAGE.message));
            }
        }
    }

    fn route(&self, message: &mut ResponseMessage) -> Result<(), Error> {
        debug!("<- {:?} {:?}", message.message_type(), message.encode_simple());

        match message.message_type() {
            IncomingMessages::Error => self.server_error(message),
            IncomingMessages::TickPrice => {
                let tick = decode_tick_price(self.server_version, message)?;
                self.events.tick_price(tick.request_id, tick.tick_type, tick.price, &tick.attribute);
                // The price tick piggybacks the size of its twin size tick.
                if let (Some(size), Some(size_tick_type)) = (tick.size, tick.size_tick_type) {
                    self.events.tick_size(tick.request_id, size_tick_type, size);
                }
                Ok(())
            }
            IncomingMessages::TickSize => {
                let tick = decode_tick_size(message)?;
                self.events.tick_size(tick.request_id, tick.tick_type, tick.size);
                Ok(())
            }
            IncomingMessages::OrderStatus => {
                let status = decode_order_status(self.server_version, message)?;
                self.events.order_status(&status);
                Ok(())
            }
            IncomingMessages::OpenOrder => {
                let open_order = decode_open_order(self.server_version, message)?;
                self.events.open_order(&open_order);
                Ok(())
            }
            IncomingMessages::OpenOrderEnd => {
                self.events.open_order_end();
                Ok(())
            }
            IncomingMessages::CompletedOrder => {
                let completed = decode_completed_order(self.server_version, message)?;
                self.events.completed_order(&completed);
                Ok(())
            }
            IncomingMessages::CompletedOrdersEnd => {
                self.events.completed_orders_end();
                Ok(())
            }
            IncomingMessages::AccountValue => {
                message.skip(); // message type
                let message_version = message.next_int()?;
                let key = message.next_string()?;
                let value = message.next_string()?;
                let currency = message.next_string()?;
                let account = if message_version >= 2 { message.next_string()? } else { String::new() };
                self.events.account_value(&key, &value, &currency, &account);
                Ok(())
            }
            IncomingMessages::NextValidId => {
                message.skip(); // message type
                message.skip(); // message version
                self.events.next_valid_id(message.next_int()?);
                Ok(())
            }
            IncomingMessages::ManagedAccounts => {
                message.skip(); // message type
                message.skip(); // message version
                let accounts = message.next_string()?;
                self.events.managed_accounts(&accounts);
                Ok(())
            }
            IncomingMessages::CurrentTime => {
                message.skip(); // message type
                message.skip(); // message version
                self.events.current_time(message.next_long()?);
                Ok(())
            }
            IncomingMessages::ContractData => {
                let request_id = message.request_id().unwrap_or(NO_VALID_ID);
                let details = decode_contract_details(self.server_version, message)?;
                self.events.contract_details(request_id, &details);
                Ok(())
            }
            IncomingMessages::ContractDataEnd => {
                message.skip(); // message type
                message.skip(); // message version
                self.events.contract_details_end(message.next_int()?);
                Ok(())
            }
            IncomingMessages::ExecutionData => {
                let execution = decode_execution_data(self.server_version, message)?;
                self.events.execution_data(&execution);
                Ok(())
            }
            IncomingMessages::ExecutionDataEnd => {
                message.skip(); // message type
                message.skip(); // message version
                self.events.execution_data_end(message.next_int()?);
                Ok(())
            }
            IncomingMessages::CommissionsReport => {
                let report = decode_commission_report(self.server_version, message)?;
                self.events.commission_report(&report);
                Ok(())
            }
            IncomingMessages::HistoricalData => {
                let data = decode_historical_data(self.server_version, self.time_zone, message)?;
                self.events.historical_data(data.request_id, &data.bars);
                Ok(())
            }
            IncomingMessages::NotValid => Err(Error::UnknownMessageType(message.message_tag())),
        }
    }

    // Error messages double as warnings; both go to the sink untouched.
    fn server_error(&self, message: &mut ResponseMessage) -> Result<(), Error> {
        message.skip(); // message type

        let message_version = message.next_int()?;
        if message_version < 2 {
            let text = message.next_string()?;
            self.events.error(NO_VALID_ID, NO_VALID_ID, &text);
            return Ok(());
        }

        let request_id = message.next_int()?;
        let code = message.next_int()?;
        let text = message.next_string()?;

        let mut advanced_order_reject = String::new();
        if self.server_version >= server_versions::ADVANCED_ORDER_REJECT {
            advanced_order_reject = message.next_string()?;
        }

        if WARNING_CODES.contains(&code) {
            warn!("server warning: request_id={request_id} code={code} message={text}");
        } else if !advanced_order_reject.is_empty() {
            error!("order rejected: request_id={request_id} code={code} message={text} reject={advanced_order_reject}");
        }

        self.events.error(request_id, code, &text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::market_data::{Bar, TickAttribute};
    use crate::orders::OrderStatus;

    // Records every callback so tests can assert order and content.
    #[derive(Default)]
    struct RecordingEvents {
        entries: Mutex<Vec<String>>,
    }

    impl RecordingEvents {
        fn entries(&self) -> Vec<String> {
            self.entries.lock().unwrap().clone()
        }

        fn push(&self, entry: String) {
            self.entries.lock().unwrap().push(entry);
        }
    }

    impl GatewayEvents for RecordingEvents {
        fn error(&self, request_id: i32, code: i32, message: &str) {
            self.push(format!("error {request_id} {code} {message}"));
        }

        fn tick_price(&self, request_id: i32, tick_type: i32, price: f64, _attribute: &TickAttribute) {
            self.push(format!("tick_price {request_id} {tick_type} {price}"));
        }

        fn tick_size(&self, request_id: i32, tick_type: i32, size: f64) {
            self.push(format!("tick_size {request_id} {tick_type} {size}"));
        }

        fn order_status(&self, status: &OrderStatus) {
            self.push(format!("order_status {} {}", status.order_id, status.status));
        }

        fn managed_accounts(&self, accounts: &str) {
            self.push(format!("managed_accounts {accounts}"));
        }

        fn next_valid_id(&self, order_id: i32) {
            self.push(format!("next_valid_id {order_id}"));
        }

        fn current_time(&self, timestamp: i64) {
            self.push(format!("current_time {timestamp}"));
        }

        fn account_value(&self, key: &str, value: &str, currency: &str, account: &str) {
            self.push(format!("account_value {key} {value} {currency} {account}"));
        }

        fn historical_data(&self, request_id: i32, bars: &[Bar]) {
            self.push(format!("historical_data {request_id} {}", bars.len()));
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<RecordingEvents>) {
        let events = Arc::new(RecordingEvents::default());
        let dispatcher = Dispatcher::new(
            server_versions::SIZE_RULES,
            time_tz::timezones::db::america::NEW_YORK,
            Arc::clone(&events) as Arc<dyn GatewayEvents>,
        );
        (dispatcher, events)
    }

    #[test]
    fn test_dispatch_routes_by_tag() {
        let (dispatcher, events) = dispatcher();

        dispatcher.dispatch(ResponseMessage::from_simple("9|1|43|"));
        dispatcher.dispatch(ResponseMessage::from_simple("15|1|DU1234567,DU7654321|"));
        dispatcher.dispatch(ResponseMessage::from_simple("49|1|1680646401|"));
        dispatcher.dispatch(ResponseMessage::from_simple("6|2|NetLiquidation|825000.0|USD|DU1234567|"));

        assert_eq!(
            events.entries(),
            vec![
                "next_valid_id 43",
                "managed_accounts DU1234567,DU7654321",
                "current_time 1680646401",
                "account_value NetLiquidation 825000.0 USD DU1234567",
            ]
        );
    }

    #[test]
    fn test_unknown_tag_reported_distinctly() {
        let (dispatcher, events) = dispatcher();

        dispatcher.dispatch(ResponseMessage::from_simple("999|1|2|"));

        assert_eq!(events.entries(), vec![format!("error -1 {} {}", UNKNOWN_ID.code, UNKNOWN_ID.message)]);
    }

    #[test]
    fn test_bad_message_does_not_poison_following_messages() {
        let (dispatcher, events) = dispatcher();

        // Truncated order status, then a complete historical data message.
        dispatcher.dispatch(ResponseMessage::from_simple("3|13|PreSubmitted|0|"));
        dispatcher.dispatch(ResponseMessage::from_simple(
            "17|9000|20230405  10:00:00|20230406  10:00:00|1|1680647400|183.91|184.25|183.47|184.02|2856|183.92|915|",
        ));

        let entries = events.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].starts_with(&format!("error -1 {} {}", BAD_MESSAGE.code, BAD_MESSAGE.message)));
        assert_eq!(entries[1], "historical_data 9000 1");
    }

    #[test]
    fn test_tick_price_forwards_paired_size_tick() {
        let (dispatcher, events) = dispatcher();

        dispatcher.dispatch(ResponseMessage::from_simple("1|6|9001|1|185.5|300|1|"));

        assert_eq!(events.entries(), vec!["tick_price 9001 1 185.5", "tick_size 9001 0 300"]);
    }

    #[test]
    fn test_server_error_reaches_sink() {
        let (dispatcher, events) = dispatcher();

        dispatcher.dispatch(ResponseMessage::from_simple("4|2|9000|200|No security definition has been found||"));

        assert_eq!(events.entries(), vec!["error 9000 200 No security definition has been found"]);
    }

    #[test]
    fn test_order_status_dispatch() {
        let (dispatcher, events) = dispatcher();

        dispatcher.dispatch(ResponseMessage::from_simple("3|13|PreSubmitted|0|100|0|1376327563|0|0|100||0||"));

        assert_eq!(events.entries(), vec!["order_status 13 PreSubmitted"]);
    }
}
