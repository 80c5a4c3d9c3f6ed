//! Client endpoint of a broker trading-gateway wire protocol.
//!
//! Messages on the wire are frames: a 4-byte big-endian length prefix
//! followed by NUL-delimited positional text fields, the first field being an
//! integer message-type tag. This crate owns the socket lifecycle, the frame
//! and field codecs, the version-gated decoders for the gateway's order,
//! contract and market data messages, and a dispatcher that delivers decoded
//! messages to a caller-supplied [events::GatewayEvents] sink.
//!
//!```no_run
//! use std::sync::Arc;
//!
//! use tradewire::connection::establish_connection;
//! use tradewire::dispatcher::Dispatcher;
//! use tradewire::events::GatewayEvents;
//! use tradewire::transport::{FrameTransport, Reader};
//!
//! struct Printer;
//!
//! impl GatewayEvents for Printer {
//!     fn next_valid_id(&self, order_id: i32) {
//!         println!("next order id: {order_id}");
//!     }
//! }
//!
//! let events: Arc<dyn GatewayEvents> = Arc::new(Printer);
//! let transport = Arc::new(FrameTransport::new(Arc::clone(&events)));
//! if transport.connect("127.0.0.1:4002") {
//!     let metadata = establish_connection(&transport, 100).expect("handshake failed");
//!     let time_zone = metadata.time_zone.unwrap_or(time_tz::timezones::db::UTC);
//!     let dispatcher = Dispatcher::new(metadata.server_version, time_zone, Arc::clone(&events));
//!     let reader = Reader::start(Arc::clone(&transport), dispatcher, events);
//!     // ... work with the connection ...
//!     reader.shutdown();
//! }
//!```

/// Connection establishment: handshake and start-API exchange.
pub mod connection;

/// Contract model and contract details decoding.
pub mod contracts;

/// Routes inbound messages to decoders and the event sink.
pub mod dispatcher;

/// Error type and gateway notice codes.
pub mod errors;

/// The callback sink for decoded gateway messages.
pub mod events;

/// Market data model: ticks and historical bars.
pub mod market_data;

/// Wire message splitting, typed field access and framing.
pub mod messages;

/// Order model, order conditions and order message decoders.
pub mod orders;

/// Protocol version thresholds, verbatim.
pub mod server_versions;

/// Socket transport, frame buffer and reader thread.
pub mod transport;

pub use errors::Error;

pub(crate) trait ToField {
    fn to_field(&self) -> String;
}

impl ToField for bool {
    fn to_field(&self) -> String {
        if *self {
            String::from("1")
        } else {
            String::from("0")
        }
    }
}

impl ToField for String {
    fn to_field(&self) -> String {
        self.clone()
    }
}

impl ToField for &str {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

impl ToField for i32 {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

impl ToField for Option<i32> {
    fn to_field(&self) -> String {
        encode_option_field(self)
    }
}

impl ToField for f64 {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

impl ToField for Option<f64> {
    fn to_field(&self) -> String {
        encode_option_field(self)
    }
}

fn encode_option_field<T: ToField>(val: &Option<T>) -> String {
    match val {
        Some(val) => val.to_field(),
        None => String::from(""),
    }
}
