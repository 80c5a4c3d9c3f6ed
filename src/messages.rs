//! Wire message types: field splitting, typed field consumption and framing.
//!
//! A message on the wire is a length-prefixed sequence of NUL-delimited text
//! fields. The first field is an integer tag identifying the message type.
//! [ResponseMessage] splits an inbound payload and exposes a cursor that
//! consumes exactly one field per call. [RequestMessage] builds outbound
//! payloads field by field.

use std::fmt;
use std::io::Write;
use std::ops::Index;
use std::str::FromStr;

use byteorder::{BigEndian, WriteBytesExt};

use crate::{Error, ToField};

/// Wire text for an unset 32-bit integer.
pub const UNSET_INTEGER: &str = "2147483647";
/// Wire text for an unset 64-bit integer.
pub const UNSET_LONG: &str = "9223372036854775807";
/// Wire text for an unset floating-point value.
pub const UNSET_DOUBLE: &str = "1.7976931348623157E308";
/// Wire text for positive infinity.
pub const INFINITY_STR: &str = "Infinity";

/// Message types pushed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncomingMessages {
    NotValid,
    TickPrice,
    TickSize,
    OrderStatus,
    Error,
    OpenOrder,
    AccountValue,
    NextValidId,
    ContractData,
    ExecutionData,
    ManagedAccounts,
    HistoricalData,
    CurrentTime,
    ContractDataEnd,
    OpenOrderEnd,
    ExecutionDataEnd,
    CommissionsReport,
    CompletedOrder,
    CompletedOrdersEnd,
}

impl From<i32> for IncomingMessages {
    fn from(value: i32) -> IncomingMessages {
        match value {
            1 => IncomingMessages::TickPrice,
            2 => IncomingMessages::TickSize,
            3 => IncomingMessages::OrderStatus,
            4 => IncomingMessages::Error,
            5 => IncomingMessages::OpenOrder,
            6 => IncomingMessages::AccountValue,
            9 => IncomingMessages::NextValidId,
            10 => IncomingMessages::ContractData,
            11 => IncomingMessages::ExecutionData,
            15 => IncomingMessages::ManagedAccounts,
            17 => IncomingMessages::HistoricalData,
            49 => IncomingMessages::CurrentTime,
            52 => IncomingMessages::ContractDataEnd,
            53 => IncomingMessages::OpenOrderEnd,
            55 => IncomingMessages::ExecutionDataEnd,
            59 => IncomingMessages::CommissionsReport,
            101 => IncomingMessages::CompletedOrder,
            102 => IncomingMessages::CompletedOrdersEnd,
            _ => IncomingMessages::NotValid,
        }
    }
}

/// Message types sent to the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutgoingMessages {
    StartApi = 71,
}

impl ToField for OutgoingMessages {
    fn to_field(&self) -> String {
        (*self as i32).to_string()
    }
}

impl fmt::Display for OutgoingMessages {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", *self as i32)
    }
}

/// Prefixes the payload with its length as a 4-byte big-endian integer.
pub fn encode_length(message: &str) -> Vec<u8> {
    let data = message.as_bytes();

    let mut packet: Vec<u8> = Vec::with_capacity(data.len() + 4);

    packet.write_u32::<BigEndian>(data.len() as u32).unwrap();
    packet.write_all(data).unwrap();
    packet
}

/// Builder for outbound gateway messages.
#[derive(Clone, Debug, Default)]
pub struct RequestMessage {
    pub(crate) fields: Vec<String>,
}

impl RequestMessage {
    pub fn new() -> RequestMessage {
        RequestMessage::default()
    }

    pub fn push_field<T: ToField>(&mut self, val: &T) -> &RequestMessage {
        let field = val.to_field();
        self.fields.push(field);
        self
    }

    /// Encode the message as a NUL-delimited string with trailing delimiter.
    pub fn encode(&self) -> String {
        let mut data = self.fields.join("\0");
        data.push('\0');
        data
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    #[cfg(test)]
    /// Serialize the message as a pipe-delimited string (test helper).
    pub(crate) fn encode_simple(&self) -> String {
        let mut data = self.fields.join("|");
        data.push('|');
        data
    }
}

impl Index<usize> for RequestMessage {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.fields[i]
    }
}

/// Inbound gateway message split into positional fields with a read cursor.
#[derive(Clone, Debug, Default)]
pub struct ResponseMessage {
    pub i: usize,
    pub fields: Vec<String>,
}

impl ResponseMessage {
    /// Split a NUL-delimited payload into fields. The trailing delimiter does
    /// not produce a phantom empty field; empty fields in between are kept.
    pub fn from(fields: &str) -> ResponseMessage {
        ResponseMessage {
            i: 0,
            fields: fields.split_terminator('\x00').map(|x| x.to_string()).collect(),
        }
    }

    /// Split a pipe-delimited payload (test fixtures).
    pub fn from_simple(fields: &str) -> ResponseMessage {
        ResponseMessage {
            i: 0,
            fields: fields.split_terminator('|').map(|x| x.to_string()).collect(),
        }
    }

    /// The message type tag from the first field.
    pub fn message_type(&self) -> IncomingMessages {
        if self.fields.is_empty() {
            IncomingMessages::NotValid
        } else {
            let message_id = i32::from_str(&self.fields[0]).unwrap_or(-1);
            IncomingMessages::from(message_id)
        }
    }

    /// The raw integer tag, valid or not.
    pub fn message_tag(&self) -> i32 {
        if self.fields.is_empty() {
            -1
        } else {
            i32::from_str(&self.fields[0]).unwrap_or(-1)
        }
    }

    /// Try to extract the request id without advancing the cursor.
    pub fn request_id(&self) -> Option<i32> {
        if let Some(i) = request_id_index(self.message_type()) {
            if let Ok(request_id) = self.peek_int(i) {
                return Some(request_id);
            }
        }
        None
    }

    /// Peek an integer field without advancing the cursor.
    pub fn peek_int(&self, i: usize) -> Result<i32, Error> {
        if i >= self.fields.len() {
            return Err(Error::Simple("expected int and found end of message".into()));
        }

        let field = &self.fields[i];
        match field.parse::<i32>() {
            Ok(val) => Ok(val),
            Err(err) => Err(Error::Parse(i, field.into(), err.to_string())),
        }
    }

    /// Consume and parse the next integer field.
    pub fn next_int(&mut self) -> Result<i32, Error> {
        if self.i >= self.fields.len() {
            return Err(Error::Simple("expected int and found end of message".into()));
        }

        let field = &self.fields[self.i];
        self.i += 1;

        match field.parse() {
            Ok(val) => Ok(val),
            Err(err) => Err(Error::Parse(self.i, field.into(), err.to_string())),
        }
    }

    /// Consume the next integer field, returning `None` when unset.
    pub fn next_optional_int(&mut self) -> Result<Option<i32>, Error> {
        if self.i >= self.fields.len() {
            return Err(Error::Simple("expected optional int and found end of message".into()));
        }

        let field = &self.fields[self.i];
        self.i += 1;

        if field.is_empty() || field == UNSET_INTEGER {
            return Ok(None);
        }

        match field.parse::<i32>() {
            Ok(val) => Ok(Some(val)),
            Err(err) => Err(Error::Parse(self.i, field.into(), err.to_string())),
        }
    }

    /// Consume the next field as a boolean. Integer text; non-zero is true.
    pub fn next_bool(&mut self) -> Result<bool, Error> {
        if self.i >= self.fields.len() {
            return Err(Error::Simple("expected bool and found end of message".into()));
        }

        let field = &self.fields[self.i];
        self.i += 1;

        if field.is_empty() {
            return Ok(false);
        }

        match field.parse::<i32>() {
            Ok(val) => Ok(val != 0),
            Err(err) => Err(Error::Parse(self.i, field.into(), err.to_string())),
        }
    }

    /// Consume and parse the next i64 field.
    pub fn next_long(&mut self) -> Result<i64, Error> {
        if self.i >= self.fields.len() {
            return Err(Error::Simple("expected long and found end of message".into()));
        }

        let field = &self.fields[self.i];
        self.i += 1;

        match field.parse() {
            Ok(val) => Ok(val),
            Err(err) => Err(Error::Parse(self.i, field.into(), err.to_string())),
        }
    }

    /// Consume the next i64 field, returning `None` when unset.
    pub fn next_optional_long(&mut self) -> Result<Option<i64>, Error> {
        if self.i >= self.fields.len() {
            return Err(Error::Simple("expected optional long and found end of message".into()));
        }

        let field = &self.fields[self.i];
        self.i += 1;

        if field.is_empty() || field == UNSET_LONG {
            return Ok(None);
        }

        match field.parse::<i64>() {
            Ok(val) => Ok(Some(val)),
            Err(err) => Err(Error::Parse(self.i, field.into(), err.to_string())),
        }
    }

    /// Consume the next field as a string.
    pub fn next_string(&mut self) -> Result<String, Error> {
        if self.i >= self.fields.len() {
            return Err(Error::Simple("expected string and found end of message".into()));
        }

        let field = &self.fields[self.i];
        self.i += 1;
        Ok(String::from(field))
    }

    /// Consume and parse the next floating-point field. Empty reads as zero,
    /// the infinity token as positive infinity.
    pub fn next_double(&mut self) -> Result<f64, Error> {
        if self.i >= self.fields.len() {
            return Err(Error::Simple("expected double and found end of message".into()));
        }

        let field = &self.fields[self.i];
        self.i += 1;

        if field.is_empty() || field == "0" || field == "0.0" {
            return Ok(0.0);
        }

        if field == INFINITY_STR {
            return Ok(f64::INFINITY);
        }

        match field.parse() {
            Ok(val) => Ok(val),
            Err(err) => Err(Error::Parse(self.i, field.into(), err.to_string())),
        }
    }

    /// Consume the next floating-point field, returning `None` when unset.
    pub fn next_optional_double(&mut self) -> Result<Option<f64>, Error> {
        if self.i >= self.fields.len() {
            return Err(Error::Simple("expected optional double and found end of message".into()));
        }

        let field = &self.fields[self.i];
        self.i += 1;

        if field.is_empty() || field == UNSET_DOUBLE {
            return Ok(None);
        }

        if field == INFINITY_STR {
            return Ok(Some(f64::INFINITY));
        }

        match field.parse::<f64>() {
            Ok(val) => Ok(Some(val)),
            Err(err) => Err(Error::Parse(self.i, field.into(), err.to_string())),
        }
    }

    /// Consume the next decimal quantity field. Any of the integer, long or
    /// double max sentinels marks the value unset.
    pub fn next_optional_decimal(&mut self) -> Result<Option<f64>, Error> {
        if self.i >= self.fields.len() {
            return Err(Error::Simple("expected optional decimal and found end of message".into()));
        }

        let field = &self.fields[self.i];
        self.i += 1;

        if field.is_empty() || field == UNSET_INTEGER || field == UNSET_LONG || field == UNSET_DOUBLE {
            return Ok(None);
        }

        match field.parse::<f64>() {
            Ok(val) => Ok(Some(val)),
            Err(err) => Err(Error::Parse(self.i, field.into(), err.to_string())),
        }
    }

    /// Advance the cursor past the next field.
    pub fn skip(&mut self) {
        self.i += 1;
    }

    /// Encode the message back into a NUL-delimited string.
    pub fn encode(&self) -> String {
        let mut data = self.fields.join("\0");
        data.push('\0');
        data
    }

    /// Serialize the message as a pipe-delimited string (diagnostics).
    pub fn encode_simple(&self) -> String {
        let mut data = self.fields.join("|");
        data.push('|');
        data
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Position of the request id field for messages that carry one.
fn request_id_index(kind: IncomingMessages) -> Option<usize> {
    match kind {
        IncomingMessages::ContractData | IncomingMessages::ExecutionData | IncomingMessages::HistoricalData => Some(1),
        IncomingMessages::TickPrice
        | IncomingMessages::TickSize
        | IncomingMessages::ContractDataEnd
        | IncomingMessages::ExecutionDataEnd
        | IncomingMessages::Error => Some(2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_split_preserves_empty_fields() {
        let message = ResponseMessage::from("3\x0013\x00\x00100\x00");

        assert_eq!(message.fields, vec!["3", "13", "", "100"]);
        assert_eq!(message.message_type(), IncomingMessages::OrderStatus);
    }

    #[test]
    fn test_split_without_delimiter_is_single_field() {
        let message = ResponseMessage::from("17");
        assert_eq!(message.fields, vec!["17"]);
    }

    #[test]
    fn test_empty_payload_is_not_valid() {
        let message = ResponseMessage::from("");
        assert!(message.is_empty());
        assert_eq!(message.message_type(), IncomingMessages::NotValid);
    }

    #[test]
    fn test_unknown_tag_is_not_valid() {
        let message = ResponseMessage::from_simple("999|1|2|");
        assert_eq!(message.message_type(), IncomingMessages::NotValid);
        assert_eq!(message.message_tag(), 999);
    }

    #[test]
    fn test_cursor_consumes_one_field_per_call() {
        let mut message = ResponseMessage::from_simple("5|12|AAPL|1|265.5|");

        assert_eq!(message.next_int().unwrap(), 5);
        assert_eq!(message.next_int().unwrap(), 12);
        assert_eq!(message.next_string().unwrap(), "AAPL");
        assert!(message.next_bool().unwrap());
        assert_eq!(message.next_double().unwrap(), 265.5);
        assert!(matches!(message.next_int(), Err(Error::Simple(_))));
    }

    #[test]
    fn test_end_of_message_is_error_not_panic() {
        let mut message = ResponseMessage::from_simple("3|");
        message.skip();

        let err = message.next_string().unwrap_err();
        assert_eq!(format!("{err}"), "error occurred: expected string and found end of message");
    }

    #[test]
    fn test_optional_int_sentinels() {
        let mut message = ResponseMessage::from_simple("|2147483647|42|");

        assert_eq!(message.next_optional_int().unwrap(), None);
        assert_eq!(message.next_optional_int().unwrap(), None);
        assert_eq!(message.next_optional_int().unwrap(), Some(42));
    }

    #[test]
    fn test_optional_long_sentinels() {
        let mut message = ResponseMessage::from_simple("|9223372036854775807|17|");

        assert_eq!(message.next_optional_long().unwrap(), None);
        assert_eq!(message.next_optional_long().unwrap(), None);
        assert_eq!(message.next_optional_long().unwrap(), Some(17));
    }

    #[test]
    fn test_optional_double_sentinels() {
        let mut message = ResponseMessage::from_simple("|1.7976931348623157E308|Infinity|1.5|");

        assert_eq!(message.next_optional_double().unwrap(), None);
        assert_eq!(message.next_optional_double().unwrap(), None);
        assert_eq!(message.next_optional_double().unwrap(), Some(f64::INFINITY));
        assert_eq!(message.next_optional_double().unwrap(), Some(1.5));
    }

    #[test]
    fn test_double_infinity_token() {
        let mut message = ResponseMessage::from_simple("Infinity||");
        assert_eq!(message.next_double().unwrap(), f64::INFINITY);
        assert_eq!(message.next_double().unwrap(), 0.0);
    }

    #[test]
    fn test_optional_decimal_sentinels() {
        let mut message = ResponseMessage::from_simple("2147483647|9223372036854775807|1.7976931348623157E308||100.5|");

        assert_eq!(message.next_optional_decimal().unwrap(), None);
        assert_eq!(message.next_optional_decimal().unwrap(), None);
        assert_eq!(message.next_optional_decimal().unwrap(), None);
        assert_eq!(message.next_optional_decimal().unwrap(), None);
        assert_eq!(message.next_optional_decimal().unwrap(), Some(100.5));
    }

    #[test]
    fn test_bool_parses_integer_text() {
        let mut message = ResponseMessage::from_simple("1|0||2|-1|");
        assert!(message.next_bool().unwrap());
        assert!(!message.next_bool().unwrap());
        assert!(!message.next_bool().unwrap());
        // Coerced from the integer, not compared against "1".
        assert!(message.next_bool().unwrap());
        assert!(message.next_bool().unwrap());

        let mut message = ResponseMessage::from_simple("yes|");
        assert!(matches!(message.next_bool(), Err(Error::Parse(_, _, _))));
    }

    #[test]
    fn test_parse_error_carries_offending_text() {
        let mut message = ResponseMessage::from_simple("abc|");
        match message.next_int() {
            Err(Error::Parse(position, value, _)) => {
                assert_eq!(position, 1);
                assert_eq!(value, "abc");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_round_trip() {
        let message = ResponseMessage::from("9\x001\x0043\x00");
        assert_eq!(message.encode(), "9\x001\x0043\x00");
        assert_eq!(message.encode_simple(), "9|1|43|");

        let round_trip = ResponseMessage::from(&message.encode());
        assert_eq!(round_trip.fields, message.fields);
    }

    #[test]
    fn test_encode_length() {
        let packet = encode_length("v100..186");
        assert_eq!(&packet[0..4], &[0, 0, 0, 9]);
        assert_eq!(&packet[4..], "v100..186".as_bytes());
    }

    #[test]
    fn test_request_message() {
        let mut message = RequestMessage::new();
        message.push_field(&OutgoingMessages::StartApi);
        message.push_field(&2);
        message.push_field(&100);
        message.push_field(&"");

        assert_eq!(message.len(), 4);
        assert_eq!(message.encode(), "71\x002\x00100\x00\x00");
        assert_eq!(message.encode_simple(), "71|2|100||");
        assert_eq!(message[0], "71");
    }

    #[test]
    fn test_request_id_lookup() {
        let message = ResponseMessage::from_simple("17|9000|20230405  10:00:00|20230406  10:00:00|0|");
        assert_eq!(message.request_id(), Some(9000));

        let message = ResponseMessage::from_simple("9|1|43|");
        assert_eq!(message.request_id(), None);
    }
}
