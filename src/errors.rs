//! Error type and gateway notice codes.

use std::num::{ParseFloatError, ParseIntError};
use std::string::FromUtf8Error;
use std::sync::PoisonError;
use std::{error, fmt};

/// Errors surfaced by the wire protocol client.
#[derive(Debug)]
pub enum Error {
    /// Socket level failure.
    Io(std::io::Error),
    /// Integer field could not be parsed.
    ParseInt(ParseIntError),
    /// Payload bytes were not valid UTF-8.
    FromUtf8(FromUtf8Error),
    /// Timestamp field could not be parsed.
    ParseTime(time::error::Parse),
    /// A mutex guarding the socket was poisoned.
    Poison(String),
    /// The length prefix of a frame was malformed. Fatal for the connection.
    Framing(String),
    /// A field failed to decode. Carries the field position, the offending
    /// text and the parser message. Scoped to the current message only.
    Parse(usize, String, String),
    /// The leading tag of a message is not a known message type.
    UnknownMessageType(i32),
    /// Catch-all with a human readable description.
    Simple(String),
    /// Connection establishment failed.
    ConnectionFailed,
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(ref inner) => write!(f, "io error: {inner}"),
            Error::ParseInt(ref inner) => write!(f, "parse int error: {inner}"),
            Error::FromUtf8(ref inner) => write!(f, "utf8 error: {inner}"),
            Error::ParseTime(ref inner) => write!(f, "parse time error: {inner}"),
            Error::Poison(ref inner) => write!(f, "poisoned lock: {inner}"),
            Error::Framing(ref description) => write!(f, "framing error: {description}"),
            Error::Parse(i, ref value, ref message) => write!(f, "parse error: {i} - {value} - {message}"),
            Error::UnknownMessageType(tag) => write!(f, "unknown message type: {tag}"),
            Error::Simple(ref description) => write!(f, "error occurred: {description}"),
            Error::ConnectionFailed => write!(f, "connection failed"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseIntError> for Error {
    fn from(err: ParseIntError) -> Error {
        Error::ParseInt(err)
    }
}

impl From<ParseFloatError> for Error {
    fn from(err: ParseFloatError) -> Error {
        Error::Simple(err.to_string())
    }
}

impl From<FromUtf8Error> for Error {
    fn from(err: FromUtf8Error) -> Error {
        Error::FromUtf8(err)
    }
}

impl From<time::error::Parse> for Error {
    fn from(err: time::error::Parse) -> Error {
        Error::ParseTime(err)
    }
}

impl From<time::error::ComponentRange> for Error {
    fn from(err: time::error::ComponentRange) -> Error {
        Error::Simple(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Error {
        Error::Poison(err.to_string())
    }
}

/// Request id used when a notice is not tied to any request or order.
pub const NO_VALID_ID: i32 = -1;

/// Well known client side notice delivered through the event sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Notice {
    pub code: i32,
    pub message: &'static str,
}

pub const CONNECT_FAIL: Notice = Notice {
    code: 502,
    message: "Couldn't connect to the gateway. Confirm that it is running and that the API port is open.",
};

pub const UNKNOWN_ID: Notice = Notice {
    code: 505,
    message: "Fatal error: unknown message id.",
};

pub const BAD_LENGTH: Notice = Notice {
    code: 507,
    message: "Bad message length.",
};

pub const BAD_MESSAGE: Notice = Notice {
    code: 508,
    message: "Bad message.",
};

pub const FAIL_CREATE_SOCK: Notice = Notice {
    code: 520,
    message: "Failed to create socket.",
};
