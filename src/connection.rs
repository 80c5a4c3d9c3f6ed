//! Connection establishment: version handshake and the start-API exchange.

use std::sync::Arc;

use log::{debug, error, warn};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use time_tz::{timezones, OffsetResult, PrimitiveDateTimeExt, TimeZone, Tz};

use crate::messages::{encode_length, OutgoingMessages, RequestMessage, ResponseMessage};
use crate::transport::{FrameBuffer, FrameTransport};
use crate::{server_versions, Error};

/// Oldest protocol version this client can speak.
pub const MIN_CLIENT_VERSION: i32 = 100;
/// Newest protocol version this client can speak.
pub const MAX_CLIENT_VERSION: i32 = server_versions::BOND_ACCRUED_INTEREST;

// Receive attempts while waiting for the handshake ack; each waits up to the
// transport read timeout.
const HANDSHAKE_ATTEMPTS: i32 = 30;

/// An established connection: the negotiated server version plus the server
/// clock at connect time. The server version is immutable for the life of the
/// connection and is threaded explicitly into every decode routine.
#[derive(Debug, Clone)]
pub struct ConnectionMetadata {
    pub client_id: i32,
    pub server_version: i32,
    pub connection_time: Option<OffsetDateTime>,
    pub time_zone: Option<&'static Tz>,
}

/// Perform the handshake and start-API exchange on a connected transport.
pub fn establish_connection(transport: &Arc<FrameTransport>, client_id: i32) -> Result<ConnectionMetadata, Error> {
    let (server_version, server_time) = handshake(transport)?;
    start_api(transport, client_id, server_version)?;

    let (connection_time, time_zone) = parse_connection_time(&server_time);

    Ok(ConnectionMetadata {
        client_id,
        server_version,
        connection_time,
        time_zone,
    })
}

// Sends the version range and waits for the server's version/time frame.
fn handshake(transport: &Arc<FrameTransport>) -> Result<(i32, String), Error> {
    let version_range = format!("v{MIN_CLIENT_VERSION}..{MAX_CLIENT_VERSION}");
    debug!("-> handshake {version_range}");

    let mut packet = Vec::from(b"API\0");
    packet.extend_from_slice(&encode_length(&version_range));
    transport.send(&packet)?;

    let ack = read_frame(transport)?;
    let mut response = ResponseMessage::from(&String::from_utf8_lossy(&ack));

    let server_version = response.next_int()?;
    let server_time = response.next_string()?;
    debug!("<- handshake ack: server version {server_version}, time {server_time}");

    Ok((server_version, server_time))
}

fn start_api(transport: &Arc<FrameTransport>, client_id: i32, server_version: i32) -> Result<(), Error> {
    const VERSION: i32 = 2;

    let mut message = RequestMessage::new();
    message.push_field(&OutgoingMessages::StartApi);
    message.push_field(&VERSION);
    message.push_field(&client_id);

    if server_version > server_versions::OPTIONAL_CAPABILITIES {
        message.push_field(&""); // optional capabilities, unused
    }

    transport.send(&encode_length(&message.encode()))?;
    Ok(())
}

// The handshake happens before the reader thread exists, so frames are pulled
// here with a bounded number of receive attempts.
fn read_frame(transport: &Arc<FrameTransport>) -> Result<Vec<u8>, Error> {
    let mut frames = FrameBuffer::new();

    for _ in 0..HANDSHAKE_ATTEMPTS {
        frames.extend(&transport.receive()?);
        if let Some(frame) = frames.next_frame()? {
            return Ok(frame);
        }
        if !transport.is_connected() {
            break;
        }
    }

    error!("no handshake response; the server may be rejecting connections from this host");
    Err(Error::ConnectionFailed)
}

/// Parse the server clock string sent with the handshake ack, e.g.
/// "20230405 22:20:39 PST". Failures are logged and tolerated; the connection
/// stays usable without a resolved clock.
pub fn parse_connection_time(connection_time: &str) -> (Option<OffsetDateTime>, Option<&'static Tz>) {
    let parts: Vec<&str> = connection_time.split(' ').collect();

    if parts.len() < 3 {
        warn!("invalid connection time: {connection_time}");
        return (None, None);
    }

    let zones = timezones::find_by_name(parts[2]);
    if zones.is_empty() {
        warn!("time zone not found for {}", parts[2]);
        return (None, None);
    }
    let time_zone = zones[0];

    let format = format_description!("[year][month][day] [hour]:[minute]:[second]");
    let date_text = format!("{} {}", parts[0], parts[1]);

    match PrimitiveDateTime::parse(&date_text, format) {
        Ok(connected_at) => match connected_at.assume_timezone(time_zone) {
            OffsetResult::Some(date) => (Some(date), Some(time_zone)),
            _ => {
                warn!("could not resolve {date_text} in zone {}", time_zone.name());
                (None, Some(time_zone))
            }
        },
        Err(err) => {
            warn!("could not parse connection time {date_text}: {err}");
            (None, Some(time_zone))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use time::macros::{datetime, offset};
    use time_tz::{OffsetResult, PrimitiveDateTimeExt};

    use super::*;

    #[test]
    fn test_parse_connection_time() {
        let (connection_time, time_zone) = parse_connection_time("20230405 22:20:39 PST");

        // Several tzdb zones answer to "PST"; pin the instant, not the name.
        let zone = time_zone.expect("zone should resolve");
        if let OffsetResult::Some(expected) = datetime!(2023-04-05 22:20:39).assume_timezone(zone) {
            assert_eq!(connection_time, Some(expected));
        }
        // Pacific time observes daylight saving on this date.
        assert_eq!(connection_time.map(|t| t.offset()), Some(offset!(-7)));
    }

    #[test]
    fn test_parse_connection_time_unresolvable_local_time() {
        // 02:30 does not exist on the spring-forward date.
        let (time, zone) = parse_connection_time("20230312 02:30:00 America/New_York");
        assert_eq!(time, None);
        assert!(zone.is_some());
    }

    #[test]
    fn test_parse_connection_time_tolerates_garbage() {
        assert_eq!(parse_connection_time("nonsense"), (None, None));
        assert_eq!(parse_connection_time("20230405 22:20:39 NOT_A_ZONE"), (None, None));

        let (time, zone) = parse_connection_time("2023XX05 22:20:39 UTC");
        assert_eq!(time, None);
        assert!(zone.is_some());
    }

    #[test]
    fn test_start_api_message_layout() {
        const VERSION: i32 = 2;

        let mut message = RequestMessage::new();
        message.push_field(&OutgoingMessages::StartApi);
        message.push_field(&VERSION);
        message.push_field(&100);
        message.push_field(&"");

        assert_eq!(message.encode(), "71\x002\x00100\x00\x00");
    }

    #[test]
    fn test_handshake_version_range() {
        let version_range = format!("v{MIN_CLIENT_VERSION}..{MAX_CLIENT_VERSION}");
        assert_eq!(version_range, "v100..186");
    }
}
