//! Market data model and decoders: price/size ticks and historical bars.

use serde::{Deserialize, Serialize};
use time::macros::{format_description, time};
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use time_tz::{OffsetDateTimeExt, OffsetResult, PrimitiveDateTimeExt, TimeZone, Tz};

use crate::messages::ResponseMessage;
use crate::{server_versions, Error};

// Price tick types that carry a piggybacked size.
const BID: i32 = 1;
const ASK: i32 = 2;
const LAST: i32 = 4;
const DELAYED_BID: i32 = 66;
const DELAYED_ASK: i32 = 67;
const DELAYED_LAST: i32 = 68;

const BID_SIZE: i32 = 0;
const ASK_SIZE: i32 = 3;
const LAST_SIZE: i32 = 5;
const DELAYED_BID_SIZE: i32 = 69;
const DELAYED_ASK_SIZE: i32 = 70;
const DELAYED_LAST_SIZE: i32 = 71;

/// Flags attached to a price tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickAttribute {
    pub can_auto_execute: bool,
    pub past_limit: bool,
    pub pre_open: bool,
}

/// Decoded price tick, with the piggybacked size when the tick type pairs
/// with a size tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickPrice {
    pub request_id: i32,
    pub tick_type: i32,
    pub price: f64,
    pub attribute: TickAttribute,
    pub size: Option<f64>,
    pub size_tick_type: Option<i32>,
}

/// Decoded size tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickSize {
    pub request_id: i32,
    pub tick_type: i32,
    pub size: f64,
}

/// One aggregated trading bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: OffsetDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub wap: Option<f64>,
    pub count: i32,
}

/// Bars for a historical data request, with the covered range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalData {
    pub request_id: i32,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub bars: Vec<Bar>,
}

pub(crate) fn decode_tick_price(server_version: i32, message: &mut ResponseMessage) -> Result<TickPrice, Error> {
    message.skip(); // message type

    let message_version = message.next_int()?;

    let mut tick = TickPrice {
        request_id: message.next_int()?,
        tick_type: message.next_int()?,
        price: message.next_double()?,
        ..Default::default()
    };

    let size = if message_version >= 2 { message.next_double()? } else { 0.0 };

    if message_version >= 3 {
        let mask = message.next_int()?;

        if server_version >= server_versions::PAST_LIMIT {
            tick.attribute.can_auto_execute = mask & 0x1 == 0x1;
            tick.attribute.past_limit = mask & 0x2 == 0x2;
            if server_version >= server_versions::PRE_OPEN_BID_ASK {
                tick.attribute.pre_open = mask & 0x4 == 0x4;
            }
        } else {
            tick.attribute.can_auto_execute = mask == 1;
        }
    }

    let size_tick_type = match tick.tick_type {
        BID => Some(BID_SIZE),
        ASK => Some(ASK_SIZE),
        LAST => Some(LAST_SIZE),
        DELAYED_BID => Some(DELAYED_BID_SIZE),
        DELAYED_ASK => Some(DELAYED_ASK_SIZE),
        DELAYED_LAST => Some(DELAYED_LAST_SIZE),
        _ => None,
    };

    if message_version >= 2 && size_tick_type.is_some() {
        tick.size = Some(size);
        tick.size_tick_type = size_tick_type;
    }

    Ok(tick)
}

pub(crate) fn decode_tick_size(message: &mut ResponseMessage) -> Result<TickSize, Error> {
    message.skip(); // message type
    message.skip(); // message version

    Ok(TickSize {
        request_id: message.next_int()?,
        tick_type: message.next_int()?,
        size: message.next_double()?,
    })
}

pub(crate) fn decode_historical_data(server_version: i32, time_zone: &Tz, message: &mut ResponseMessage) -> Result<HistoricalData, Error> {
    message.skip(); // message type

    let mut message_version = i32::MAX;
    if server_version < server_versions::SYNT_REALTIME_BARS {
        message_version = message.next_int()?;
    }

    let request_id = message.next_int()?;

    let slice_format = format_description!("[year][month][day]  [hour]:[minute]:[second]");

    let mut start = OffsetDateTime::UNIX_EPOCH;
    let mut end = OffsetDateTime::UNIX_EPOCH;
    if message_version > 2 {
        start = assume_time_zone(PrimitiveDateTime::parse(&message.next_string()?, slice_format)?, time_zone)?;
        end = assume_time_zone(PrimitiveDateTime::parse(&message.next_string()?, slice_format)?, time_zone)?;
    }

    let bars_count = message.next_int()?;
    let mut bars = Vec::with_capacity(bars_count.max(0) as usize);
    for _ in 0..bars_count {
        let date = message.next_string()?;
        let open = message.next_double()?;
        let high = message.next_double()?;
        let low = message.next_double()?;
        let close = message.next_double()?;
        let volume = message.next_optional_decimal()?;
        let wap = message.next_optional_decimal()?;

        if server_version < server_versions::SYNT_REALTIME_BARS {
            message.skip(); // deprecated hasGaps
        }

        let mut bar_count = -1;
        if message_version >= 3 {
            bar_count = message.next_int()?;
        }

        bars.push(Bar {
            date: parse_bar_date(&date, time_zone)?,
            open,
            high,
            low,
            close,
            volume,
            wap,
            count: bar_count,
        });
    }

    Ok(HistoricalData {
        request_id,
        start,
        end,
        bars,
    })
}

// Bar dates arrive either as a YYYYMMDD day or a unix timestamp, depending on
// the requested bar size.
fn parse_bar_date(text: &str, time_zone: &Tz) -> Result<OffsetDateTime, Error> {
    if text.len() == 8 {
        let date_format = format_description!("[year][month][day]");
        let bar_date = Date::parse(text, date_format)?;
        let bar_date = bar_date.with_time(time!(00:00));

        Ok(bar_date.assume_timezone_utc(time_tz::timezones::db::UTC))
    } else {
        let timestamp: i64 = text.parse()?;
        match OffsetDateTime::from_unix_timestamp(timestamp) {
            Ok(date) => Ok(date.to_timezone(time_zone)),
            Err(err) => Err(Error::Simple(err.to_string())),
        }
    }
}

fn assume_time_zone(date_time: PrimitiveDateTime, time_zone: &Tz) -> Result<OffsetDateTime, Error> {
    match date_time.assume_timezone(time_zone) {
        OffsetResult::Some(date) => Ok(date),
        _ => Err(Error::Simple(format!("could not resolve {date_time} in zone {}", time_zone.name()))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use time::macros::datetime;
    use time_tz::timezones;

    use super::*;

    #[test]
    fn test_decode_tick_price_forwards_paired_size() {
        let mut message = ResponseMessage::from_simple("1|6|9001|1|185.5|100|7|");

        let tick = decode_tick_price(server_versions::SIZE_RULES, &mut message).unwrap();

        assert_eq!(tick.request_id, 9001);
        assert_eq!(tick.tick_type, BID);
        assert_eq!(tick.price, 185.5);
        assert_eq!(tick.size, Some(100.0));
        assert_eq!(tick.size_tick_type, Some(BID_SIZE));
        assert!(tick.attribute.can_auto_execute);
        assert!(tick.attribute.past_limit);
        assert!(tick.attribute.pre_open);
    }

    #[test]
    fn test_decode_tick_price_without_paired_size() {
        // Tick type 9 (close) has no size twin.
        let mut message = ResponseMessage::from_simple("1|6|9001|9|187.25|0|0|");

        let tick = decode_tick_price(server_versions::SIZE_RULES, &mut message).unwrap();

        assert_eq!(tick.tick_type, 9);
        assert_eq!(tick.size, None);
        assert_eq!(tick.size_tick_type, None);
        assert!(!tick.attribute.can_auto_execute);
    }

    #[test]
    fn test_tick_price_attribute_mask_before_past_limit_support() {
        let mut message = ResponseMessage::from_simple("1|6|9001|4|185.5|300|1|");

        let tick = decode_tick_price(server_versions::PAST_LIMIT - 1, &mut message).unwrap();

        // Old servers send a plain boolean in place of the bit mask.
        assert!(tick.attribute.can_auto_execute);
        assert!(!tick.attribute.past_limit);
        assert_eq!(tick.size_tick_type, Some(LAST_SIZE));
    }

    #[test]
    fn test_decode_tick_size() {
        let mut message = ResponseMessage::from_simple("2|6|9001|0|1200|");

        let tick = decode_tick_size(&mut message).unwrap();

        assert_eq!(tick.request_id, 9001);
        assert_eq!(tick.tick_type, BID_SIZE);
        assert_eq!(tick.size, 1200.0);
    }

    #[test]
    fn test_decode_historical_data() {
        let mut message = ResponseMessage::from_simple(
            "17|9000|20230405  10:00:00|20230406  10:00:00|2|1680647400|183.91|184.25|183.47|184.02|2856|183.92|915|1680651000|184.02|184.5|183.88|184.44|1129|184.21|324|",
        );

        let time_zone = timezones::db::america::NEW_YORK;
        let data = decode_historical_data(server_versions::SIZE_RULES, time_zone, &mut message).unwrap();

        assert_eq!(data.request_id, 9000);
        assert_eq!(data.start, datetime!(2023-04-05 10:00:00).assume_timezone(time_zone).unwrap());
        assert_eq!(data.end, datetime!(2023-04-06 10:00:00).assume_timezone(time_zone).unwrap());
        assert_eq!(data.bars.len(), 2);

        let bar = &data.bars[0];
        assert_eq!(bar.date, OffsetDateTime::from_unix_timestamp(1680647400).unwrap().to_timezone(time_zone));
        assert_eq!(bar.open, 183.91);
        assert_eq!(bar.high, 184.25);
        assert_eq!(bar.low, 183.47);
        assert_eq!(bar.close, 184.02);
        assert_eq!(bar.volume, Some(2856.0));
        assert_eq!(bar.wap, Some(183.92));
        assert_eq!(bar.count, 915);
    }

    #[test]
    fn test_decode_historical_data_zero_bars() {
        let mut message = ResponseMessage::from_simple("17|9000|20230405  10:00:00|20230406  10:00:00|0|");

        let time_zone = timezones::db::UTC;
        let data = decode_historical_data(server_versions::SIZE_RULES, time_zone, &mut message).unwrap();

        assert!(data.bars.is_empty());
    }

    #[test]
    fn test_decode_historical_data_unresolvable_range_is_error() {
        // 02:30 does not exist on the spring-forward date.
        let mut message = ResponseMessage::from_simple("17|9000|20230312  02:30:00|20230313  02:30:00|0|");

        let time_zone = timezones::db::america::NEW_YORK;
        let err = decode_historical_data(server_versions::SIZE_RULES, time_zone, &mut message).unwrap_err();
        assert!(format!("{err}").contains("America/New_York"));
    }

    #[test]
    fn test_decode_historical_data_daily_bar_date() {
        let mut message = ResponseMessage::from_simple("17|9000|20230405  10:00:00|20230406  10:00:00|1|20230405|183.91|184.25|183.47|184.02|2856|183.92|915|");

        let time_zone = timezones::db::UTC;
        let data = decode_historical_data(server_versions::SIZE_RULES, time_zone, &mut message).unwrap();

        assert_eq!(data.bars[0].date, datetime!(2023-04-05 00:00:00 UTC));
    }
}
