use std::fmt::{
    Display,
    Formatter,
};

use chrono::{
    DateTime,
    Utc,
};
use packed_struct::prelude::*;

use codec::Frame;

use crate::{
    ids,
    DecodeError,
};

/// Seconds from the Unix epoch to the GPS epoch (1980-01-06T00:00:00Z).
pub const GPS_EPOCH_OFFSET: i64 = 315_964_800;
pub const SECONDS_PER_WEEK: i64 = 7 * 24 * 60 * 60;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Time fields of the GPS time response (`64 8E`), in wire order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "13", endian = "msb")]
pub struct GpsTime {
    pub time_of_week_ms:      u32,
    pub sub_tow_ns:           u32,
    pub week_number:          u16,
    pub default_leap_seconds: i8,
    pub current_leap_seconds: i8,
    /// Advisory; surfaced as received and never checked.
    pub valid_flag:           u8,
}

impl GpsTime {
    pub const SIZE_BYTES: usize = 13;

    /// Offset of the time fields within the response payload, past the
    /// message id and sub-id.
    pub const PAYLOAD_OFFSET: usize = 2;

    /// Decode the time fields from the start of `fields`. Trailing bytes are
    /// ignored.
    pub fn decode(fields: &[u8]) -> Result<Self, DecodeError> {
        let Some(fields) = fields.get(..Self::SIZE_BYTES) else {
            return Err(DecodeError::TruncatedPayload {
                need: Self::SIZE_BYTES,
                got:  fields.len(),
            });
        };

        Ok(Self::unpack_from_slice(fields)?)
    }

    /// Decode a complete GPS time response payload (message id onward).
    #[tracing::instrument(level = "trace", fields(payload = %hex::encode(payload)), err(Display))]
    pub fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let need = Self::PAYLOAD_OFFSET + Self::SIZE_BYTES;

        match payload {
            [ids::GPS_TIME_GROUP, ids::GPS_TIME, ..] if payload.len() < need => {
                Err(DecodeError::TruncatedPayload {
                    need,
                    got: payload.len(),
                })
            },
            [ids::GPS_TIME_GROUP, ids::GPS_TIME, ..] => Self::decode(&payload[Self::PAYLOAD_OFFSET..]),
            [] => Err(DecodeError::TruncatedPayload {
                need,
                got: 0,
            }),
            [id, rest @ ..] => Err(DecodeError::UnexpectedMessage {
                id:     *id,
                sub_id: rest.first().copied(),
            }),
        }
    }

    #[inline]
    pub fn from_frame(frame: &Frame) -> Result<Self, DecodeError> {
        Self::from_payload(frame.payload())
    }

    /// Unix time as whole seconds and a nanosecond remainder below one second.
    ///
    /// Uses the default leap-second count, as the receiver reports time
    /// against it.
    pub fn to_epoch(&self) -> (i64, u32) {
        let seconds = GPS_EPOCH_OFFSET
            + self.week_number as i64 * SECONDS_PER_WEEK
            + (self.time_of_week_ms / 1000) as i64
            - self.default_leap_seconds as i64;

        let nanos = (self.time_of_week_ms % 1000) as u64 * 1_000_000 + self.sub_tow_ns as u64;

        (seconds + (nanos / NANOS_PER_SEC) as i64, (nanos % NANOS_PER_SEC) as u32)
    }

    #[inline]
    pub fn display_epoch(&self) -> EpochDisplay<'_> {
        EpochDisplay(self)
    }

    #[inline]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let (secs, nanos) = self.to_epoch();
        DateTime::from_timestamp(secs, nanos)
    }
}

/// Log-friendly rendering of a [`GpsTime`]: Unix time first, then the raw
/// fields. The derived `Display` prints the packed field table instead.
#[derive(Copy, Clone, Debug)]
pub struct EpochDisplay<'a>(&'a GpsTime);

impl Display for EpochDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let time = self.0;
        let (secs, nanos) = time.to_epoch();

        write!(
            f,
            "{secs}.{nanos:09} (wn {}, tow {}ms + {}ns, leap {}/{}, valid {:#04x})",
            time.week_number,
            time.time_of_week_ms,
            time.sub_tow_ns,
            time.default_leap_seconds,
            time.current_leap_seconds,
            time.valid_flag,
        )
    }
}
