use std::{
    fmt::{
        Display,
        Formatter,
    },
    str::FromStr,
};

use bytes::{
    BufMut,
    BytesMut,
};
use chrono::{
    DateTime,
    Datelike,
    Timelike,
    Utc,
};

use codec::Frame;

use crate::ids;

/// Which stored state the receiver keeps across a restart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RestartMode {
    Hot  = 0x01,
    Warm = 0x02,
    Cold = 0x03,
}

impl FromStr for RestartMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(Self::Hot),
            "warm" => Ok(Self::Warm),
            "cold" => Ok(Self::Cold),
            other => Err(format!("unknown restart mode {other:?} (expected hot, warm or cold)")),
        }
    }
}

impl Display for RestartMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
        };

        f.write_str(name)
    }
}

/// System restart (`0x01`). The timestamp is UTC; the position hint is
/// latitude and longitude in whole degrees and altitude in meters, zero when
/// unknown.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RebootCommand {
    pub mode:      RestartMode,
    pub year:      u16,
    pub month:     u8,
    pub day:       u8,
    pub hour:      u8,
    pub minute:    u8,
    pub second:    u8,
    pub latitude:  i16,
    pub longitude: i16,
    pub altitude:  i16,
}

impl RebootCommand {
    /// Bytes after the message id.
    pub const BODY_LEN: usize = 14;

    pub fn at(mode: RestartMode, time: DateTime<Utc>) -> Self {
        Self {
            mode,
            year: time.year() as u16,
            month: time.month() as u8,
            day: time.day() as u8,
            hour: time.hour() as u8,
            minute: time.minute() as u8,
            second: time.second() as u8,
            latitude: 0,
            longitude: 0,
            altitude: 0,
        }
    }

    #[inline]
    pub fn now(mode: RestartMode) -> Self {
        Self::at(mode, Utc::now())
    }

    pub fn to_frame(&self) -> Frame {
        let mut body = BytesMut::with_capacity(Self::BODY_LEN);

        body.put_u8(self.mode as u8);
        body.put_u16(self.year);
        body.put_slice(&[self.month, self.day, self.hour, self.minute, self.second]);
        body.put_i16(self.latitude);
        body.put_i16(self.longitude);
        body.put_i16(self.altitude);

        debug_assert_eq!(body.len(), Self::BODY_LEN);

        Frame::new(ids::SYSTEM_RESTART, body)
    }
}

/// Query GPS time (`64 20`). Always `A0 A1 00 02 64 20 44 0D 0A` on the wire.
#[inline]
pub fn build_time_query() -> Frame {
    Frame::new(ids::GPS_TIME_GROUP, [ids::QUERY_GPS_TIME])
}

#[inline]
pub fn build_reboot(mode: RestartMode, timestamp: DateTime<Utc>) -> Frame {
    RebootCommand::at(mode, timestamp).to_frame()
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn time_query_bytes() {
        assert_eq!(build_time_query().to_bytes().as_ref(), &[
            0xa0, 0xa1, 0x00, 0x02, 0x64, 0x20, 0x44, 0x0d, 0x0a
        ]);
    }

    #[test]
    fn reboot_bytes() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 6, 7, 8).unwrap();
        let frame = build_reboot(RestartMode::Cold, ts);

        assert_eq!(frame.declared_length(), 15);
        assert_eq!(frame.to_bytes().as_ref(), &[
            0xa0, 0xa1, 0x00, 0x0f, // header
            0x01, 0x03, 0x07, 0xe8, 0x03, 0x05, 0x06, 0x07, 0x08, // id, mode, timestamp
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // position
            0xe2, 0x0d, 0x0a,
        ]);
    }

    #[test]
    fn reboot_position() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let cmd = RebootCommand {
            latitude: 25,
            longitude: -121,
            altitude: 100,
            ..RebootCommand::at(RestartMode::Hot, ts)
        };

        let frame = cmd.to_frame();
        assert_eq!(&frame.body()[8..], &[0x00, 0x19, 0xff, 0x87, 0x00, 0x64]);
        assert_eq!(frame.body()[0], 0x01);
    }

    #[test]
    fn parse_mode() {
        assert_eq!("cold".parse::<RestartMode>(), Ok(RestartMode::Cold));
        assert_eq!("Warm".parse::<RestartMode>(), Ok(RestartMode::Warm));
        assert_eq!(RestartMode::Hot.to_string(), "hot");
        assert!("lukewarm".parse::<RestartMode>().is_err());
    }
}
