//! Message ids and sub-ids used on the wire.

pub const SYSTEM_RESTART: u8 = 0x01;

/// Shared by the time query (sub-id [`QUERY_GPS_TIME`]) and its response
/// (sub-id [`GPS_TIME`]).
pub const GPS_TIME_GROUP: u8 = 0x64;
pub const QUERY_GPS_TIME: u8 = 0x20;
pub const GPS_TIME: u8 = 0x8e;

pub const ACK: u8 = 0x83;
pub const NACK: u8 = 0x84;
