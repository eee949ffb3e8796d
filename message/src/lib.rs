mod ack;
mod command;
mod error;
pub mod ids;
mod time;

pub use ack::{
    AckMessage,
    AckStatus,
};
pub use command::{
    build_reboot,
    build_time_query,
    RebootCommand,
    RestartMode,
};
pub use error::DecodeError;
pub use time::{
    EpochDisplay,
    GpsTime,
    GPS_EPOCH_OFFSET,
    SECONDS_PER_WEEK,
};
