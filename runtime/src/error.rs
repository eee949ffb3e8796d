use std::time::Duration;

use message::{
    AckMessage,
    DecodeError,
};

#[derive(Debug, thiserror::Error)]
pub enum CorrelatorError {
    #[error("no matching response within {0:?}")]
    Timeout(Duration),

    #[error("transport closed")]
    TransportClosed(#[source] Closed),

    /// An ack or nack arrived for some other command. The session keeps its
    /// state; waiting again picks up where this left off.
    #[error("got {ack} while waiting on command {expected:#04x}")]
    Mismatched { expected: u8, ack: AckMessage },

    #[error("receiver rejected command {0:#04x}")]
    Rejected(u8),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, thiserror::Error)]
pub enum Closed {
    #[error("end of stream")]
    EndOfStream,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CorrelatorError {
    /// Whether the transport is gone and the session should be dropped.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TransportClosed(_))
    }
}

impl From<Closed> for CorrelatorError {
    #[inline]
    fn from(closed: Closed) -> Self {
        Self::TransportClosed(closed)
    }
}

impl From<std::io::Error> for CorrelatorError {
    #[inline]
    fn from(e: std::io::Error) -> Self {
        Self::TransportClosed(Closed::Io(e))
    }
}
