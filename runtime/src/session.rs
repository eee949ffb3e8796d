use std::time::Duration;

use futures::{
    SinkExt,
    StreamExt,
};
use tokio::{
    io::{
        AsyncRead,
        AsyncWrite,
    },
    time::Instant,
};

use codec::{
    tokio_codec::Framed,
    Frame,
    FrameCodec,
};
use message::{
    build_time_query,
    ids,
    AckMessage,
    GpsTime,
    RebootCommand,
};

use crate::{
    Closed,
    CorrelatorError,
};

/// Which response an exchange is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expect {
    Message(u8),
    /// Message id plus the first body byte, for responses that share a message
    /// id with their request.
    SubMessage(u8, u8),
    AckOrNack,
}

impl Expect {
    #[inline]
    pub fn matches(&self, frame: &Frame) -> bool {
        match *self {
            Self::Message(id) => frame.message_id() == id,
            Self::SubMessage(id, sub_id) => frame.message_id() == id && frame.sub_id() == Some(sub_id),
            Self::AckOrNack => AckMessage::is_ack_or_nack(frame),
        }
    }
}

impl From<u8> for Expect {
    #[inline]
    fn from(id: u8) -> Self {
        Self::Message(id)
    }
}

/// Where the most recent exchange ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeState {
    Idle,
    Sent,
    Awaiting(Expect),
    Matched,
    TimedOut,
    Mismatched,
    Closed,
}

/// Request/response exchanges over an ordered byte stream.
///
/// Every exchange borrows the session mutably, so only one can be in flight.
/// Frames that do not answer the current exchange are dropped. Decoder state
/// outlives a timed-out or mismatched exchange, so a partially received frame
/// is completed by the next read.
pub struct Session<T> {
    framed: Framed<T, FrameCodec>,
    state:  ExchangeState,
}

impl<T> Session<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    #[inline]
    pub fn new(io: T) -> Self {
        Self::with_codec(io, FrameCodec::default())
    }

    pub fn with_codec(io: T, codec: FrameCodec) -> Self {
        Self {
            framed: Framed::new(io, codec),
            state:  ExchangeState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    #[inline]
    pub fn codec(&self) -> &FrameCodec {
        self.framed.codec()
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.framed.into_inner()
    }

    /// Write the whole frame, retrying short writes, and flush.
    #[tracing::instrument(skip_all, fields(request = %request), level = "debug", err(Display))]
    pub async fn send(&mut self, request: Frame) -> Result<(), CorrelatorError> {
        tracing::debug!(wire = %hex::encode(request.to_bytes()), "sending frame");

        if let Err(e) = self.framed.send(request).await {
            return Err(self.closed(Closed::Io(e)));
        }

        self.state = ExchangeState::Sent;
        Ok(())
    }

    /// Read until a frame matching `expect` arrives or `timeout` elapses.
    #[tracing::instrument(skip(self), level = "debug", err(Display))]
    pub async fn wait_for(&mut self, expect: Expect, timeout: Duration) -> Result<Frame, CorrelatorError> {
        self.next_matching(expect, timeout, |frame| expect.matches(frame)).await
    }

    pub async fn send_and_wait(
        &mut self,
        request: Frame,
        expect: impl Into<Expect>,
        timeout: Duration,
    ) -> Result<Frame, CorrelatorError> {
        self.send(request).await?;
        self.wait_for(expect.into(), timeout).await
    }

    /// Query the receiver's GPS time. The receiver acks the query before
    /// answering; that ack is skipped, a nack fails the exchange.
    #[tracing::instrument(skip(self), err(Display))]
    pub async fn query_time(&mut self, timeout: Duration) -> Result<GpsTime, CorrelatorError> {
        self.send(build_time_query()).await?;

        let expect = Expect::SubMessage(ids::GPS_TIME_GROUP, ids::GPS_TIME);
        let frame = self
            .next_matching(expect, timeout, |frame| expect.matches(frame) || is_query_nack(frame))
            .await?;

        if frame.message_id() == ids::NACK {
            return Err(CorrelatorError::Rejected(ids::GPS_TIME_GROUP));
        }

        let time = GpsTime::from_frame(&frame)?;
        tracing::debug!(time = %time.display_epoch(), "decoded gps time");

        Ok(time)
    }

    /// Send a restart command and wait for its ack or nack.
    #[tracing::instrument(skip(self), err(Display))]
    pub async fn reboot(&mut self, command: RebootCommand, timeout: Duration) -> Result<AckMessage, CorrelatorError> {
        tracing::info!("requesting receiver restart");

        self.send(command.to_frame()).await?;
        self.wait_for_ack(ids::SYSTEM_RESTART, timeout).await
    }

    /// Wait for an ack or nack of `command_id`. A reply naming another command
    /// is reported as [`CorrelatorError::Mismatched`]; calling again keeps
    /// waiting.
    pub async fn wait_for_ack(&mut self, command_id: u8, timeout: Duration) -> Result<AckMessage, CorrelatorError> {
        let frame = self.wait_for(Expect::AckOrNack, timeout).await?;
        let ack = AckMessage::from_frame(&frame)?;

        if !ack.acknowledges(command_id, None) {
            tracing::warn!(%ack, expected = command_id, "reply for a different command");
            self.state = ExchangeState::Mismatched;

            return Err(CorrelatorError::Mismatched {
                expected: command_id,
                ack,
            });
        }

        Ok(ack)
    }

    /// Drop incoming bytes until the line has been quiet for `quiet`, or until
    /// `limit` runs out. Any byte counts as activity, framed or not. Returns
    /// how many complete frames were dropped.
    #[tracing::instrument(skip(self), level = "debug", err(Display))]
    pub async fn settle(&mut self, quiet: Duration, limit: Duration) -> Result<usize, CorrelatorError> {
        let deadline = Instant::now() + limit;
        let mut quiet_until = Instant::now() + quiet;
        let mut seen = self.codec().received();
        let mut dropped = 0;

        loop {
            match tokio::time::timeout_at(quiet_until.min(deadline), self.framed.next()).await {
                Ok(Some(Ok(frame))) => {
                    tracing::trace!(%frame, "dropping frame while settling");
                    dropped += 1;
                },
                Ok(Some(Err(e))) => return Err(self.closed(Closed::Io(e))),
                Ok(None) => return Err(self.closed(Closed::EndOfStream)),
                Err(_elapsed) => {},
            }

            let now = Instant::now();
            let received = self.codec().received();

            if received != seen {
                seen = received;
                quiet_until = now + quiet;
            } else if now >= quiet_until {
                break;
            }

            if now >= deadline {
                tracing::debug!(?limit, "line still busy, giving up on settling");
                break;
            }
        }

        self.state = ExchangeState::Idle;
        Ok(dropped)
    }

    async fn next_matching(
        &mut self,
        expect: Expect,
        timeout: Duration,
        mut accept: impl FnMut(&Frame) -> bool,
    ) -> Result<Frame, CorrelatorError> {
        let deadline = Instant::now() + timeout;
        self.state = ExchangeState::Awaiting(expect);

        loop {
            let next = match tokio::time::timeout_at(deadline, self.framed.next()).await {
                Ok(next) => next,
                Err(_elapsed) => {
                    self.state = ExchangeState::TimedOut;
                    return Err(CorrelatorError::Timeout(timeout));
                },
            };

            let frame = match next {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(self.closed(Closed::Io(e))),
                None => return Err(self.closed(Closed::EndOfStream)),
            };

            if accept(&frame) {
                tracing::debug!(%frame, "matched response");
                self.state = ExchangeState::Matched;

                return Ok(frame);
            }

            tracing::debug!(%frame, "discarding unrelated frame");
        }
    }

    fn closed(&mut self, reason: Closed) -> CorrelatorError {
        tracing::error!(error = %reason, "transport closed");
        self.state = ExchangeState::Closed;

        CorrelatorError::TransportClosed(reason)
    }
}

#[inline]
fn is_query_nack(frame: &Frame) -> bool {
    frame.message_id() == ids::NACK
        && AckMessage::from_frame(frame).is_ok_and(|nack| nack.acknowledges(ids::GPS_TIME_GROUP, None))
}
