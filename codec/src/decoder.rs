use bytes::{
    Buf,
    Bytes,
    BytesMut,
};

use crate::{
    checksum,
    frame::{
        END,
        START,
    },
    Frame,
    FramingError,
    InvalidFrame,
};

/// Ceiling on declared payload length used by [`FrameDecoder::default`]. The
/// receiver's own messages are far smaller; a larger declared length means the
/// length field is corrupt. [`FrameDecoder::new`] with
/// [`MAX_PAYLOAD`](crate::MAX_PAYLOAD) lifts the ceiling to the full 16-bit
/// range.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024;

const HEADER_LEN: usize = START.len() + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    SeekStart1,
    SeekStart2,
    ReadLength,
    ReadPayload,
    ReadChecksum,
    ReadEnd1,
    ReadEnd2,
}

/// Resumable frame decoder.
///
/// Bytes are moved out of the caller's buffer as each state consumes them, and
/// never more than the current state still needs, so a buffer holding several
/// frames is left positioned at the start of the next one. Partial progress
/// survives across calls.
///
/// Every byte consumed since the current start-marker candidate is retained.
/// When the candidate turns out to be invalid, those bytes minus the first are
/// pushed back in front of the caller's buffer and scanning restarts there.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state:       State,
    max_payload: usize,
    declared:    usize,
    candidate:   BytesMut,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD)
    }
}

impl FrameDecoder {
    pub fn new(max_payload: usize) -> Self {
        Self {
            state: State::SeekStart1,
            max_payload,
            declared: 0,
            candidate: BytesMut::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Bytes held for the frame currently being assembled.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.candidate.len()
    }

    /// Drop any partial frame and return to scanning for a start marker.
    pub fn reset(&mut self) {
        self.state = State::SeekStart1;
        self.declared = 0;
        self.candidate.clear();
    }

    pub fn decode(&mut self, src: &mut BytesMut) -> Result<Frame, FramingError> {
        loop {
            match self.state {
                State::SeekStart1 => {
                    let Some(pos) = src.iter().position(|&b| b == START[0]) else {
                        src.clear();
                        return Err(FramingError::Incomplete);
                    };

                    src.advance(pos);
                    self.take(src, 1);
                    self.state = State::SeekStart2;
                },

                State::SeekStart2 => match src.first() {
                    None => return Err(FramingError::Incomplete),
                    Some(&b) if b == START[1] => {
                        self.take(src, 1);
                        self.state = State::ReadLength;
                    },
                    // not consumed: it may itself be a start candidate
                    Some(_) => self.reset(),
                },

                State::ReadLength => {
                    if !self.fill(src, HEADER_LEN) {
                        return Err(FramingError::Incomplete);
                    }

                    let declared = u16::from_be_bytes([self.candidate[2], self.candidate[3]]);
                    if declared == 0 || declared as usize > self.max_payload {
                        return Err(self.resync(src, InvalidFrame::Length {
                            declared,
                            max: self.max_payload,
                        }));
                    }

                    self.declared = declared as usize;
                    self.state = State::ReadPayload;
                },

                State::ReadPayload => {
                    if !self.fill(src, HEADER_LEN + self.declared) {
                        return Err(FramingError::Incomplete);
                    }

                    self.state = State::ReadChecksum;
                },

                State::ReadChecksum => {
                    if !self.fill(src, HEADER_LEN + self.declared + 1) {
                        return Err(FramingError::Incomplete);
                    }

                    let payload_end = HEADER_LEN + self.declared;
                    let computed = checksum::checksum(&self.candidate[HEADER_LEN..payload_end]);
                    let received = self.candidate[payload_end];

                    if computed != received {
                        return Err(self.resync(src, InvalidFrame::Checksum {
                            computed,
                            received,
                        }));
                    }

                    self.state = State::ReadEnd1;
                },

                State::ReadEnd1 => {
                    self.check_end_marker(src, 0)?;
                    self.state = State::ReadEnd2;
                },

                State::ReadEnd2 => {
                    self.check_end_marker(src, 1)?;
                    return Ok(self.complete());
                },
            }
        }
    }

    fn check_end_marker(&mut self, src: &mut BytesMut, idx: usize) -> Result<(), FramingError> {
        let offset = HEADER_LEN + self.declared + 1 + idx;

        if !self.fill(src, offset + 1) {
            return Err(FramingError::Incomplete);
        }

        let received = self.candidate[offset];
        if received != END[idx] {
            return Err(self.resync(src, InvalidFrame::EndMarker {
                offset,
                received,
            }));
        }

        Ok(())
    }

    /// Move up to `target - buffered` bytes into the candidate. True once the
    /// candidate holds `target` bytes.
    #[inline]
    fn fill(&mut self, src: &mut BytesMut, target: usize) -> bool {
        let want = target.saturating_sub(self.candidate.len());
        self.take(src, want.min(src.len()));

        self.candidate.len() >= target
    }

    #[inline]
    fn take(&mut self, src: &mut BytesMut, n: usize) {
        self.candidate.unsplit(src.split_to(n));
    }

    fn complete(&mut self) -> Frame {
        let mut raw = std::mem::take(&mut self.candidate);
        raw.advance(HEADER_LEN);
        raw.truncate(self.declared);

        let payload: Bytes = raw.freeze();
        self.reset();

        Frame::from_payload(payload)
    }

    fn resync(&mut self, src: &mut BytesMut, reason: InvalidFrame) -> FramingError {
        let mut rewind = self.candidate.split_off(1);
        rewind.unsplit(src.split());
        *src = rewind;

        self.reset();

        FramingError::Invalid(reason)
    }
}
