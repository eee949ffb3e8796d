use std::fmt::{
    Display,
    Formatter,
};

use bytes::{
    BufMut,
    Bytes,
    BytesMut,
};

use crate::checksum;

pub const START: [u8; 2] = [0xa0, 0xa1];
pub const END: [u8; 2] = [0x0d, 0x0a];

/// Bytes a frame adds around its payload: start marker, length, checksum, end marker.
pub const OVERHEAD: usize = START.len() + 2 + 1 + END.len();

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("payload of {0} bytes does not fit a frame")]
pub struct FrameTooLarge(pub usize);

/// One protocol unit. The payload always starts with the message id, so it is
/// never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    /// Build a frame from a message id and the bytes that follow it.
    ///
    /// # Panics
    ///
    /// If `1 + body.len()` exceeds [`MAX_PAYLOAD`]. Use [`Frame::try_new`] for
    /// bodies of unchecked size.
    #[inline]
    pub fn new(message_id: u8, body: impl AsRef<[u8]>) -> Self {
        match Self::try_new(message_id, body) {
            Ok(frame) => frame,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(message_id: u8, body: impl AsRef<[u8]>) -> Result<Self, FrameTooLarge> {
        let body = body.as_ref();

        if body.len() + 1 > MAX_PAYLOAD {
            return Err(FrameTooLarge(body.len() + 1));
        }

        let mut payload = BytesMut::with_capacity(body.len() + 1);
        payload.put_u8(message_id);
        payload.put_slice(body);

        Ok(Self {
            payload: payload.freeze(),
        })
    }

    /// Caller guarantees a payload of 1..=MAX_PAYLOAD bytes.
    #[inline]
    pub(crate) fn from_payload(payload: Bytes) -> Self {
        debug_assert!(!payload.is_empty() && payload.len() <= MAX_PAYLOAD);

        Self {
            payload,
        }
    }

    #[inline]
    pub fn message_id(&self) -> u8 {
        self.payload[0]
    }

    /// First body byte, which sub-id commands and responses use as their sub-id.
    #[inline]
    pub fn sub_id(&self) -> Option<u8> {
        self.payload.get(1).copied()
    }

    /// Payload bytes after the message id.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.payload[1..]
    }

    /// Message id followed by the body.
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    #[inline]
    pub fn declared_length(&self) -> u16 {
        self.payload.len() as u16
    }

    #[inline]
    pub fn checksum(&self) -> u8 {
        checksum::checksum(&self.payload)
    }

    #[inline]
    pub fn wire_len(&self) -> usize {
        OVERHEAD + self.payload.len()
    }

    pub fn encode_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_len());

        dst.put_slice(&START);
        dst.put_u16(self.declared_length());
        dst.put_slice(&self.payload);
        dst.put_u8(self.checksum());
        dst.put_slice(&END);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.wire_len());
        self.encode_to(&mut out);

        out.freeze()
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:#04x}] {}", self.message_id(), hex::encode(self.body()))
    }
}

/// Encode `message_id` and `body` into a complete wire frame.
#[inline]
pub fn encode(message_id: u8, body: impl AsRef<[u8]>) -> Bytes {
    Frame::new(message_id, body).to_bytes()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn time_query_layout() {
        assert_eq!(encode(0x64, [0x20]).as_ref(), &[
            0xa0, 0xa1, 0x00, 0x02, 0x64, 0x20, 0x44, 0x0d, 0x0a
        ]);
    }

    #[test]
    fn ack_layout() {
        assert_eq!(encode(0x83, [0x01]).as_ref(), &[
            0xa0, 0xa1, 0x00, 0x02, 0x83, 0x01, 0x82, 0x0d, 0x0a
        ]);
    }

    #[test]
    fn accessors() {
        let frame = Frame::new(0x64, [0x8e, 1, 2, 3]);

        assert_eq!(frame.message_id(), 0x64);
        assert_eq!(frame.sub_id(), Some(0x8e));
        assert_eq!(frame.body(), &[0x8e, 1, 2, 3]);
        assert_eq!(frame.declared_length(), 5);
        assert_eq!(frame.wire_len(), 12);
        assert_eq!(frame.to_string(), "[0x64] 8e010203");

        assert_eq!(Frame::new(0x01, [0u8; 0]).sub_id(), None);
    }

    #[test]
    fn oversized_body() {
        let body = vec![0; MAX_PAYLOAD];
        assert_eq!(Frame::try_new(0x01, &body), Err(FrameTooLarge(MAX_PAYLOAD + 1)));
        assert!(Frame::try_new(0x01, &body[1..]).is_ok());
    }
}
