use bytes::BytesMut;
use tokio_util::codec::{
    Decoder,
    Encoder,
};

use crate::{
    Frame,
    FrameDecoder,
    FramingError,
};

/// Stream codec over [`FrameDecoder`]. Invalid frames are absorbed by
/// resynchronizing, so the decoder side only ever yields valid frames.
///
/// The default codec rejects payloads above [`DEFAULT_MAX_PAYLOAD`](crate::DEFAULT_MAX_PAYLOAD); use
/// [`FrameCodec::new`] with [`MAX_PAYLOAD`](crate::MAX_PAYLOAD) to accept
/// everything the length field can describe.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    decoder:   FrameDecoder,
    discarded: u64,
    received:  u64,
    /// Unconsumed bytes left in the read buffer by the previous call.
    leftover:  usize,
}

impl FrameCodec {
    pub fn new(max_payload: usize) -> Self {
        Self {
            decoder:   FrameDecoder::new(max_payload),
            discarded: 0,
            received:  0,
            leftover:  0,
        }
    }

    /// Number of candidate frames rejected since construction.
    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Bytes taken in from the transport since construction, frame or not.
    #[inline]
    pub fn received(&self) -> u64 {
        self.received
    }

    #[inline]
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    fn decode_frame(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, std::io::Error> {
        loop {
            return match self.decoder.decode(src) {
                Ok(frame) => {
                    tracing::trace!(%frame, "decoded frame");
                    Ok(Some(frame))
                },
                Err(FramingError::Incomplete) => Ok(None),
                Err(FramingError::Invalid(reason)) => {
                    self.discarded += 1;
                    tracing::warn!(%reason, "discarding invalid frame, resynchronizing");
                    continue;
                },
            };
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode_to(dst);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Error = std::io::Error;
    type Item = Frame;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.received += src.len().saturating_sub(self.leftover) as u64;

        let result = self.decode_frame(src);
        self.leftover = src.len();

        result
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let result @ Some(_) = self.decode(buf)? {
            return Ok(result);
        }

        if self.decoder.buffered() > 0 {
            tracing::debug!(
                state = ?self.decoder.state(),
                buffered = self.decoder.buffered(),
                "dropping partial frame at end of stream"
            );
            self.decoder.reset();
        }

        Ok(None)
    }
}

#[cfg(test)]
mod test {
    use futures::prelude::*;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::encode;

    async fn assert_decode(src: impl AsRef<[u8]>, expect: impl IntoIterator<Item = Frame>) -> eyre::Result<()> {
        let src = src.as_ref().to_vec();

        let results = FramedRead::new(&src[..], FrameCodec::default())
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(results, expect.into_iter().collect::<Vec<_>>());

        Ok(())
    }

    #[tokio::test]
    async fn test_sequential() -> eyre::Result<()> {
        let mut src = encode(0x83, [0x64, 0x20]).to_vec();
        src.extend_from_slice(&encode(0x64, [0x8e, 0, 1, 2]));

        assert_decode(src, vec![Frame::new(0x83, [0x64, 0x20]), Frame::new(0x64, [0x8e, 0, 1, 2])]).await
    }

    #[tokio::test]
    async fn test_absorbs_corruption() -> eyre::Result<()> {
        let mut src = b"garbage".to_vec();

        let mut corrupt = encode(0x84, [0x01]).to_vec();
        corrupt[5] ^= 0x10;
        src.extend_from_slice(&corrupt);
        src.extend_from_slice(&encode(0x83, [0x01]));

        assert_decode(src, vec![Frame::new(0x83, [0x01])]).await
    }

    #[tokio::test]
    async fn test_partial_at_eof() -> eyre::Result<()> {
        let mut src = encode(0x83, [0x01]).to_vec();
        src.extend_from_slice(&encode(0x84, [0x01])[..5]);

        assert_decode(src, vec![Frame::new(0x83, [0x01])]).await
    }

    #[test]
    fn test_counts_discarded() -> eyre::Result<()> {
        let mut codec = FrameCodec::default();

        let mut corrupt = encode(0x84, [0x01]).to_vec();
        corrupt[6] ^= 0x01;

        let mut src = BytesMut::from(&corrupt[..]);
        assert_eq!(codec.decode(&mut src)?, None);
        assert_eq!(codec.discarded(), 1);

        Ok(())
    }

    #[test]
    fn test_counts_received() -> eyre::Result<()> {
        let mut codec = FrameCodec::default();

        let mut src = BytesMut::from(&b"$GPGGA\r\n"[..]);
        assert_eq!(codec.decode(&mut src)?, None);
        assert_eq!(codec.received(), 8);

        src.extend_from_slice(&encode(0x83, [0x01]));
        src.extend_from_slice(&encode(0x84, [0x01]));
        assert_eq!(codec.decode(&mut src)?, Some(Frame::new(0x83, [0x01])));
        assert_eq!(codec.received(), 26);

        // the second frame was already counted
        assert_eq!(codec.decode(&mut src)?, Some(Frame::new(0x84, [0x01])));
        assert_eq!(codec.received(), 26);

        Ok(())
    }

    #[test]
    fn test_encode() -> eyre::Result<()> {
        let mut dst = BytesMut::new();
        FrameCodec::default().encode(Frame::new(0x64, [0x20]), &mut dst)?;

        assert_eq!(dst.as_ref(), &[0xa0, 0xa1, 0x00, 0x02, 0x64, 0x20, 0x44, 0x0d, 0x0a]);

        Ok(())
    }
}
