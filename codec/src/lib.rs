//! Framing for the receiver's binary protocol:
//!
//! ```text
//! A0 A1 | length (u16 BE) | message id, body... | XOR checksum | 0D 0A
//! ```
//!
//! `length` counts the message id and body; the checksum covers the same range.

pub use ::tokio_util::codec as tokio_codec;

pub mod checksum;
mod codec;
mod decoder;
mod error;
mod frame;

pub use self::{
    checksum::checksum,
    codec::FrameCodec,
    decoder::{
        FrameDecoder,
        State,
        DEFAULT_MAX_PAYLOAD,
    },
    error::{
        FramingError,
        InvalidFrame,
    },
    frame::{
        encode,
        Frame,
        FrameTooLarge,
        END,
        MAX_PAYLOAD,
        OVERHEAD,
        START,
    },
};
