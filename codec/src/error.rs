/// Outcome of a decode step that did not produce a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    /// The input ran out mid-frame. Not a failure: feed more bytes and call
    /// again.
    #[error("incomplete frame")]
    Incomplete,

    /// The candidate frame was rejected and the decoder resynchronized.
    #[error(transparent)]
    Invalid(#[from] InvalidFrame),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidFrame {
    #[error("checksum mismatch (computed: {computed:#04x}, received: {received:#04x})")]
    Checksum { computed: u8, received: u8 },

    #[error("bad end marker byte {received:#04x} at offset {offset}")]
    EndMarker { offset: usize, received: u8 },

    #[error("declared length {declared} outside 1..={max}")]
    Length { declared: u16, max: usize },
}
