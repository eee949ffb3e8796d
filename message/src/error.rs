#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload truncated: need {need} bytes, got {got}")]
    TruncatedPayload { need: usize, got: usize },

    #[error("unexpected message {id:#04x} (sub-id: {sub_id:?})")]
    UnexpectedMessage { id: u8, sub_id: Option<u8> },

    #[error(transparent)]
    Packing(#[from] packed_struct::PackingError),
}
