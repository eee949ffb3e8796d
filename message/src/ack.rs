use std::fmt::{
    Display,
    Formatter,
};

use codec::Frame;

use crate::{
    ids,
    DecodeError,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AckStatus {
    Ack,
    Nack,
}

/// Receiver's reply to a command: which command, and whether it was accepted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AckMessage {
    pub acked_command_id: u8,
    /// Present when the acknowledged command carries a sub-id.
    pub acked_sub_id:     Option<u8>,
    pub status:           AckStatus,
}

impl AckMessage {
    /// An ack or nack that names the command it answers.
    #[inline]
    pub fn is_ack_or_nack(frame: &Frame) -> bool {
        matches!(frame.message_id(), ids::ACK | ids::NACK) && frame.sub_id().is_some()
    }

    pub fn from_frame(frame: &Frame) -> Result<Self, DecodeError> {
        let status = match frame.message_id() {
            ids::ACK => AckStatus::Ack,
            ids::NACK => AckStatus::Nack,
            id => {
                return Err(DecodeError::UnexpectedMessage {
                    id,
                    sub_id: frame.sub_id(),
                })
            },
        };

        let Some(&acked_command_id) = frame.body().first() else {
            return Err(DecodeError::TruncatedPayload {
                need: 2,
                got:  frame.payload().len(),
            });
        };

        Ok(Self {
            acked_command_id,
            acked_sub_id: frame.body().get(1).copied(),
            status,
        })
    }

    /// Whether this reply refers to `command_id`, and to `sub_id` when one is
    /// given.
    #[inline]
    pub fn acknowledges(&self, command_id: u8, sub_id: Option<u8>) -> bool {
        self.acked_command_id == command_id && (sub_id.is_none() || self.acked_sub_id == sub_id)
    }

    #[inline]
    pub fn is_ack(&self) -> bool {
        self.status == AckStatus::Ack
    }

    pub fn to_frame(&self) -> Frame {
        let id = match self.status {
            AckStatus::Ack => ids::ACK,
            AckStatus::Nack => ids::NACK,
        };

        match self.acked_sub_id {
            Some(sub_id) => Frame::new(id, [self.acked_command_id, sub_id]),
            None => Frame::new(id, [self.acked_command_id]),
        }
    }
}

impl Display for AckMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let status = match self.status {
            AckStatus::Ack => "ack",
            AckStatus::Nack => "nack",
        };

        match self.acked_sub_id {
            Some(sub_id) => write!(f, "{status} {:#04x}/{sub_id:#04x}", self.acked_command_id),
            None => write!(f, "{status} {:#04x}", self.acked_command_id),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reboot_ack() {
        let frame = Frame::new(ids::ACK, [ids::SYSTEM_RESTART]);
        assert_eq!(frame.to_bytes().as_ref(), &[0xa0, 0xa1, 0x00, 0x02, 0x83, 0x01, 0x82, 0x0d, 0x0a]);

        let ack = AckMessage::from_frame(&frame).unwrap();
        assert_eq!(ack, AckMessage {
            acked_command_id: ids::SYSTEM_RESTART,
            acked_sub_id:     None,
            status:           AckStatus::Ack,
        });
        assert!(ack.is_ack());
        assert!(ack.acknowledges(ids::SYSTEM_RESTART, None));
        assert_eq!(ack.to_frame(), frame);
        assert_eq!(ack.to_string(), "ack 0x01");
    }

    #[test]
    fn query_nack_with_sub_id() {
        let frame = Frame::new(ids::NACK, [ids::GPS_TIME_GROUP, ids::QUERY_GPS_TIME]);
        let nack = AckMessage::from_frame(&frame).unwrap();

        assert_eq!(nack.status, AckStatus::Nack);
        assert!(nack.acknowledges(ids::GPS_TIME_GROUP, Some(ids::QUERY_GPS_TIME)));
        assert!(nack.acknowledges(ids::GPS_TIME_GROUP, None));
        assert!(!nack.acknowledges(ids::GPS_TIME_GROUP, Some(0x21)));
        assert!(!nack.acknowledges(ids::SYSTEM_RESTART, None));
        assert_eq!(nack.to_string(), "nack 0x64/0x20");
    }

    #[test]
    fn rejects_other_frames() {
        let frame = Frame::new(ids::GPS_TIME_GROUP, [ids::GPS_TIME]);

        assert!(!AckMessage::is_ack_or_nack(&frame));
        assert_eq!(
            AckMessage::from_frame(&frame),
            Err(DecodeError::UnexpectedMessage {
                id:     ids::GPS_TIME_GROUP,
                sub_id: Some(ids::GPS_TIME),
            })
        );
    }

    #[test]
    fn empty_ack() {
        assert!(!AckMessage::is_ack_or_nack(&Frame::new(ids::ACK, [0u8; 0])));
        assert_eq!(
            AckMessage::from_frame(&Frame::new(ids::ACK, [0u8; 0])),
            Err(DecodeError::TruncatedPayload {
                need: 2,
                got:  1,
            })
        );
    }
}
