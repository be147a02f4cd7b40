//! Packet framing for the R30x/ZFM fingerprint sensor family.
//!
//! Every exchange is a command packet followed by one acknowledgement packet:
//!
//! ```text
//! +--------+-------------+-----+--------+-------------+----------+
//! | EF 01  | address (4) | pid | len(2) | payload (n) | sum (2)  |
//! +--------+-------------+-----+--------+-------------+----------+
//! ```
//!
//! `len` counts the payload plus the checksum. The checksum is the low 16
//! bits of the sum of the packet id, both length bytes and the payload.
//! All multi-byte fields are big-endian.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use doorlock_core::constants::FINGERPRINT_LIBRARY_CAPACITY;

use crate::{
    HardwareError, Result,
    types::{SensorCode, SensorCommand},
};

/// Start-of-packet marker.
pub const HEADER: [u8; 2] = [0xEF, 0x01];

/// Factory default module address.
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Factory default handshake password.
pub const DEFAULT_PASSWORD: u32 = 0;

/// Header, address, packet id and length.
const PREAMBLE_LEN: usize = 9;

const CHECKSUM_LEN: usize = 2;

/// Character buffer searched by the match flow.
const SEARCH_BUFFER: u8 = 0x01;

/// Character buffer holding the model to store.
const STORE_BUFFER: u8 = 0x01;

/// Packet identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Command,
    Data,
    Ack,
    EndData,
}

impl PacketKind {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Command => 0x01,
            Self::Data => 0x02,
            Self::Ack => 0x07,
            Self::EndData => 0x08,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Command),
            0x02 => Ok(Self::Data),
            0x07 => Ok(Self::Ack),
            0x08 => Ok(Self::EndData),
            other => Err(HardwareError::invalid_data(format!(
                "Unknown packet id 0x{:02X}",
                other
            ))),
        }
    }
}

/// A decoded or to-be-encoded sensor packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub address: u32,
    pub kind: PacketKind,
    pub payload: Bytes,
}

impl Packet {
    /// Build the command packet for `command`.
    pub fn command(address: u32, command: &SensorCommand) -> Self {
        let mut payload = BytesMut::with_capacity(6);
        payload.put_u8(command.instruction());
        match command {
            SensorCommand::VerifyPassword => payload.put_u32(DEFAULT_PASSWORD),
            SensorCommand::ImageToTemplate(slot) => payload.put_u8(slot.as_u8()),
            SensorCommand::StoreModel(id) => {
                payload.put_u8(STORE_BUFFER);
                payload.put_u16(id.as_u16());
            }
            SensorCommand::FastSearch => {
                payload.put_u8(SEARCH_BUFFER);
                payload.put_u16(0);
                payload.put_u16(FINGERPRINT_LIBRARY_CAPACITY);
            }
            SensorCommand::CaptureImage
            | SensorCommand::CreateModel
            | SensorCommand::EmptyLibrary => {}
        }

        Self {
            address,
            kind: PacketKind::Command,
            payload: payload.freeze(),
        }
    }

    /// Serialize the packet, including header and checksum.
    pub fn encode(&self) -> Bytes {
        let length = (self.payload.len() + CHECKSUM_LEN) as u16;
        let mut buf = BytesMut::with_capacity(PREAMBLE_LEN + length as usize);
        buf.put_slice(&HEADER);
        buf.put_u32(self.address);
        buf.put_u8(self.kind.as_u8());
        buf.put_u16(length);
        buf.put_slice(&self.payload);
        buf.put_u16(checksum(self.kind.as_u8(), length, &self.payload));
        buf.freeze()
    }

    /// Decode one packet from the front of `buf`.
    ///
    /// Returns `Ok(None)` and leaves `buf` untouched when more bytes are
    /// needed. On success the packet's bytes are consumed.
    ///
    /// # Errors
    ///
    /// Returns an invalid data error for a bad header, an impossible length
    /// or a checksum mismatch.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>> {
        if buf.len() < PREAMBLE_LEN {
            return Ok(None);
        }
        if buf[..2] != HEADER {
            return Err(HardwareError::invalid_data(format!(
                "Bad packet header {:02X} {:02X}",
                buf[0], buf[1]
            )));
        }

        let length = u16::from_be_bytes([buf[7], buf[8]]);
        if (length as usize) < CHECKSUM_LEN {
            return Err(HardwareError::invalid_data(format!(
                "Packet length {} too short",
                length
            )));
        }
        if buf.len() < PREAMBLE_LEN + length as usize {
            return Ok(None);
        }

        let mut frame = buf.split_to(PREAMBLE_LEN + length as usize);
        frame.advance(HEADER.len());
        let address = frame.get_u32();
        let pid = frame.get_u8();
        frame.advance(2);
        let payload = frame.split_to(length as usize - CHECKSUM_LEN).freeze();
        let received = frame.get_u16();

        let expected = checksum(pid, length, &payload);
        if received != expected {
            return Err(HardwareError::invalid_data(format!(
                "Checksum mismatch: expected 0x{:04X}, got 0x{:04X}",
                expected, received
            )));
        }

        Ok(Some(Self {
            address,
            kind: PacketKind::from_u8(pid)?,
            payload,
        }))
    }

    /// Interpret this packet as an acknowledgement.
    pub fn into_ack(self) -> Result<Ack> {
        if self.kind != PacketKind::Ack {
            return Err(HardwareError::invalid_data(format!(
                "Expected acknowledgement, got {:?} packet",
                self.kind
            )));
        }
        let mut payload = self.payload;
        if payload.is_empty() {
            return Err(HardwareError::invalid_data("Empty acknowledgement"));
        }
        let code = SensorCode::from_u8(payload.get_u8());
        Ok(Ack {
            code,
            data: payload,
        })
    }
}

/// Acknowledgement: confirmation code plus instruction-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub code: SensorCode,
    pub data: Bytes,
}

fn checksum(pid: u8, length: u16, payload: &[u8]) -> u16 {
    let [len_hi, len_lo] = length.to_be_bytes();
    payload
        .iter()
        .fold(pid as u16 + len_hi as u16 + len_lo as u16, |sum, b| {
            sum.wrapping_add(*b as u16)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TemplateSlot;
    use doorlock_core::FingerprintId;
    use rstest::rstest;

    #[rstest]
    #[case(
        SensorCommand::CaptureImage,
        &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]
    )]
    #[case(
        SensorCommand::VerifyPassword,
        &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x07, 0x13, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1B]
    )]
    #[case(
        SensorCommand::ImageToTemplate(TemplateSlot::Two),
        &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x04, 0x02, 0x02, 0x00, 0x09]
    )]
    #[case(
        SensorCommand::StoreModel(FingerprintId::new(1)),
        &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x06, 0x06, 0x01, 0x00, 0x01, 0x00, 0x0F]
    )]
    #[case(
        SensorCommand::FastSearch,
        &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x08, 0x1B, 0x01, 0x00, 0x00, 0x00, 0xA3, 0x00, 0xC8]
    )]
    #[case(
        SensorCommand::EmptyLibrary,
        &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x0D, 0x00, 0x11]
    )]
    fn test_encode_command(#[case] command: SensorCommand, #[case] expected: &[u8]) {
        let packet = Packet::command(DEFAULT_ADDRESS, &command);
        assert_eq!(packet.encode().as_ref(), expected);
    }

    #[test]
    fn test_decode_ok_ack() {
        let mut buf = BytesMut::from(
            &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x03, 0x00, 0x00, 0x0A][..],
        );
        let ack = Packet::decode(&mut buf).unwrap().unwrap().into_ack().unwrap();
        assert_eq!(ack.code, SensorCode::Ok);
        assert!(ack.data.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_search_ack_with_data() {
        let mut buf = BytesMut::from(
            &[
                0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x07, 0x00, 0x00, 0x01, 0x00, 0x64,
                0x00, 0x73,
            ][..],
        );
        let mut ack = Packet::decode(&mut buf).unwrap().unwrap().into_ack().unwrap();
        assert_eq!(ack.code, SensorCode::Ok);
        assert_eq!(ack.data.get_u16(), 1);
        assert_eq!(ack.data.get_u16(), 100);
    }

    #[test]
    fn test_decode_waits_for_complete_packet() {
        let full = [0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x03, 0x02, 0x00, 0x0C];
        let mut buf = BytesMut::from(&full[..7]);
        assert!(Packet::decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&full[7..11]);
        assert!(Packet::decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 11);

        buf.extend_from_slice(&full[11..]);
        let ack = Packet::decode(&mut buf).unwrap().unwrap().into_ack().unwrap();
        assert_eq!(ack.code, SensorCode::NoFinger);
    }

    #[test]
    fn test_decode_leaves_trailing_bytes() {
        let mut buf = BytesMut::from(
            &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x03, 0x00, 0x00, 0x0A, 0xEF][..],
        );
        Packet::decode(&mut buf).unwrap().unwrap();
        assert_eq!(buf.as_ref(), &[0xEF]);
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        let mut buf = BytesMut::from(
            &[0xEE, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x03, 0x00, 0x00, 0x0A][..],
        );
        assert!(matches!(
            Packet::decode(&mut buf),
            Err(HardwareError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let mut buf = BytesMut::from(
            &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x03, 0x00, 0x00, 0x0B][..],
        );
        let err = Packet::decode(&mut buf).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_command_packet_is_not_an_ack() {
        let packet = Packet::command(DEFAULT_ADDRESS, &SensorCommand::CaptureImage);
        let mut buf = BytesMut::from(packet.encode().as_ref());
        let decoded = Packet::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, packet);
        assert!(decoded.into_ack().is_err());
    }
}
