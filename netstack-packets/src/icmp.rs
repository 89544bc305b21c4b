use crate::checksum::internet_checksum;
use crate::PacketData;
use std::cmp;
use std::convert::{TryFrom, TryInto};

/// The size of an ICMP "header", which precedes the data field
pub const ICMP_HEADER_LEN: usize = 8;

/// How much of an offending datagram an error message quotes: its 20 byte header plus the first
/// 8 bytes of its payload.
pub const ICMP_ERROR_QUOTE_LEN: usize = 28;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IcmpType {
    EchoReply,
    DestinationUnreachable,
    EchoRequest,
    Other(u8),
}

impl From<u8> for IcmpType {
    fn from(value: u8) -> Self {
        match value {
            0 => IcmpType::EchoReply,
            3 => IcmpType::DestinationUnreachable,
            8 => IcmpType::EchoRequest,
            other => IcmpType::Other(other),
        }
    }
}

impl From<IcmpType> for u8 {
    fn from(icmp_type: IcmpType) -> Self {
        match icmp_type {
            IcmpType::EchoReply => 0,
            IcmpType::DestinationUnreachable => 3,
            IcmpType::EchoRequest => 8,
            IcmpType::Other(other) => other,
        }
    }
}

/// Codes carried by a Destination Unreachable message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnreachableCode {
    Network = 0,
    Host = 1,
    Protocol = 2,
    Port = 3,
}

/// An ICMP message: 8 byte header followed by a variable length data field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IcmpMessage {
    data: PacketData,
}

impl IcmpMessage {
    /// A message of the given type with zeroed identifier, sequence and checksum.
    pub fn new(icmp_type: IcmpType, code: u8, body: &[u8]) -> IcmpMessage {
        let mut data = vec![0; ICMP_HEADER_LEN];
        data.reserve_exact(body.len());
        data.extend_from_slice(body);
        let mut message = IcmpMessage { data };
        message.set_icmp_type(icmp_type);
        message.set_code(code);
        message
    }

    /// Answers an echo request: the whole request (identifier, sequence and data) is copied, the
    /// type becomes Echo Reply, the code 0, and the checksum is recomputed over the full message.
    pub fn echo_reply_from(request: &IcmpMessage) -> IcmpMessage {
        let mut reply = request.clone();
        reply.set_icmp_type(IcmpType::EchoReply);
        reply.set_code(0);
        reply.set_checksum();
        reply
    }

    /// Builds a Destination Unreachable message quoting the first 28 bytes of `original`, or all
    /// of it when it is shorter.
    pub fn destination_unreachable(code: UnreachableCode, original: &[u8]) -> IcmpMessage {
        let quoted = &original[..cmp::min(original.len(), ICMP_ERROR_QUOTE_LEN)];
        let mut message = IcmpMessage::new(IcmpType::DestinationUnreachable, code as u8, quoted);
        message.set_checksum();
        message
    }

    pub fn icmp_type(&self) -> IcmpType {
        IcmpType::from(self.data[0])
    }

    pub fn set_icmp_type(&mut self, icmp_type: IcmpType) {
        self.data[0] = icmp_type.into();
    }

    pub fn code(&self) -> u8 {
        self.data[1]
    }

    pub fn set_code(&mut self, code: u8) {
        self.data[1] = code;
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(self.data[2..=3].try_into().unwrap())
    }

    pub fn identifier(&self) -> u16 {
        u16::from_be_bytes(self.data[4..=5].try_into().unwrap())
    }

    pub fn set_identifier(&mut self, identifier: u16) {
        self.data[4..=5].copy_from_slice(&identifier.to_be_bytes());
    }

    pub fn sequence(&self) -> u16 {
        u16::from_be_bytes(self.data[6..=7].try_into().unwrap())
    }

    pub fn set_sequence(&mut self, sequence: u16) {
        self.data[6..=7].copy_from_slice(&sequence.to_be_bytes());
    }

    /// Everything after the 8 byte header
    pub fn body(&self) -> &[u8] {
        &self.data[ICMP_HEADER_LEN..]
    }

    /// Checksum over the whole message with the checksum field zeroed
    pub fn calculate_checksum(&self) -> u16 {
        let mut data = self.data.clone();
        data[2] = 0;
        data[3] = 0;
        internet_checksum(&data)
    }

    pub fn set_checksum(&mut self) {
        self.data[2..=3].copy_from_slice(&[0, 0]);
        let checksum = internet_checksum(&self.data);
        self.data[2..=3].copy_from_slice(&checksum.to_be_bytes());
    }

    pub fn validate_checksum(&self) -> bool {
        self.calculate_checksum() == self.checksum()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> PacketData {
        self.data
    }
}

impl TryFrom<PacketData> for IcmpMessage {
    type Error = &'static str;

    fn try_from(data: PacketData) -> Result<Self, Self::Error> {
        if data.len() < ICMP_HEADER_LEN {
            return Err("ICMP message is shorter than its 8 byte header");
        }
        Ok(IcmpMessage { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;

    fn echo_request(body: &[u8]) -> IcmpMessage {
        let mut request = IcmpMessage::new(IcmpType::EchoRequest, 0, body);
        request.set_identifier(0x0102);
        request.set_sequence(7);
        request.set_checksum();
        request
    }

    #[test]
    fn parse_header_fields() {
        let bytes = vec![8, 0, 0xf7, 0xfd, 0x00, 0x01, 0x00, 0x01];
        let message = IcmpMessage::try_from(bytes).unwrap();
        assert_eq!(message.icmp_type(), IcmpType::EchoRequest);
        assert_eq!(message.code(), 0);
        assert_eq!(message.identifier(), 1);
        assert_eq!(message.sequence(), 1);
        assert!(message.body().is_empty());
        assert!(message.validate_checksum());
    }

    #[test]
    fn too_short() {
        assert!(IcmpMessage::try_from(vec![8, 0, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn echo_reply_copies_everything_but_type() {
        let body: Vec<u8> = (0..32).collect();
        let request = echo_request(&body);
        let reply = IcmpMessage::echo_reply_from(&request);

        assert_eq!(reply.icmp_type(), IcmpType::EchoReply);
        assert_eq!(reply.code(), 0);
        assert_eq!(reply.identifier(), 0x0102);
        assert_eq!(reply.sequence(), 7);
        assert_eq!(reply.body(), &body[..]);
        assert!(reply.validate_checksum());
        assert!(checksum::verify(reply.as_bytes()));
    }

    #[test]
    fn odd_length_echo_checksums() {
        let request = echo_request(&[1, 2, 3]);
        assert!(request.validate_checksum());
        assert!(IcmpMessage::echo_reply_from(&request).validate_checksum());
    }

    #[test]
    fn unreachable_quotes_28_bytes() {
        let original: Vec<u8> = (0..60).collect();
        let message = IcmpMessage::destination_unreachable(UnreachableCode::Protocol, &original);
        assert_eq!(message.icmp_type(), IcmpType::DestinationUnreachable);
        assert_eq!(message.code(), 2);
        assert_eq!(message.identifier(), 0);
        assert_eq!(message.sequence(), 0);
        assert_eq!(message.body(), &original[..28]);
        assert!(message.validate_checksum());
    }

    #[test]
    fn unreachable_quotes_short_datagrams_whole() {
        let original = vec![0x45; 22];
        let message = IcmpMessage::destination_unreachable(UnreachableCode::Port, &original);
        assert_eq!(message.code(), 3);
        assert_eq!(message.body(), &original[..]);
    }
}
