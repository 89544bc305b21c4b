use crate::checksum::internet_checksum;
use crate::*;
use std::borrow::Cow;
use std::convert::{TryFrom, TryInto};
use std::net::Ipv4Addr;

/// Header length without options, the only shape this crate emits.
pub const IPV4_HEADER_LEN: usize = 20;

const MORE_FRAGMENTS: u8 = 0x20;
const DONT_FRAGMENT: u8 = 0x40;

#[derive(Clone, Debug)]
pub struct Ipv4Packet {
    pub data: PacketData,
    pub payload_offset: usize,
}

/// The header fields a sender chooses when emitting a datagram. Version, IHL, type of service,
/// total length and checksum are derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ipv4Header {
    pub src_addr: Ipv4Addr,
    pub dest_addr: Ipv4Addr,
    pub protocol: IpProtocol,
    pub identification: u16,
    pub more_fragments: bool,
    /// Offset of this fragment in 8 byte units
    pub fragment_offset: u16,
    pub ttl: u8,
}

impl Ipv4Packet {
    fn new(mut data: PacketData) -> Result<Ipv4Packet, &'static str> {
        // Header of IPv4 Frame: 20 bytes
        if data.len() < IPV4_HEADER_LEN {
            return Err("Data is too short to be an IPv4 Packet");
        }

        // This is the header length in 32bit words
        let ihl = (data[0] & 0x0F) as usize;
        let payload_offset = ihl * 4;
        if payload_offset < IPV4_HEADER_LEN {
            return Err("Packet has an IHL below the minimum header length");
        }
        if payload_offset > data.len() {
            return Err("Packet is shorter than its IHL field");
        }

        // TotalLen is the 3rd and 4th byte of the IP Header
        let total_len = u16::from_be_bytes(data[2..=3].try_into().unwrap()) as usize;
        if total_len < payload_offset || total_len > data.len() {
            return Err("Packet has invalid total length field");
        }
        // Anything past total length is link layer padding
        data.truncate(total_len);

        Ok(Ipv4Packet {
            data,
            payload_offset,
        })
    }

    /// Builds a datagram with a 20 byte header in front of `payload` and a valid checksum.
    pub fn encap(header: &Ipv4Header, payload: &[u8]) -> Ipv4Packet {
        let mut data = vec![0; IPV4_HEADER_LEN];
        data.reserve_exact(payload.len());
        data.extend_from_slice(payload);

        let mut packet = Ipv4Packet {
            data,
            payload_offset: IPV4_HEADER_LEN,
        };
        packet.set_version(4);
        packet.data[0] = (packet.data[0] & 0xF0) | (IPV4_HEADER_LEN / 4) as u8;
        packet.set_tos(0);
        packet.set_total_len((IPV4_HEADER_LEN + payload.len()) as u16);
        packet.set_identification(header.identification);
        packet.set_flags(false, header.more_fragments);
        packet.set_fragment_offset(header.fragment_offset);
        packet.set_ttl(header.ttl);
        packet.set_protocol(header.protocol);
        packet.set_src_addr(header.src_addr);
        packet.set_dest_addr(header.dest_addr);
        packet.set_checksum();
        packet
    }

    pub fn version(&self) -> u8 {
        (self.data[0] & 0xF0) >> 4
    }

    pub fn set_version(&mut self, version: u8) {
        self.data[0] = (self.data[0] & 0x0F) | (version << 4);
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        let data: [u8; 4] = self.data[12..16].try_into().unwrap();
        Ipv4Addr::from(data)
    }

    pub fn set_src_addr(&mut self, addr: Ipv4Addr) {
        self.data[12..16].copy_from_slice(&addr.octets());
    }

    pub fn dest_addr(&self) -> Ipv4Addr {
        let data: [u8; 4] = self.data[16..20].try_into().unwrap();
        Ipv4Addr::from(data)
    }

    pub fn set_dest_addr(&mut self, addr: Ipv4Addr) {
        self.data[16..20].copy_from_slice(&addr.octets());
    }

    /// Header length in 32 bit words
    pub fn ihl(&self) -> u8 {
        self.data[0] & 0x0F
    }

    /// Header length in bytes
    pub fn header_len(&self) -> usize {
        self.payload_offset
    }

    pub fn tos(&self) -> u8 {
        self.data[1]
    }

    pub fn set_tos(&mut self, tos: u8) {
        self.data[1] = tos;
    }

    pub fn total_len(&self) -> u16 {
        u16::from_be_bytes(self.data[2..=3].try_into().unwrap())
    }

    fn set_total_len(&mut self, total_len: u16) {
        self.data[2..=3].copy_from_slice(&total_len.to_be_bytes());
    }

    pub fn identification(&self) -> u16 {
        u16::from_be_bytes(self.data[4..=5].try_into().unwrap())
    }

    pub fn set_identification(&mut self, id: u16) {
        self.data[4..=5].copy_from_slice(&id.to_be_bytes());
    }

    /// Returns tuple of (Don't Fragment, More Fragments)
    pub fn flags(&self) -> (bool, bool) {
        let df = (self.data[6] & DONT_FRAGMENT) != 0;
        let mf = (self.data[6] & MORE_FRAGMENTS) != 0;
        (df, mf)
    }

    pub fn set_flags(&mut self, dont_fragment: bool, more_fragments: bool) {
        self.data[6] &= 0x1F;
        if dont_fragment {
            self.data[6] |= DONT_FRAGMENT;
        }
        if more_fragments {
            self.data[6] |= MORE_FRAGMENTS;
        }
    }

    pub fn more_fragments(&self) -> bool {
        self.flags().1
    }

    /// Fragment offset in 8 byte units
    pub fn fragment_offset(&self) -> u16 {
        u16::from_be_bytes([self.data[6] & 0x1F, self.data[7]])
    }

    pub fn set_fragment_offset(&mut self, offset: u16) {
        let [high, low] = (offset & 0x1FFF).to_be_bytes();
        self.data[6] = (self.data[6] & 0xE0) | high;
        self.data[7] = low;
    }

    pub fn ttl(&self) -> u8 {
        self.data[8]
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.data[8] = ttl;
    }

    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[9])
    }

    pub fn set_protocol(&mut self, protocol: IpProtocol) {
        self.data[9] = protocol.into();
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(self.data[10..=11].try_into().unwrap())
    }

    /// Calculates what the checksum should be set to given the current header
    pub fn calculate_checksum(&self) -> u16 {
        let mut header = self.header().to_vec();
        header[10] = 0;
        header[11] = 0;
        internet_checksum(&header)
    }

    /// Recomputes the checksum with the field zeroed and compares it to the stored value.
    pub fn validate_checksum(&self) -> bool {
        self.calculate_checksum() == self.checksum()
    }

    /// Sets checksum field to valid value
    pub fn set_checksum(&mut self) {
        let new_checksum = self.calculate_checksum();
        self.data[10..=11].copy_from_slice(&new_checksum.to_be_bytes());
    }

    pub fn header(&self) -> &[u8] {
        &self.data[..self.payload_offset]
    }

    pub fn options(&self) -> Option<Cow<[u8]>> {
        if self.ihl() <= 5 {
            return None;
        }
        Some(Cow::from(&self.data[IPV4_HEADER_LEN..self.payload_offset]))
    }

    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.payload_offset..])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> PacketData {
        self.data
    }

    /// Strips the header and hands back the payload
    pub fn into_payload(mut self) -> PacketData {
        self.data.drain(..self.payload_offset);
        self.data
    }
}

/// Ipv4Packets are considered the same if they carry the same bytes.
impl PartialEq for Ipv4Packet {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Ipv4Packet {}

impl TryFrom<PacketData> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(data: PacketData) -> Result<Self, Self::Error> {
        Ipv4Packet::new(data)
    }
}

impl TryFrom<EthernetFrame> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(frame: EthernetFrame) -> Result<Self, Self::Error> {
        if frame.ether_type() != EtherType::Ipv4 {
            return Err("Frame does not have IPv4 ether type");
        }
        Ipv4Packet::new(frame.into_payload())
    }
}
