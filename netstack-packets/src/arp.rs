use crate::{MacAddr, PacketData, IPV4_ETHER_TYPE};
use std::convert::{TryFrom, TryInto};
use std::net::Ipv4Addr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArpOp {
    Request = 1,
    Reply = 2,
}

impl TryFrom<u16> for ArpOp {
    type Error = &'static str;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ArpOp::Request),
            2 => Ok(ArpOp::Reply),
            _ => Err("Unknown ARP opcode"),
        }
    }
}

pub enum ArpHardwareType {
    Ethernet = 1,
}

/// Size of an ARP message resolving IPv4 over Ethernet.
pub const ARP_ETHERNET_IPV4_LEN: usize = 28;

const HARDWARE_TYPE_RANGE: (usize, usize) = (0, 2);
const PROTOCOL_TYPE_RANGE: (usize, usize) = (2, 4);
const HARDWARE_ADDR_LEN_RANGE: (usize, usize) = (4, 5);
const PROTOCOL_ADDR_LEN_RANGE: (usize, usize) = (5, 6);
const OPCODE_RANGE: (usize, usize) = (6, 8);

///
/// Getters/setters over the ARP message structure described in RFC 826
/// https://tools.ietf.org/html/rfc826
///
/// The buffer starts at the ARP header, the Ethernet envelope has already been stripped.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArpPacket {
    data: PacketData,
}

impl ArpPacket {
    ///
    /// Constructs a new, empty packet big enough for all ARP fields, given some
    /// hardware/protocol address lengths.
    ///
    pub fn new(hardware_addr_len: u8, protocol_addr_len: u8) -> Self {
        let len = 8 + (2 * hardware_addr_len as usize) + (2 * protocol_addr_len as usize);
        let mut arp = ArpPacket { data: vec![0; len] };
        arp.set_hardware_addr_len(hardware_addr_len);
        arp.set_protocol_addr_len(protocol_addr_len);
        arp
    }

    fn ethernet_ipv4(op: ArpOp) -> Self {
        let mut arp = ArpPacket::new(6, 4);
        arp.set_hardware_type(ArpHardwareType::Ethernet as u16);
        arp.set_protocol_type(IPV4_ETHER_TYPE);
        arp.set_opcode(op as u16);
        arp
    }

    /// A request asking who owns `target_ip`. The target hardware address is left zeroed, it is
    /// the value being asked for.
    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        let mut arp = ArpPacket::ethernet_ipv4(ArpOp::Request);
        arp.set_sender_hardware_addr(sender_mac);
        arp.set_sender_protocol_addr(sender_ip);
        arp.set_target_protocol_addr(target_ip);
        arp
    }

    pub fn reply(
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        let mut arp = ArpPacket::ethernet_ipv4(ArpOp::Reply);
        arp.set_sender_hardware_addr(sender_mac);
        arp.set_sender_protocol_addr(sender_ip);
        arp.set_target_hardware_addr(target_mac);
        arp.set_target_protocol_addr(target_ip);
        arp
    }

    pub fn hardware_type(&self) -> u16 {
        let (start, end) = HARDWARE_TYPE_RANGE;
        u16::from_be_bytes(self.data[start..end].try_into().unwrap())
    }

    pub fn protocol_type(&self) -> u16 {
        let (start, end) = PROTOCOL_TYPE_RANGE;
        u16::from_be_bytes(self.data[start..end].try_into().unwrap())
    }

    pub fn hardware_addr_len(&self) -> u8 {
        self.data[HARDWARE_ADDR_LEN_RANGE.0]
    }

    pub fn protocol_addr_len(&self) -> u8 {
        self.data[PROTOCOL_ADDR_LEN_RANGE.0]
    }

    pub fn opcode(&self) -> u16 {
        let (start, end) = OPCODE_RANGE;
        u16::from_be_bytes(self.data[start..end].try_into().unwrap())
    }

    /// The opcode, if it is one this stack understands.
    pub fn op(&self) -> Option<ArpOp> {
        ArpOp::try_from(self.opcode()).ok()
    }

    pub fn sender_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.sender_hardware_addr_range();
        &self.data[start..end]
    }

    pub fn sender_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.sender_protocol_addr_range();
        &self.data[start..end]
    }

    pub fn target_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.target_hardware_addr_range();
        &self.data[start..end]
    }

    pub fn target_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.target_protocol_addr_range();
        &self.data[start..end]
    }

    pub fn sender_mac_addr(&self) -> Option<MacAddr> {
        <[u8; 6]>::try_from(self.sender_hardware_addr())
            .ok()
            .map(MacAddr::new)
    }

    pub fn sender_ipv4_addr(&self) -> Option<Ipv4Addr> {
        <[u8; 4]>::try_from(self.sender_protocol_addr())
            .ok()
            .map(Ipv4Addr::from)
    }

    pub fn target_mac_addr(&self) -> Option<MacAddr> {
        <[u8; 6]>::try_from(self.target_hardware_addr())
            .ok()
            .map(MacAddr::new)
    }

    pub fn target_ipv4_addr(&self) -> Option<Ipv4Addr> {
        <[u8; 4]>::try_from(self.target_protocol_addr())
            .ok()
            .map(Ipv4Addr::from)
    }

    pub fn set_hardware_type(&mut self, htype: u16) {
        let (start, end) = HARDWARE_TYPE_RANGE;
        self.data[start..end].copy_from_slice(&htype.to_be_bytes());
    }

    pub fn set_protocol_type(&mut self, ptype: u16) {
        let (start, end) = PROTOCOL_TYPE_RANGE;
        self.data[start..end].copy_from_slice(&ptype.to_be_bytes());
    }

    pub fn set_hardware_addr_len(&mut self, len: u8) {
        self.data[HARDWARE_ADDR_LEN_RANGE.0] = len;
    }

    pub fn set_protocol_addr_len(&mut self, len: u8) {
        self.data[PROTOCOL_ADDR_LEN_RANGE.0] = len;
    }

    pub fn set_opcode(&mut self, code: u16) {
        let (start, end) = OPCODE_RANGE;
        self.data[start..end].copy_from_slice(&code.to_be_bytes());
    }

    pub fn set_sender_hardware_addr(&mut self, addr: MacAddr) {
        let (start, end) = self.sender_hardware_addr_range();
        self.data[start..end].copy_from_slice(&addr.bytes);
    }

    pub fn set_sender_protocol_addr(&mut self, addr: Ipv4Addr) {
        let (start, end) = self.sender_protocol_addr_range();
        self.data[start..end].copy_from_slice(&addr.octets());
    }

    pub fn set_target_hardware_addr(&mut self, addr: MacAddr) {
        let (start, end) = self.target_hardware_addr_range();
        self.data[start..end].copy_from_slice(&addr.bytes);
    }

    pub fn set_target_protocol_addr(&mut self, addr: Ipv4Addr) {
        let (start, end) = self.target_protocol_addr_range();
        self.data[start..end].copy_from_slice(&addr.octets());
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    // Move ownership of the bytes back to the caller
    pub fn into_bytes(self) -> PacketData {
        self.data
    }

    fn sender_hardware_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;

        let start = 8;
        let end = start + hlen;
        (start, end)
    }
    fn sender_protocol_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;

        let start = 8 + hlen;
        let end = start + plen;
        (start, end)
    }
    fn target_hardware_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;

        let start = 8 + hlen + plen;
        let end = start + hlen;
        (start, end)
    }
    fn target_protocol_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;

        let start = 8 + (2 * hlen) + plen;
        let end = start + plen;
        (start, end)
    }
}

impl TryFrom<PacketData> for ArpPacket {
    type Error = &'static str;

    ///
    /// Decorates the given payload with ArpPacket getters/setters.
    /// Validates the payload is big enough for the hardware/protocol address lengths it
    /// declares. Trailing link padding is cut off.
    ///
    fn try_from(mut data: PacketData) -> Result<Self, Self::Error> {
        if data.len() < 8 {
            return Err("ARP payload is too small");
        }

        let hlen = data[HARDWARE_ADDR_LEN_RANGE.0] as usize;
        let plen = data[PROTOCOL_ADDR_LEN_RANGE.0] as usize;
        let len = 8 + (2 * hlen) + (2 * plen);

        if data.len() < len {
            return Err("ARP payload doesn't match address length fields");
        }
        data.truncate(len);

        Ok(ArpPacket { data })
    }
}
