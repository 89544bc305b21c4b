#![allow(dead_code)]

use netstack_packets::{ArpPacket, EtherType, EthernetFrame, Ipv4Packet, MacAddr};
use netstack_runtime::config::StackConfig;
use netstack_runtime::utils::test::packet_generators::arp_request_frame;
use netstack_runtime::utils::test::{DriverProbe, ManualClock, RecordingDriver};
use netstack_runtime::NetStack;
use std::convert::TryFrom;
use std::net::Ipv4Addr;

pub const HOST_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
pub const HOST_MAC: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x02]);

pub const PEER_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
pub const PEER_MAC: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);

pub const OTHER_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 3);
pub const OTHER_MAC: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x03]);

/// Our host, without the start-up announcement so tests see only the traffic they cause.
pub fn config() -> StackConfig {
    StackConfig::new(HOST_IP, HOST_MAC).with_announce_on_start(false)
}

pub fn stack_with(config: StackConfig) -> (NetStack, DriverProbe, ManualClock) {
    let (driver, probe) = RecordingDriver::new();
    let clock = ManualClock::new();
    let stack = NetStack::with_clock(config, driver, clock.clone()).unwrap();
    (stack, probe, clock)
}

pub fn stack() -> (NetStack, DriverProbe, ManualClock) {
    stack_with(config())
}

/// Has the peer ask for our address, which teaches the stack the peer's, then throws away our
/// reply.
pub fn learn_peer(stack: &mut NetStack, probe: &DriverProbe) {
    stack
        .handle_frame(arp_request_frame(PEER_MAC, PEER_IP, HOST_IP))
        .unwrap();
    assert_eq!(probe.sent().len(), 1);
}

pub fn parse_frame(bytes: Vec<u8>) -> EthernetFrame {
    EthernetFrame::from_buffer(bytes).unwrap()
}

pub fn parse_arp(bytes: Vec<u8>) -> ArpPacket {
    let frame = parse_frame(bytes);
    assert_eq!(frame.ether_type(), EtherType::Arp);
    ArpPacket::try_from(frame.into_payload()).unwrap()
}

pub fn parse_ipv4(bytes: Vec<u8>) -> Ipv4Packet {
    Ipv4Packet::try_from(parse_frame(bytes)).unwrap()
}
