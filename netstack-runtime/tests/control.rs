mod common;

use common::*;
use netstack_packets::checksum;
use netstack_packets::{EtherType, IcmpMessage, IcmpType, IpProtocol, UnreachableCode};
use netstack_runtime::utils::test::packet_generators::{
    arp_reply_frame, echo_request, frame, ipv4_datagram, random_payload,
};
use netstack_runtime::DropReason;
use std::convert::TryFrom;

fn to_host(datagram: &[u8]) -> Vec<u8> {
    frame(HOST_MAC, PEER_MAC, EtherType::Ipv4, datagram)
}

fn icmp_to_host(message: &[u8]) -> Vec<u8> {
    to_host(&ipv4_datagram(PEER_IP, HOST_IP, IpProtocol::ICMP, message))
}

fn parse_icmp(bytes: Vec<u8>) -> IcmpMessage {
    let packet = parse_ipv4(bytes);
    assert_eq!(packet.protocol(), IpProtocol::ICMP);
    assert_eq!(packet.src_addr(), HOST_IP);
    assert_eq!(packet.dest_addr(), PEER_IP);
    IcmpMessage::try_from(packet.into_payload()).unwrap()
}

#[test]
fn answers_echo_requests() {
    let (mut stack, probe, _) = stack();
    learn_peer(&mut stack, &probe);

    let body = random_payload(32);
    stack
        .handle_frame(icmp_to_host(&echo_request(0x4242, 7, &body)))
        .unwrap();

    let sent = probe.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(parse_frame(sent[0].clone()).dest_mac(), PEER_MAC);

    let reply = parse_icmp(sent[0].clone());
    assert_eq!(reply.icmp_type(), IcmpType::EchoReply);
    assert_eq!(reply.code(), 0);
    assert_eq!(reply.identifier(), 0x4242);
    assert_eq!(reply.sequence(), 7);
    assert_eq!(reply.body(), &body[..]);
    assert!(reply.validate_checksum());
    assert!(checksum::verify(reply.as_bytes()));
    assert_eq!(stack.stats().echo_replies_sent, 1);
}

#[test]
fn echo_reply_waits_for_resolution() {
    let (mut stack, probe, _) = stack();
    stack
        .handle_frame(icmp_to_host(&echo_request(1, 1, b"ping")))
        .unwrap();

    let sent = probe.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(parse_frame(sent[0].clone()).ether_type(), EtherType::Arp);

    stack
        .handle_frame(arp_reply_frame(PEER_MAC, PEER_IP, HOST_MAC, HOST_IP))
        .unwrap();
    let sent = probe.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(parse_icmp(sent[0].clone()).body(), b"ping");
}

#[test]
fn short_messages_are_dropped() {
    let (mut stack, probe, _) = stack();
    learn_peer(&mut stack, &probe);
    stack.handle_frame(icmp_to_host(&[8, 0, 0, 0])).unwrap();

    assert!(probe.sent().is_empty());
    assert_eq!(stack.stats().drops(DropReason::TruncatedIcmp), 1);
}

#[test]
fn other_messages_are_not_answered() {
    let (mut stack, probe, _) = stack();
    learn_peer(&mut stack, &probe);

    let mut reply = IcmpMessage::new(IcmpType::EchoReply, 0, &[0; 8]);
    reply.set_checksum();
    stack.handle_frame(icmp_to_host(reply.as_bytes())).unwrap();

    let mut odd_code = IcmpMessage::new(IcmpType::EchoRequest, 1, &[0; 8]);
    odd_code.set_checksum();
    stack.handle_frame(icmp_to_host(odd_code.as_bytes())).unwrap();

    assert!(probe.sent().is_empty());
    assert_eq!(stack.stats().drops(DropReason::UnhandledIcmp), 2);
}

#[test]
fn unknown_protocols_get_protocol_unreachable() {
    let (mut stack, probe, _) = stack();
    learn_peer(&mut stack, &probe);

    let original = ipv4_datagram(PEER_IP, HOST_IP, IpProtocol::TCP, &random_payload(40));
    stack.handle_frame(to_host(&original)).unwrap();

    let sent = probe.sent();
    assert_eq!(sent.len(), 1);
    let message = parse_icmp(sent[0].clone());
    assert_eq!(message.icmp_type(), IcmpType::DestinationUnreachable);
    assert_eq!(message.code(), UnreachableCode::Protocol as u8);
    assert_eq!(message.body(), &original[..28]);
    assert!(message.validate_checksum());
    assert_eq!(stack.stats().unreachables_sent, 1);
}

#[test]
fn short_datagrams_are_quoted_whole() {
    let (mut stack, probe, _) = stack();
    learn_peer(&mut stack, &probe);

    let original = ipv4_datagram(PEER_IP, HOST_IP, IpProtocol::Other(200), &[1, 2, 3]);
    stack.handle_frame(to_host(&original)).unwrap();

    let message = parse_icmp(probe.sent().remove(0));
    assert_eq!(message.body(), &original[..]);
}

#[test]
fn port_unreachable_on_request() {
    let (mut stack, probe, _) = stack();
    learn_peer(&mut stack, &probe);

    let original = ipv4_datagram(PEER_IP, HOST_IP, IpProtocol::UDP, &random_payload(16));
    stack
        .core_mut()
        .send_unreachable(&original, PEER_IP, UnreachableCode::Port)
        .unwrap();

    let message = parse_icmp(probe.sent().remove(0));
    assert_eq!(message.code(), 3);
    assert_eq!(message.body(), &original[..28]);
}
