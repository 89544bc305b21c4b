use crate::classifier::Classifier;
use netstack_packets::{IpProtocol, Ipv4Packet};
use std::collections::HashSet;

/// Where a locally addressed datagram goes next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Demux {
    /// ICMP, answered by the stack itself
    Control,
    /// A protocol some upper layer has claimed
    Upper(IpProtocol),
    /// Nobody speaks this protocol; the sender gets a protocol unreachable.
    Unreachable(IpProtocol),
}

/// Picks a handler for each datagram from the protocols registered with the stack.
pub struct IpProtocolClassifier<'a> {
    registered: &'a HashSet<IpProtocol>,
}

impl<'a> IpProtocolClassifier<'a> {
    pub fn new(registered: &'a HashSet<IpProtocol>) -> IpProtocolClassifier<'a> {
        IpProtocolClassifier { registered }
    }
}

impl<'a> Classifier for IpProtocolClassifier<'a> {
    type Packet = Ipv4Packet;
    type Class = Demux;

    fn classify(&self, packet: &Self::Packet) -> Self::Class {
        match packet.protocol() {
            IpProtocol::ICMP => Demux::Control,
            protocol if self.registered.contains(&protocol) => Demux::Upper(protocol),
            protocol => Demux::Unreachable(protocol),
        }
    }
}
