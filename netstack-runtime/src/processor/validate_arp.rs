use crate::processor::Processor;
use netstack_packets::{ArpHardwareType, ArpPacket, IPV4_ETHER_TYPE};

/// Passes only Ethernet/IPv4 address resolution packets carrying a known operation.
#[derive(Default, Clone)]
pub struct ValidateArp {}

impl ValidateArp {
    pub fn new() -> ValidateArp {
        ValidateArp {}
    }
}

impl Processor for ValidateArp {
    type Input = ArpPacket;
    type Output = ArpPacket;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output> {
        let supported = packet.hardware_type() == ArpHardwareType::Ethernet as u16
            && packet.protocol_type() == IPV4_ETHER_TYPE
            && packet.hardware_addr_len() == 6
            && packet.protocol_addr_len() == 4
            && packet.op().is_some();
        if supported {
            Some(packet)
        } else {
            None
        }
    }
}
