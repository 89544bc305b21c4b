use crate::processor::Processor;
use netstack_packets::Ipv4Packet;
use std::net::Ipv4Addr;

/// Passes IPv4 datagrams whose header is 20 or 24 bytes long. Longer option blocks aren't
/// accepted.
#[derive(Default, Clone)]
pub struct ValidateIpv4Header {}

impl ValidateIpv4Header {
    pub fn new() -> ValidateIpv4Header {
        ValidateIpv4Header {}
    }
}

impl Processor for ValidateIpv4Header {
    type Input = Ipv4Packet;
    type Output = Ipv4Packet;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output> {
        match (packet.version(), packet.ihl()) {
            (4, 5..=6) => Some(packet),
            _ => None,
        }
    }
}

/// Drops datagrams whose header checksum doesn't match their header bytes, options included.
#[derive(Default, Clone)]
pub struct VerifyIpv4Checksum {}

impl VerifyIpv4Checksum {
    pub fn new() -> VerifyIpv4Checksum {
        VerifyIpv4Checksum {}
    }
}

impl Processor for VerifyIpv4Checksum {
    type Input = Ipv4Packet;
    type Output = Ipv4Packet;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output> {
        if packet.validate_checksum() {
            Some(packet)
        } else {
            None
        }
    }
}

/// Keeps only datagrams addressed to the host.
#[derive(Clone)]
pub struct FilterDestination {
    local: Ipv4Addr,
}

impl FilterDestination {
    pub fn new(local: Ipv4Addr) -> FilterDestination {
        FilterDestination { local }
    }
}

impl Processor for FilterDestination {
    type Input = Ipv4Packet;
    type Output = Ipv4Packet;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output> {
        if packet.dest_addr() == self.local {
            Some(packet)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netstack_packets::{IpProtocol, Ipv4Header};
    use std::convert::TryFrom;

    fn datagram(dest: Ipv4Addr) -> Ipv4Packet {
        let header = Ipv4Header {
            src_addr: Ipv4Addr::new(10, 0, 0, 1),
            dest_addr: dest,
            protocol: IpProtocol::UDP,
            identification: 0,
            more_fragments: false,
            fragment_offset: 0,
            ttl: 64,
        };
        Ipv4Packet::encap(&header, &[1, 2, 3, 4])
    }

    #[test]
    fn header_shape() {
        let mut elem = ValidateIpv4Header::new();
        let packet = datagram(Ipv4Addr::new(10, 0, 0, 2));
        assert!(elem.process(packet.clone()).is_some());

        let mut v6 = packet.clone();
        v6.set_version(6);
        assert!(elem.process(v6).is_none());
    }

    #[test]
    fn one_option_word_is_accepted_two_are_not() {
        let mut elem = ValidateIpv4Header::new();

        let mut data = datagram(Ipv4Addr::new(10, 0, 0, 2)).into_bytes();
        data.splice(20..20, vec![0x01; 4]);
        data[0] = 0x46;
        let len = (data.len() as u16).to_be_bytes();
        data[2..4].copy_from_slice(&len);
        assert!(elem.process(Ipv4Packet::try_from(data.clone()).unwrap()).is_some());

        data.splice(24..24, vec![0x01; 4]);
        data[0] = 0x47;
        let len = (data.len() as u16).to_be_bytes();
        data[2..4].copy_from_slice(&len);
        assert!(elem.process(Ipv4Packet::try_from(data).unwrap()).is_none());
    }

    #[test]
    fn checksum() {
        let mut elem = VerifyIpv4Checksum::new();
        let packet = datagram(Ipv4Addr::new(10, 0, 0, 2));
        assert!(elem.process(packet.clone()).is_some());

        let mut corrupted = packet;
        corrupted.set_ttl(3);
        assert!(elem.process(corrupted).is_none());
    }

    #[test]
    fn destination() {
        let local = Ipv4Addr::new(10, 0, 0, 2);
        let mut elem = FilterDestination::new(local);
        assert!(elem.process(datagram(local)).is_some());
        assert!(elem.process(datagram(Ipv4Addr::new(10, 0, 0, 3))).is_none());
    }
}
