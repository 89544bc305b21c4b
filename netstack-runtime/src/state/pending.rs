use netstack_packets::EtherType;
use std::net::Ipv4Addr;

/// A packet held back until the hardware address of its next hop is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingPacket {
    pub target: Ipv4Addr,
    /// How the packet is tagged once it is framed
    pub ether_type: EtherType,
    pub packet: Vec<u8>,
}

/// Holds at most one unresolved outbound packet. Storing a second replaces the first.
#[derive(Clone, Debug, Default)]
pub struct PendingSlot {
    slot: Option<PendingPacket>,
}

impl PendingSlot {
    pub fn new() -> PendingSlot {
        PendingSlot { slot: None }
    }

    /// Buffers `pending`, handing back whatever it displaced.
    pub fn store(&mut self, pending: PendingPacket) -> Option<PendingPacket> {
        self.slot.replace(pending)
    }

    pub fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    pub fn target(&self) -> Option<Ipv4Addr> {
        self.slot.as_ref().map(|pending| pending.target)
    }

    /// Empties the slot if it is waiting on `resolved`.
    pub fn take_for(&mut self, resolved: Ipv4Addr) -> Option<PendingPacket> {
        if self.target() == Some(resolved) {
            self.slot.take()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(last: u8, packet: Vec<u8>) -> PendingPacket {
        PendingPacket {
            target: Ipv4Addr::new(10, 0, 0, last),
            ether_type: EtherType::Ipv4,
            packet,
        }
    }

    #[test]
    fn store_and_take() {
        let mut slot = PendingSlot::new();
        assert!(!slot.is_occupied());
        assert_eq!(slot.store(pending(1, vec![1, 2, 3])), None);
        assert_eq!(slot.target(), Some(Ipv4Addr::new(10, 0, 0, 1)));

        assert_eq!(slot.take_for(Ipv4Addr::new(10, 0, 0, 9)), None);
        assert!(slot.is_occupied());

        let taken = slot.take_for(Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(taken.packet, vec![1, 2, 3]);
        assert!(!slot.is_occupied());
    }

    #[test]
    fn newer_packet_replaces_older() {
        let mut slot = PendingSlot::new();
        slot.store(pending(1, vec![1]));
        let displaced = slot.store(pending(2, vec![2])).unwrap();
        assert_eq!(displaced.packet, vec![1]);
        assert_eq!(slot.target(), Some(Ipv4Addr::new(10, 0, 0, 2)));
    }
}
