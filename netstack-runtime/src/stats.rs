use std::collections::HashMap;
use std::fmt;

/// Why an inbound packet went no further.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Shorter than the 14 byte Ethernet envelope
    RuntFrame,
    UnknownEtherType,
    /// Truncated, or declares address lengths its buffer can't hold
    MalformedArp,
    /// Not Ethernet/IPv4 address resolution
    UnsupportedArp,
    /// Too short for its header, or inconsistent length fields
    MalformedDatagram,
    /// Version other than 4, or an IHL outside of 5..=6
    UnsupportedHeader,
    ChecksumMismatch,
    NotForUs,
    /// Shorter than the 8 byte ICMP header
    TruncatedIcmp,
    /// ICMP the stack doesn't answer
    UnhandledIcmp,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let reason = match self {
            DropReason::RuntFrame => "frame shorter than Ethernet header",
            DropReason::UnknownEtherType => "unknown ether type",
            DropReason::MalformedArp => "malformed ARP packet",
            DropReason::UnsupportedArp => "unsupported ARP hardware or protocol",
            DropReason::MalformedDatagram => "malformed IPv4 datagram",
            DropReason::UnsupportedHeader => "unsupported IPv4 version or header length",
            DropReason::ChecksumMismatch => "IPv4 header checksum mismatch",
            DropReason::NotForUs => "datagram addressed to another host",
            DropReason::TruncatedIcmp => "ICMP message shorter than its header",
            DropReason::UnhandledIcmp => "ICMP message type not answered",
        };
        f.write_str(reason)
    }
}

/// Counters kept by a running stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackStats {
    pub frames_received: u64,
    pub frames_sent: u64,
    pub arp_requests_sent: u64,
    pub arp_replies_sent: u64,
    /// Buffered packets sent once their next hop resolved
    pub pending_flushed: u64,
    /// Buffered packets lost because a newer one took the slot
    pub pending_overwritten: u64,
    pub datagrams_delivered: u64,
    pub datagrams_sent: u64,
    pub fragments_sent: u64,
    pub echo_replies_sent: u64,
    pub unreachables_sent: u64,
    drops: HashMap<DropReason, u64>,
}

impl StackStats {
    pub fn record_drop(&mut self, reason: DropReason) {
        *self.drops.entry(reason).or_insert(0) += 1;
    }

    pub fn drops(&self, reason: DropReason) -> u64 {
        self.drops.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_drops(&self) -> u64 {
        self.drops.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_drops_by_reason() {
        let mut stats = StackStats::default();
        stats.record_drop(DropReason::ChecksumMismatch);
        stats.record_drop(DropReason::ChecksumMismatch);
        stats.record_drop(DropReason::RuntFrame);

        assert_eq!(stats.drops(DropReason::ChecksumMismatch), 2);
        assert_eq!(stats.drops(DropReason::RuntFrame), 1);
        assert_eq!(stats.drops(DropReason::NotForUs), 0);
        assert_eq!(stats.total_drops(), 3);
    }
}
