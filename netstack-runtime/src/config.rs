use netstack_packets::MacAddr;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

/// Smallest MTU every IPv4 host must accept.
pub const MIN_MTU: usize = 68;
/// Largest MTU the 16 bit total length field can describe.
pub const MAX_MTU: usize = 65535;

pub const DEFAULT_MTU: usize = 1500;
pub const DEFAULT_ARP_CACHE_CAPACITY: usize = 16;
pub const DEFAULT_ARP_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_TTL: u8 = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MTU {0} is outside of {}..={}", MIN_MTU, MAX_MTU)]
    MtuOutOfRange(usize),

    #[error("ARP cache needs at least one slot")]
    EmptyArpCache,

    #[error("Default TTL must be at least 1")]
    ZeroTtl,

    #[error("Host address {0} is not a usable unicast address")]
    UnusableAddress(Ipv4Addr),

    #[error("Host MAC {0} is not a unicast address")]
    UnusableMac(MacAddr),
}

/// Everything a stack instance needs to know about the host it runs for. Built once and handed
/// to `NetStack`, which never mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    /// Our IPv4 address. Datagrams to any other destination are dropped.
    pub ipv4_addr: Ipv4Addr,
    /// Our hardware address, used as the source of every frame.
    pub mac_addr: MacAddr,
    /// Largest IPv4 datagram the link carries, header included.
    pub mtu: usize,
    pub arp_cache_capacity: usize,
    /// Age after which a resolved entry no longer counts.
    pub arp_timeout: Duration,
    pub default_ttl: u8,
    /// Broadcast a request for our own address when the stack starts.
    pub announce_on_start: bool,
}

impl StackConfig {
    pub fn new(ipv4_addr: Ipv4Addr, mac_addr: MacAddr) -> Self {
        StackConfig {
            ipv4_addr,
            mac_addr,
            mtu: DEFAULT_MTU,
            arp_cache_capacity: DEFAULT_ARP_CACHE_CAPACITY,
            arp_timeout: DEFAULT_ARP_TIMEOUT,
            default_ttl: DEFAULT_TTL,
            announce_on_start: true,
        }
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn with_arp_cache_capacity(mut self, capacity: usize) -> Self {
        self.arp_cache_capacity = capacity;
        self
    }

    pub fn with_arp_timeout(mut self, timeout: Duration) -> Self {
        self.arp_timeout = timeout;
        self
    }

    pub fn with_default_ttl(mut self, ttl: u8) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_announce_on_start(mut self, announce: bool) -> Self {
        self.announce_on_start = announce;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mtu < MIN_MTU || self.mtu > MAX_MTU {
            return Err(ConfigError::MtuOutOfRange(self.mtu));
        }
        if self.arp_cache_capacity == 0 {
            return Err(ConfigError::EmptyArpCache);
        }
        if self.default_ttl == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if self.ipv4_addr.is_unspecified()
            || self.ipv4_addr.is_broadcast()
            || self.ipv4_addr.is_multicast()
        {
            return Err(ConfigError::UnusableAddress(self.ipv4_addr));
        }
        // The low bit of the first octet marks group addresses
        if self.mac_addr.bytes[0] & 0x01 != 0 || self.mac_addr == MacAddr::UNSPECIFIED {
            return Err(ConfigError::UnusableMac(self.mac_addr));
        }
        Ok(())
    }

    /// Payload bytes that fit in one datagram: the MTU less a bare 20 byte header, rounded down
    /// to the 8 byte granularity of the fragment offset field.
    pub fn max_fragment_payload(&self) -> usize {
        (self.mtu - netstack_packets::IPV4_HEADER_LEN) & !0x7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> StackConfig {
        StackConfig::new(
            Ipv4Addr::new(10, 0, 0, 2),
            MacAddr::new([0x02, 0, 0, 0, 0, 0x02]),
        )
    }

    #[test]
    fn defaults() {
        let config = host();
        assert_eq!(config.mtu, 1500);
        assert_eq!(config.arp_cache_capacity, 16);
        assert_eq!(config.arp_timeout, Duration::from_secs(300));
        assert_eq!(config.default_ttl, 64);
        assert!(config.announce_on_start);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn ethernet_mtu_fragments_at_1480() {
        assert_eq!(host().max_fragment_payload(), 1480);
        assert_eq!(host().with_mtu(576).max_fragment_payload(), 552);
        assert_eq!(host().with_mtu(71).max_fragment_payload(), 48);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            host().with_mtu(67).validate(),
            Err(ConfigError::MtuOutOfRange(67))
        );
        assert_eq!(
            host().with_mtu(65536).validate(),
            Err(ConfigError::MtuOutOfRange(65536))
        );
        assert_eq!(
            host().with_arp_cache_capacity(0).validate(),
            Err(ConfigError::EmptyArpCache)
        );
        assert_eq!(host().with_default_ttl(0).validate(), Err(ConfigError::ZeroTtl));

        let mut config = host();
        config.ipv4_addr = Ipv4Addr::BROADCAST;
        assert!(config.validate().is_err());

        let mut config = host();
        config.mac_addr = MacAddr::BROADCAST;
        assert!(config.validate().is_err());
    }
}
