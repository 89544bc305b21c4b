//! The stack itself. One `StackCore` carries everything the layers share: configuration, the
//! driver, the clock, the resolver's cache and pending slot, the fragment id counter and the
//! counters. Each layer is a set of methods on it, in its own file:
//!
//! - `framer`: Ethernet envelope on the way in and out
//! - `resolver`: ARP, the cache and the single pending packet
//! - `datagram`: IPv4 validation, demultiplexing and fragmentation
//! - `control`: ICMP echo replies and destination unreachable messages
//!
//! `NetStack` wraps a core together with the upper layers registered on it, and drives the core
//! from the driver.

mod control;
mod datagram;
mod framer;
mod resolver;

use crate::clock::{Clock, SystemClock};
use crate::config::StackConfig;
use crate::driver::Driver;
use crate::error::{Result, StackError};
use crate::state::{ArpCache, PendingSlot};
use crate::stats::{DropReason, StackStats};
use netstack_packets::{IpProtocol, ETHERNET_HEADER_LEN};
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::time::Instant;
use tracing::{debug, info};

/// A transport protocol sitting on top of the stack.
///
/// `upper_in` gets the payload of every datagram carrying its protocol, along with the sender's
/// address, and the core, so it can answer through `StackCore::send_datagram` right away.
pub trait UpperLayer: Send {
    fn upper_in(&mut self, payload: &[u8], source: Ipv4Addr, stack: &mut StackCore) -> Result<()>;
}

impl<F> UpperLayer for F
where
    F: FnMut(&[u8], Ipv4Addr, &mut StackCore) -> Result<()> + Send,
{
    fn upper_in(&mut self, payload: &[u8], source: Ipv4Addr, stack: &mut StackCore) -> Result<()> {
        self(payload, source, stack)
    }
}

/// A datagram the core accepted for an upper layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub protocol: IpProtocol,
    pub source: Ipv4Addr,
    pub payload: Vec<u8>,
}

pub struct StackCore {
    config: StackConfig,
    driver: Box<dyn Driver>,
    clock: Box<dyn Clock>,
    arp_cache: ArpCache,
    pending: PendingSlot,
    next_fragment_id: u16,
    registered: HashSet<IpProtocol>,
    stats: StackStats,
}

impl StackCore {
    fn new(config: StackConfig, driver: Box<dyn Driver>, clock: Box<dyn Clock>) -> StackCore {
        let arp_cache = ArpCache::new(config.arp_cache_capacity, config.arp_timeout);
        StackCore {
            config,
            driver,
            clock,
            arp_cache,
            pending: PendingSlot::new(),
            next_fragment_id: 0,
            registered: HashSet::new(),
            stats: StackStats::default(),
        }
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn stats(&self) -> &StackStats {
        &self.stats
    }

    pub fn arp_cache(&self) -> &ArpCache {
        &self.arp_cache
    }

    pub fn pending(&self) -> &PendingSlot {
        &self.pending
    }

    /// The identification the next outbound datagram will carry.
    pub fn next_fragment_id(&self) -> u16 {
        self.next_fragment_id
    }

    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn discard(&mut self, reason: DropReason) {
        debug!(%reason, "dropping packet");
        self.stats.record_drop(reason);
    }
}

/// A stack instance bound to one driver and one host address.
pub struct NetStack {
    core: StackCore,
    upper_layers: HashMap<IpProtocol, Box<dyn UpperLayer>>,
    rx_buf: Vec<u8>,
}

impl NetStack {
    pub fn new(config: StackConfig, driver: impl Driver + 'static) -> Result<NetStack> {
        NetStack::with_clock(config, driver, SystemClock)
    }

    pub fn with_clock(
        config: StackConfig,
        driver: impl Driver + 'static,
        clock: impl Clock + 'static,
    ) -> Result<NetStack> {
        config.validate()?;
        let rx_buf = vec![0; config.mtu + ETHERNET_HEADER_LEN];
        Ok(NetStack {
            core: StackCore::new(config, Box::new(driver), Box::new(clock)),
            upper_layers: HashMap::new(),
            rx_buf,
        })
    }

    /// Hands every datagram carrying `protocol` to `upper`, replacing any earlier registration.
    /// ICMP belongs to the stack and can't be registered.
    pub fn register_upper_layer(
        &mut self,
        protocol: IpProtocol,
        upper: impl UpperLayer + 'static,
    ) -> Result<()> {
        if protocol == IpProtocol::ICMP {
            return Err(StackError::ProtocolReserved(protocol));
        }
        self.core.registered.insert(protocol);
        self.upper_layers.insert(protocol, Box::new(upper));
        Ok(())
    }

    /// Empties the resolver state and, unless configured otherwise, broadcasts a request for our
    /// own address so neighbours learn where we are.
    pub fn start(&mut self) -> Result<()> {
        self.core.arp_cache.clear();
        self.core.pending.clear();
        info!(
            ipv4_addr = %self.core.config.ipv4_addr,
            mac_addr = %self.core.config.mac_addr,
            mtu = self.core.config.mtu,
            "stack started"
        );
        if self.core.config.announce_on_start {
            self.core.announce()?;
        }
        Ok(())
    }

    /// Asks the driver for one frame and processes it. Returns false when nothing was waiting.
    pub fn poll(&mut self) -> Result<bool> {
        let len = self.core.driver.receive(&mut self.rx_buf)?;
        if len == 0 {
            return Ok(false);
        }
        let frame = self.rx_buf[..len].to_vec();
        self.handle_frame(frame)?;
        Ok(true)
    }

    /// Runs one received frame through every layer, up to and including an upper layer.
    pub fn handle_frame(&mut self, frame: Vec<u8>) -> Result<()> {
        if let Some(delivery) = self.core.decode_and_dispatch(frame)? {
            if let Some(upper) = self.upper_layers.get_mut(&delivery.protocol) {
                self.core.stats.datagrams_delivered += 1;
                upper.upper_in(&delivery.payload, delivery.source, &mut self.core)?;
            }
        }
        Ok(())
    }

    /// Sends `payload` to `dest` as one or more datagrams.
    pub fn send_datagram(
        &mut self,
        payload: &[u8],
        dest: Ipv4Addr,
        protocol: IpProtocol,
    ) -> Result<()> {
        self.core.send_datagram(payload, dest, protocol)
    }

    pub fn core(&self) -> &StackCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut StackCore {
        &mut self.core
    }

    pub fn config(&self) -> &StackConfig {
        self.core.config()
    }

    pub fn stats(&self) -> &StackStats {
        self.core.stats()
    }
}
