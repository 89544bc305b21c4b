use super::StackCore;
use crate::error::Result;
use crate::processor::{Processor, ValidateArp};
use crate::state::{CacheUpdate, EntryState, PendingPacket};
use crate::stats::DropReason;
use netstack_packets::{ArpOp, ArpPacket, EtherType, MacAddr};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

impl StackCore {
    /// The hardware address cached for `ipv4_addr`, if any.
    pub fn lookup(&self, ipv4_addr: Ipv4Addr) -> Option<MacAddr> {
        self.arp_cache.lookup(ipv4_addr)
    }

    /// Records an address pair, sweeping expired entries first.
    pub fn update_arp_cache(
        &mut self,
        ipv4_addr: Ipv4Addr,
        mac_addr: MacAddr,
        state: EntryState,
    ) -> CacheUpdate {
        let now = self.now();
        let update = self.arp_cache.update(ipv4_addr, mac_addr, state, now);
        match update {
            CacheUpdate::Evicted(slot, previous) => {
                debug!(slot, %previous, %ipv4_addr, "evicted ARP entry")
            }
            _ => trace!(slot = update.slot(), %ipv4_addr, %mac_addr, "updated ARP entry"),
        }
        update
    }

    /// Frames `packet` for `target` right away if its hardware address is known. Otherwise the
    /// packet takes the pending slot, displacing whatever was there, and a request for `target`
    /// is broadcast.
    pub fn resolve_and_send(
        &mut self,
        packet: Vec<u8>,
        target: Ipv4Addr,
        ether_type: EtherType,
    ) -> Result<()> {
        if let Some(mac_addr) = self.lookup(target) {
            return self.encode_and_send(&packet, mac_addr, ether_type);
        }

        let pending = PendingPacket {
            target,
            ether_type,
            packet,
        };
        if let Some(displaced) = self.pending.store(pending) {
            self.stats.pending_overwritten += 1;
            debug!(displaced = %displaced.target, %target, "pending packet replaced");
        }
        self.emit_arp_request(target)
    }

    /// Broadcasts a request asking who owns `target`.
    pub fn emit_arp_request(&mut self, target: Ipv4Addr) -> Result<()> {
        let request = ArpPacket::request(self.config.mac_addr, self.config.ipv4_addr, target);
        debug!(%target, "sending ARP request");
        self.encode_and_send(request.as_bytes(), MacAddr::BROADCAST, EtherType::Arp)?;
        self.stats.arp_requests_sent += 1;
        Ok(())
    }

    /// A request naming ourselves as the target, so neighbours pick up our address.
    pub(super) fn announce(&mut self) -> Result<()> {
        let own = self.config.ipv4_addr;
        self.emit_arp_request(own)
    }

    /// Learns the sender of every well formed message. Then either flushes the pending packet,
    /// when that message resolved it, or answers a request for our own address. A waiting
    /// pending packet suppresses replies even when it stays unresolved.
    pub fn handle_arp(&mut self, payload: Vec<u8>) -> Result<()> {
        let packet = match ArpPacket::try_from(payload) {
            Ok(packet) => packet,
            Err(_) => {
                self.discard(DropReason::MalformedArp);
                return Ok(());
            }
        };
        let packet = match ValidateArp::new().process(packet) {
            Some(packet) => packet,
            None => {
                self.discard(DropReason::UnsupportedArp);
                return Ok(());
            }
        };

        let fields = (
            packet.op(),
            packet.sender_mac_addr(),
            packet.sender_ipv4_addr(),
            packet.target_ipv4_addr(),
        );
        let (op, sender_mac, sender_ip, target_ip) = match fields {
            (Some(op), Some(sender_mac), Some(sender_ip), Some(target_ip)) => {
                (op, sender_mac, sender_ip, target_ip)
            }
            _ => {
                self.discard(DropReason::MalformedArp);
                return Ok(());
            }
        };
        trace!(?op, %sender_ip, %sender_mac, %target_ip, "received ARP");

        self.update_arp_cache(sender_ip, sender_mac, EntryState::Valid);

        if let Some(waiting_on) = self.pending.target() {
            if let Some(mac_addr) = self.lookup(waiting_on) {
                if let Some(pending) = self.pending.take_for(waiting_on) {
                    debug!(target = %waiting_on, %mac_addr, "sending pending packet");
                    self.encode_and_send(&pending.packet, mac_addr, pending.ether_type)?;
                    self.stats.pending_flushed += 1;
                }
            }
            return Ok(());
        }

        if op == ArpOp::Request && target_ip == self.config.ipv4_addr {
            let reply = ArpPacket::reply(
                self.config.mac_addr,
                self.config.ipv4_addr,
                sender_mac,
                sender_ip,
            );
            debug!(requester = %sender_ip, "answering ARP request");
            self.encode_and_send(reply.as_bytes(), sender_mac, EtherType::Arp)?;
            self.stats.arp_replies_sent += 1;
        }
        Ok(())
    }
}
