use super::{Delivery, StackCore};
use crate::classifier::{Classifier, Demux, IpProtocolClassifier};
use crate::error::{Result, StackError};
use crate::processor::{FilterDestination, Processor, ValidateIpv4Header, VerifyIpv4Checksum};
use crate::stats::DropReason;
use netstack_packets::{
    EtherType, IpProtocol, Ipv4Header, Ipv4Packet, UnreachableCode, IPV4_HEADER_LEN,
};
use std::cmp;
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

/// Largest byte offset the 13 bit fragment offset field can express.
const MAX_FRAGMENT_OFFSET: usize = 0x1FFF * 8;

impl StackCore {
    /// Validates a received datagram and sends it on: ICMP to the control layer, registered
    /// protocols back up to `NetStack` as a `Delivery`, anything else answered with a protocol
    /// unreachable. Fragments are handled one by one, nothing is reassembled.
    pub fn receive_datagram(&mut self, bytes: Vec<u8>) -> Result<Option<Delivery>> {
        let packet = match Ipv4Packet::try_from(bytes) {
            Ok(packet) => packet,
            Err(err) => {
                trace!(err, "unparseable datagram");
                self.discard(DropReason::MalformedDatagram);
                return Ok(None);
            }
        };
        let packet = match ValidateIpv4Header::new().process(packet) {
            Some(packet) => packet,
            None => {
                self.discard(DropReason::UnsupportedHeader);
                return Ok(None);
            }
        };
        let packet = match VerifyIpv4Checksum::new().process(packet) {
            Some(packet) => packet,
            None => {
                self.discard(DropReason::ChecksumMismatch);
                return Ok(None);
            }
        };
        let packet = match FilterDestination::new(self.config.ipv4_addr).process(packet) {
            Some(packet) => packet,
            None => {
                self.discard(DropReason::NotForUs);
                return Ok(None);
            }
        };

        let source = packet.src_addr();
        let demux = IpProtocolClassifier::new(&self.registered).classify(&packet);
        trace!(%source, ?demux, len = packet.total_len(), "received datagram");
        match demux {
            Demux::Control => {
                self.handle_icmp(packet.into_payload(), source)?;
                Ok(None)
            }
            Demux::Upper(protocol) => Ok(Some(Delivery {
                protocol,
                source,
                payload: packet.into_payload(),
            })),
            Demux::Unreachable(protocol) => {
                debug!(?protocol, %source, "no handler for protocol");
                self.send_unreachable(packet.as_bytes(), source, UnreachableCode::Protocol)?;
                Ok(None)
            }
        }
    }

    /// Sends `payload` to `dest`, split into as many fragments as the MTU calls for. Every
    /// fragment carries the same identification, taken from a counter that moves once per call.
    pub fn send_datagram(
        &mut self,
        payload: &[u8],
        dest: Ipv4Addr,
        protocol: IpProtocol,
    ) -> Result<()> {
        let max_payload = self.config.max_fragment_payload();
        let last_offset = payload.len().saturating_sub(1) / max_payload * max_payload;
        if last_offset > MAX_FRAGMENT_OFFSET
            || payload.len() + IPV4_HEADER_LEN > usize::from(u16::MAX)
        {
            return Err(StackError::PayloadTooLarge(payload.len()));
        }

        let id = self.next_fragment_id;
        self.next_fragment_id = self.next_fragment_id.wrapping_add(1);
        self.stats.datagrams_sent += 1;

        if payload.len() <= max_payload {
            return self.emit_fragment(payload, dest, protocol, id, 0, false);
        }

        trace!(%dest, id, len = payload.len(), "fragmenting datagram");
        let mut start = 0;
        while start < payload.len() {
            let end = cmp::min(start + max_payload, payload.len());
            let more_fragments = end < payload.len();
            // max_payload is a multiple of 8 so every start divides evenly
            let offset = (start / 8) as u16;
            self.emit_fragment(&payload[start..end], dest, protocol, id, offset, more_fragments)?;
            start = end;
        }
        Ok(())
    }

    /// Puts a bare 20 byte header in front of one fragment and hands it to the resolver.
    /// `offset` is in 8 byte units.
    pub fn emit_fragment(
        &mut self,
        payload: &[u8],
        dest: Ipv4Addr,
        protocol: IpProtocol,
        id: u16,
        offset: u16,
        more_fragments: bool,
    ) -> Result<()> {
        let header = Ipv4Header {
            src_addr: self.config.ipv4_addr,
            dest_addr: dest,
            protocol,
            identification: id,
            more_fragments,
            fragment_offset: offset,
            ttl: self.config.default_ttl,
        };
        let packet = Ipv4Packet::encap(&header, payload);
        self.stats.fragments_sent += 1;
        self.resolve_and_send(packet.into_bytes(), dest, EtherType::Ipv4)
    }
}
