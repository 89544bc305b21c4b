use super::{Delivery, StackCore};
use crate::classifier::{Classifier, EtherTypeClassifier};
use crate::error::Result;
use crate::stats::DropReason;
use netstack_packets::{EtherType, EthernetFrame, MacAddr};
use tracing::trace;

impl StackCore {
    /// Strips the envelope from a received frame and hands the payload to the resolver or the
    /// datagram layer. Anything else is dropped.
    pub fn decode_and_dispatch(&mut self, frame: Vec<u8>) -> Result<Option<Delivery>> {
        self.stats.frames_received += 1;
        let frame = match EthernetFrame::from_buffer(frame) {
            Ok(frame) => frame,
            Err(_) => {
                self.discard(DropReason::RuntFrame);
                return Ok(None);
            }
        };

        match EtherTypeClassifier::new().classify(&frame) {
            EtherType::Arp => {
                self.handle_arp(frame.into_payload())?;
                Ok(None)
            }
            EtherType::Ipv4 => self.receive_datagram(frame.into_payload()),
            EtherType::Other(ether_type) => {
                trace!(ether_type, src = %frame.src_mac(), "ignoring frame");
                self.discard(DropReason::UnknownEtherType);
                Ok(None)
            }
        }
    }

    /// Wraps `payload` in an envelope from us to `dest` and transmits it.
    pub fn encode_and_send(
        &mut self,
        payload: &[u8],
        dest: MacAddr,
        ether_type: EtherType,
    ) -> Result<()> {
        let frame = EthernetFrame::encap(payload, dest, self.config.mac_addr, ether_type);
        trace!(%dest, ?ether_type, len = frame.data.len(), "transmitting frame");
        self.driver.transmit(&frame.data)?;
        self.stats.frames_sent += 1;
        Ok(())
    }
}
