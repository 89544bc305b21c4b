use super::StackCore;
use crate::error::Result;
use crate::stats::DropReason;
use netstack_packets::{IcmpMessage, IcmpType, IpProtocol, UnreachableCode};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use tracing::debug;

impl StackCore {
    /// Answers echo requests. Every other ICMP message is dropped.
    pub fn handle_icmp(&mut self, payload: Vec<u8>, source: Ipv4Addr) -> Result<()> {
        let message = match IcmpMessage::try_from(payload) {
            Ok(message) => message,
            Err(_) => {
                self.discard(DropReason::TruncatedIcmp);
                return Ok(());
            }
        };

        match (message.icmp_type(), message.code()) {
            (IcmpType::EchoRequest, 0) => {
                let reply = IcmpMessage::echo_reply_from(&message);
                debug!(
                    %source,
                    identifier = reply.identifier(),
                    sequence = reply.sequence(),
                    "answering echo request"
                );
                self.send_datagram(reply.as_bytes(), source, IpProtocol::ICMP)?;
                self.stats.echo_replies_sent += 1;
            }
            _ => self.discard(DropReason::UnhandledIcmp),
        }
        Ok(())
    }

    /// Tells `source` that `original` couldn't be delivered, quoting its header and the first
    /// 8 bytes of its payload.
    pub fn send_unreachable(
        &mut self,
        original: &[u8],
        source: Ipv4Addr,
        code: UnreachableCode,
    ) -> Result<()> {
        let message = IcmpMessage::destination_unreachable(code, original);
        debug!(%source, ?code, "sending destination unreachable");
        self.send_datagram(message.as_bytes(), source, IpProtocol::ICMP)?;
        self.stats.unreachables_sent += 1;
        Ok(())
    }
}
