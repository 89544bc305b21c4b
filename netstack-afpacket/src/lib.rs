//! Linux `AF_PACKET` link driver for the netstack runtime.
//!
//! [`AfPacketDriver`] binds a raw socket to one interface and hands whole Ethernet frames to and
//! from a `NetStack`. Opening the socket needs `CAP_NET_RAW`.
#![cfg(target_os = "linux")]
mod socket;
mod sys;

pub use socket::{BoundSocket, Direction, Socket};

use netstack_packets::MacAddr;
use netstack_runtime::driver::Driver;
use std::ffi::CString;
use std::io;
use tracing::trace;

/// Non-blocking raw socket driver. `receive` returns 0 when the interface has nothing queued, so
/// the stack's poll loop never stalls on it.
pub struct AfPacketDriver {
    socket: BoundSocket,
}

impl AfPacketDriver {
    pub fn open(iface: &str) -> io::Result<Self> {
        let name = CString::new(iface)?;
        let mut socket = Socket::new()?;
        socket.set_nonblocking(true)?;
        Ok(AfPacketDriver {
            socket: socket.bind(&name)?,
        })
    }

    /// The MAC address the kernel reports for the bound interface.
    pub fn hardware_addr(&self) -> MacAddr {
        self.socket.hardware_addr()
    }
}

impl Driver for AfPacketDriver {
    fn transmit(&mut self, frame: &[u8]) -> io::Result<()> {
        let sent = self.socket.send(frame)?;
        if sent != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, frame.len()),
            ));
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.socket.recv(buf) {
                Ok((len, Direction::Outgoing)) => trace!(len, "skipping our own frame"),
                Ok((len, Direction::Incoming)) => return Ok(len),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(0),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}
