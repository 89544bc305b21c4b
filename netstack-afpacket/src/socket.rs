#![deny(missing_docs)]

use crate::sys;
use libc;
use netstack_packets::MacAddr;
use std::{
    ffi::CStr,
    io,
    mem::{self, MaybeUninit},
    ptr,
};

/// Represents an unbound `AF_PACKET` socket. At this phase of a socket's lifecycle, it can be
/// configured.
pub struct Socket {
    fd: libc::c_int,
}

/// Represents a bound `AF_PACKET` socket. At this phase of a socket's lifecycle, it can be read
/// to/written from.
pub struct BoundSocket {
    fd: libc::c_int,
    send_addr: libc::sockaddr_ll,
    hardware_addr: MacAddr,
}

/// Which way a received frame was travelling, as reported by the kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The frame arrived from the wire.
    Incoming,
    /// The frame was sent by this host, and the kernel looped a copy back to us.
    Outgoing,
}

/// Builds an `ifreq` naming `iface`, rejecting names the kernel could not hold.
fn ifreq_for(iface: &CStr) -> io::Result<sys::ifreq> {
    let name = iface.to_bytes_with_nul();
    if name.len() > libc::IFNAMSIZ {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "interface name too long",
        ));
    }
    // This block is marked as unsafe because it builds a C struct from zeroed memory, which is a
    // valid value for every member of `ifreq`. The copy stays inside both buffers, since `name`
    // was checked against IFNAMSIZ above.
    unsafe {
        let mut ifr: sys::ifreq = MaybeUninit::zeroed().assume_init();
        ptr::copy_nonoverlapping(
            name.as_ptr() as *const libc::c_char,
            ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
            name.len(),
        );
        Ok(ifr)
    }
}

impl Socket {
    /// Creates a new unbound socket.
    pub fn new() -> io::Result<Self> {
        // This block must be marked as unsafe because it uses FFI with C code. We believe the code
        // in this block to be safe because it does not interact with any memory owned by Rust
        // code, nor does it violate the invariant of the Socket type -- namely, that it return an
        // Err if it fails to initialize.
        let fd = unsafe {
            // Resources:
            // man 7 packet
            let fd = libc::socket(libc::AF_PACKET, libc::SOCK_RAW, libc::ETH_P_ALL.to_be());
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            fd
        };
        Ok(Self { fd })
    }

    /// Binds the socket to a network interface and looks up the interface's hardware address.
    /// This function consumes the `Socket` instance, as no more configuration options may be
    /// safely changed.
    pub fn bind(self, iface: impl AsRef<CStr>) -> io::Result<BoundSocket> {
        let mut ifr = ifreq_for(iface.as_ref())?;

        // This block is marked as unsafe because it uses FFI, however, we believe it to be safe
        // because it handles FFI failures in accordance with the bound API's conventions, and the
        // only Rust-owned memory it hands out is the `ifreq` and `sockaddr_ll` on this stack frame.
        let (send_addr, hardware_addr) = unsafe {
            // ioctl(SIOCGIFINDEX) fills in the index field of the ifreq object
            // Resources:
            // man 7 netdevice
            let err = libc::ioctl(self.fd, sys::SIOCGIFINDEX, &mut ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            let ifindex = ifr.ifr_ifru.ifru_ivalue;

            // SIOCGIFHWADDR reuses the same union, so the index has to be read out first
            let err = libc::ioctl(self.fd, sys::SIOCGIFHWADDR, &mut ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            let mut mac = [0u8; 6];
            for (byte, raw) in mac.iter_mut().zip(ifr.ifr_ifru.ifru_hwaddr.sa_data.iter()) {
                *byte = *raw as u8;
            }

            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_ifindex = ifindex;
            // Resources:
            // man 7 packet regarding sockaddr_ll
            let err = libc::bind(
                self.fd,
                &mut ll as *mut _ as *mut libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::c_uint,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            (ll, MacAddr::new(mac))
        };
        let fd = self.fd;
        // The file descriptor now belongs to the BoundSocket; forgetting `self` keeps its Drop
        // from closing it.
        mem::forget(self);
        Ok(BoundSocket {
            fd,
            send_addr,
            hardware_addr,
        })
    }

    /// Configures the socket's non-blocking status.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        // This block is marked as unsafe because it uses FFI, however, we assume this code to be
        // safe because we handle fcntl's failures properly. Additionally, we do not borrow any
        // Rust-owned memory.
        // Resources:
        // man 2 fcntl
        unsafe {
            let flags = libc::fcntl(self.fd, libc::F_GETFL);
            if flags < 0 {
                return Err(io::Error::last_os_error());
            }
            let new_flags = if nonblocking {
                flags | libc::O_NONBLOCK
            } else {
                flags & (!libc::O_NONBLOCK)
            };
            let err = libc::fcntl(self.fd, libc::F_SETFL, new_flags);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

impl BoundSocket {
    /// The hardware address of the interface this socket is bound to.
    pub fn hardware_addr(&self) -> MacAddr {
        self.hardware_addr
    }

    /// Sends a frame to the NIC.
    pub fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        // This block is marked as unsafe because it uses FFI. We believe this code to be safe,
        // because it safely borrows the Rust-owned frame and passes the length of the frame to the
        // libc function, so it should not exhibit any C-side undefined behaviour.
        unsafe {
            let bytes = libc::sendto(
                self.fd,
                frame.as_ptr() as *const _,
                frame.len(),
                0,
                &self.send_addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }

    /// Receives a frame from the NIC, along with the direction it was travelling in.
    pub fn recv(&mut self, frame: &mut [u8]) -> io::Result<(usize, Direction)> {
        // Note comment in `send` call.
        unsafe {
            let mut addr = MaybeUninit::<libc::sockaddr_ll>::zeroed();
            let mut addrlen = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;

            let bytes = libc::recvfrom(
                self.fd,
                frame.as_mut_ptr() as *mut _,
                frame.len(),
                0,
                addr.as_mut_ptr() as *mut libc::sockaddr,
                &mut addrlen,
            );
            if bytes < 0 {
                return Err(io::Error::last_os_error());
            }
            let direction = if addr.assume_init().sll_pkttype == sys::PACKET_OUTGOING {
                Direction::Outgoing
            } else {
                Direction::Incoming
            };
            Ok((bytes as usize, direction))
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
