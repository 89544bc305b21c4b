#![allow(non_camel_case_types)]

use libc;

pub(crate) const SIOCGIFHWADDR: libc::c_ulong = 0x8927;
pub(crate) const SIOCGIFINDEX: libc::c_ulong = 0x8933;

/// `sll_pkttype` of frames this host sent itself.
pub(crate) const PACKET_OUTGOING: libc::c_uchar = 4;

#[repr(C)]
pub(crate) union ifru {
    pub(crate) ifru_hwaddr: libc::sockaddr,
    pub(crate) ifru_ivalue: libc::c_int,
    // Keeps the union at its kernel size; the largest member is `struct ifmap`
    pub(crate) _ifru_pad: [u8; 24],
}

#[repr(C)]
pub(crate) union ifrn {
    pub(crate) ifrn_name: [libc::c_char; libc::IFNAMSIZ],
}

#[repr(C)]
pub(crate) struct ifreq {
    pub(crate) ifr_ifrn: ifrn,
    pub(crate) ifr_ifru: ifru,
}
