//! Mutable state owned by a stack instance.

mod arp_cache;
pub use self::arp_cache::*;

mod pending;
pub use self::pending::*;
