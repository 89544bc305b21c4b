//! # What are they for?
//!
//! Classifiers are very similar to processors, but are used to differentiate a stream of packets.
//! As such, they take each packet by reference, and are not able to modify it. They generally
//! return an Enum naming the layer or handler the packet belongs to; the caller then moves the
//! packet there.
mod ether_type;
pub use self::ether_type::*;

mod ip_protocol;
pub use self::ip_protocol::*;

/// Used by the stack to determine the kind of packet we have. Classifier::Class is then
/// matched on to send it down the appropriate path.
pub trait Classifier {
    type Packet: Send + Clone;
    type Class: Sized;

    fn classify(&self, packet: &Self::Packet) -> Self::Class;
}
