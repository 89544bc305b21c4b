//! In-memory collaborators for driving a stack from tests.

pub use self::clock::*;

pub use self::packet_collectors::*;
