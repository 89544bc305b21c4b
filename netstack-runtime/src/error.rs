//! Error types for stack operations.
//!
//! Malformed or unwanted input is never an error: it is dropped, logged and counted in
//! `StackStats`. Errors are reserved for the host side: a driver that fails, a configuration
//! that can't work, or a send that can't be expressed on the wire.

use crate::config::ConfigError;
use netstack_packets::IpProtocol;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StackError>;

#[derive(Debug, Error)]
pub enum StackError {
    /// The link driver failed to transmit or receive.
    #[error("Link driver failed: {0}")]
    Driver(#[from] io::Error),

    #[error("Invalid stack configuration: {0}")]
    Config(#[from] ConfigError),

    /// More payload than the 13 bit fragment offset can place.
    #[error("Payload of {0} bytes cannot be carried in one datagram")]
    PayloadTooLarge(usize),

    /// ICMP is answered by the stack itself and can't be claimed by an upper layer.
    #[error("Protocol {0:?} is handled by the stack")]
    ProtocolReserved(IpProtocol),

    /// The task that owned the stack has exited.
    #[error("Stack runner is no longer running")]
    RunnerStopped,
}

impl StackError {
    pub fn is_driver(&self) -> bool {
        matches!(self, StackError::Driver(_))
    }
}
