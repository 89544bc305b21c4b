/// Configuration of a stack instance: who the host is and how big its tables are.
pub mod config;

pub mod error;
pub use self::error::{Result, StackError};

mod stats;
pub use self::stats::*;

/// Traits for the collaborators a stack is built around.
pub mod clock;
pub mod driver;

/// Processors take a packet by value and either hand it on or drop it by returning None. The
/// stack strings its validation stages together from processors, so each check lives, and is
/// tested, on its own.
pub mod processor;

/// Classifiers look at a packet without changing it and decide which layer or handler gets it
/// next.
pub mod classifier;

/// The resolver's address cache and its pending packet slot.
pub mod state;

/// The four layers and the context object they share. `NetStack` is the place to start.
pub mod stack;
pub use self::stack::{Delivery, NetStack, StackCore, UpperLayer};

/// Running a stack on a tokio task, reached through cloneable handles.
pub mod pipeline;

/// Utility module
pub mod utils;
