//! # What are they?
//!
//! A pipeline runs a stack on its own tokio task. The task owns the `NetStack` outright and polls
//! its driver on an interval. Every other request arrives over a channel from any number of
//! `StackHandle`s, so the stack state only ever sees one caller at a time.

mod runner;
pub use self::runner::*;
