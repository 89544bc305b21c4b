mod runner;
pub use self::runner::*;

pub mod test;
