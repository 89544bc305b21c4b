mod validate_arp;
pub use self::validate_arp::*;

mod validate_ipv4;
pub use self::validate_ipv4::*;

pub trait Processor {
    type Input: Send + Clone;
    type Output: Send + Clone;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output>;
}
