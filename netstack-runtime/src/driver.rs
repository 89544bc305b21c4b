use std::io;

/// The link below the stack: something that moves whole Ethernet frames.
///
/// `receive` must not block waiting for traffic. It fills `buf` with at most one frame and
/// returns its length, or 0 when nothing is waiting. Frames longer than `buf` may be truncated.
pub trait Driver: Send {
    fn transmit(&mut self, frame: &[u8]) -> io::Result<()>;

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn transmit(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).transmit(frame)
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).receive(buf)
    }
}
