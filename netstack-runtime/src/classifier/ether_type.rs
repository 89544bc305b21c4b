use crate::classifier::Classifier;
use netstack_packets::{EtherType, EthernetFrame};

/// Sorts frames by the protocol their envelope says they carry.
#[derive(Default, Clone)]
pub struct EtherTypeClassifier {}

impl EtherTypeClassifier {
    pub fn new() -> EtherTypeClassifier {
        EtherTypeClassifier {}
    }
}

impl Classifier for EtherTypeClassifier {
    type Packet = EthernetFrame;
    type Class = EtherType;

    fn classify(&self, frame: &Self::Packet) -> Self::Class {
        frame.ether_type()
    }
}
