//! The 16 bit one's complement checksum shared by the IPv4 header and ICMP messages (RFC 1071).

/// Folds the carries of a 32 bit accumulator back into 16 bits.
fn fold(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// One's complement sum of the big endian 16 bit words in `data`. A trailing odd byte is
/// treated as the high byte of a zero padded word.
pub fn ones_complement_sum(data: &[u8]) -> u16 {
    let mut chunks = data.chunks_exact(2);
    let mut sum = (&mut chunks).fold(0u32, |acc, word| {
        acc + u32::from(u16::from_be_bytes([word[0], word[1]]))
    });
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    fold(sum)
}

/// The value to store in a checksum field, computed with that field zeroed.
pub fn internet_checksum(data: &[u8]) -> u16 {
    !ones_complement_sum(data)
}

/// A buffer whose checksum field already holds the correct value sums to `0xFFFF`.
pub fn verify(data: &[u8]) -> bool {
    ones_complement_sum(data) == 0xFFFF
}
