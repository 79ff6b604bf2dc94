/// Computes the 8-bit checksum the servo firmware expects at the end of every
/// frame: the arithmetic sum of the raw CAN identifier and every payload byte,
/// truncated to its low 8 bits.
///
/// The identifier enters the sum as a plain 32-bit value, so identifiers above
/// 0xFF contribute only their low byte to the result.
pub fn checksum(identifier: u32, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(identifier, |sum, byte| sum.wrapping_add(*byte as u32)) as u8
}

#[cfg(test)]
mod tests {
    use super::checksum;

    #[test]
    fn known_vectors() {
        assert_eq!(checksum(0x01, &[0x30]), 0x31);
        assert_eq!(checksum(0x01, &[0x83, 0x01, 0xF4]), 0x79);
        assert_eq!(checksum(0x00, &[]), 0x00);
        assert_eq!(checksum(0xFF, &[]), 0xFF);
    }

    #[test]
    fn identifier_is_summed_not_xored() {
        // 0x7F ^ 0x81 would be 0xFE
        assert_eq!(checksum(0x7F, &[0x81]), 0x00);
        assert_eq!(checksum(0x7FF, &[0x01]), 0x00);
        assert_eq!(checksum(0x1FFF_FFFF, &[0xFF; 8]), 0xF7);
    }

    #[test]
    fn matches_modular_sum() {
        let payloads: [&[u8]; 4] = [
            &[0xFD, 0x81, 0x2C, 0x02, 0x00, 0x0C, 0x80],
            &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
            &[0x00, 0x00],
            &[0x94, 0x12, 0x34, 0x56, 0x78, 0x03, 0xE8],
        ];

        for id in [0x00u32, 0x01, 0x20, 0x7FF, 0x1234_5678] {
            for payload in payloads {
                let expected =
                    (id as u64 + payload.iter().map(|b| *b as u64).sum::<u64>()) % 256;

                assert_eq!(checksum(id, payload) as u64, expected);
            }
        }
    }
}
