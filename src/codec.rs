//! Field readers for response layouts. Callers check the frame length before
//! reading, so every range here is in bounds.

/* Encoding */

/// Packs a direction flag into bit 7 and the top nibble of a 12-bit speed into
/// bits 0..=3. Returns the packed byte followed by the low speed byte.
pub fn pack_direction_speed(counter_clockwise: bool, speed: u16) -> [u8; 2] {
    let direction = if counter_clockwise { 0x80 } else { 0x00 };

    [direction | ((speed >> 8) & 0x0F) as u8, speed as u8]
}

/// Lowest 24 bits of a value, most significant byte first
pub fn u24_to_be_bytes(value: u32) -> [u8; 3] {
    let [_, high, mid, low] = value.to_be_bytes();

    [high, mid, low]
}

/* Decoding */

pub fn be_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

pub fn be_i16(bytes: &[u8], at: usize) -> i16 {
    i16::from_be_bytes([bytes[at], bytes[at + 1]])
}

pub fn be_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Reads a 48-bit two's complement field into an `i64`
pub fn be_i48(bytes: &[u8], at: usize) -> i64 {
    let value = bytes[at..at + 6]
        .iter()
        .fold(0i64, |value, byte| (value << 8) | *byte as i64);

    sign_extend(value, 48)
}

/// Extends a `bits`-wide two's complement value held in the low bits of an
/// `i64`: every bit above the field is set to the field's top bit.
///
/// A zero-width field is 0. Widths of 64 or more leave `value` unchanged.
pub const fn sign_extend(value: i64, bits: u32) -> i64 {
    match bits {
        0 => 0,
        64.. => value,
        _ => {
            let mask = ((1u64 << bits) - 1) as i64;
            let sign_bit = 1i64 << (bits - 1);

            if value & sign_bit != 0 {
                value | !mask
            } else {
                value & mask
            }
        }
    }
}
