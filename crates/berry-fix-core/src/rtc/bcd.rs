//! Binary-coded decimal helpers for clock register values.

/// Decoded value of a byte that is not valid BCD.
pub const INVALID: u8 = 0xFF;

/// `0x42` -> `42`. Any invalid digit decodes to [`INVALID`].
#[inline]
pub const fn to_binary(bcd: u8) -> u8 {
    if bcd >= 0xA0 || (bcd & 0x0F) >= 10 {
        return INVALID;
    }
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// `42` -> `0x42`. Values above 99 encode to [`INVALID`].
#[inline]
pub const fn from_binary(value: u8) -> u8 {
    if value > 99 {
        return INVALID;
    }
    ((value / 10) << 4) | (value % 10)
}

/// Adds one in decimal. Invalid input stays [`INVALID`], and so does `0x99`.
#[inline]
pub const fn increment(bcd: u8) -> u8 {
    match to_binary(bcd) {
        INVALID => INVALID,
        value => from_binary(value + 1),
    }
}
