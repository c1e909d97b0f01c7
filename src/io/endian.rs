// =============================================================================
// Little-Endian Helper Functions
// =============================================================================
//
// Only little-endian ("II") files are edited, so every multi-byte field in the
// header and directories goes through these helpers.

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a little-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a little-endian u64 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 8 bytes.
#[inline]
pub fn read_u64_le(bytes: &[u8]) -> u64 {
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Read a little-endian unsigned integer that is `width` bytes wide.
///
/// Widths of 1, 2, 4 and 8 are supported; anything else is read as 8 bytes.
///
/// # Panics
/// Panics if the slice is shorter than `width`.
#[inline]
pub fn read_uint_le(bytes: &[u8], width: usize) -> u64 {
    match width {
        1 => bytes[0] as u64,
        2 => read_u16_le(bytes) as u64,
        4 => read_u32_le(bytes) as u64,
        _ => read_u64_le(bytes),
    }
}

/// Encode `value` as a little-endian integer truncated to `width` bytes.
#[inline]
pub fn encode_uint_le(value: u64, width: usize) -> Vec<u8> {
    value.to_le_bytes()[..width.min(8)].to_vec()
}
