//! Host/network byte-order conversion
//!
//! The network representation is big-endian. Conversions are no-ops on a
//! big-endian host and byte swaps everywhere else; the host order is
//! probed instead of assumed.

/// Byte order of a CPU or a wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// Probes the byte order of the running host
    pub fn host() -> Self {
        if u16::from_ne_bytes([0x12, 0x34]) == 0x1234 {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Returns true when the host stores the most significant byte first
pub fn host_is_big_endian() -> bool {
    Endianness::host() == Endianness::Big
}

/// Converts a 16-bit value from host to network order
pub fn to_network_16(value: u16) -> u16 {
    if host_is_big_endian() {
        value
    } else {
        value.swap_bytes()
    }
}

/// Converts a 32-bit value from host to network order
pub fn to_network_32(value: u32) -> u32 {
    if host_is_big_endian() {
        value
    } else {
        value.swap_bytes()
    }
}

/// Converts a 16-bit value from network to host order
pub fn to_host_16(value: u16) -> u16 {
    // The swap is its own inverse.
    to_network_16(value)
}

/// Converts a 32-bit value from network to host order
pub fn to_host_32(value: u32) -> u32 {
    to_network_32(value)
}

/// Writes `value` big-endian at `buf[offset..offset + 2]`
///
/// # Panics
///
/// Panics if the buffer is too short.
pub fn write_u16_be(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&to_network_16(value).to_ne_bytes());
}

/// Writes `value` big-endian at `buf[offset..offset + 4]`
///
/// # Panics
///
/// Panics if the buffer is too short.
pub fn write_u32_be(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&to_network_32(value).to_ne_bytes());
}

/// Reads a big-endian `u16` at `offset`, or `None` if out of range
pub fn read_u16_be(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset.checked_add(2)?)?;
    Some(to_host_16(u16::from_ne_bytes([bytes[0], bytes[1]])))
}

/// Reads a big-endian `u32` at `offset`, or `None` if out of range
pub fn read_u32_be(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(to_host_32(u32::from_ne_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3],
    ])))
}
