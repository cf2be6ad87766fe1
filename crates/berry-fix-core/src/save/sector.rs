//! Sector image and footer codec.

use crate::layout::{
    ChunkId, FOOTER_CHECKSUM_OFFSET, FOOTER_COUNTER_OFFSET, FOOTER_ID_OFFSET, SECTOR_DATA_SIZE,
    SECTOR_SECURITY_NUM, SECTOR_SECURITY_OFFSET, SECTOR_SIZE,
};

/// Fold checksum over the first `size` bytes of `data`.
///
/// Sums whole little-endian words only, so a trailing 1-3 bytes never
/// contribute. The 32-bit sum is folded as `(sum >> 16) + sum` and truncated
/// to 16 bits with no end-around carry. Persisted saves depend on both quirks.
pub fn checksum(data: &[u8], size: usize) -> u16 {
    let size = size.min(data.len());
    let sum = data[..size]
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .fold(0u32, u32::wrapping_add);

    ((sum >> 16).wrapping_add(sum)) as u16
}

/// The 12 used footer bytes of a sector.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Footer {
    pub id: ChunkId,
    pub checksum: u16,
    pub security: u32,
    pub counter: u32,
}

impl Footer {
    /// Footer for `data` written as chunk `id` in generation `counter`.
    pub fn for_chunk(id: ChunkId, counter: u32, data: &[u8]) -> Self {
        Self {
            id,
            checksum: checksum(data, data.len()),
            security: SECTOR_SECURITY_NUM,
            counter,
        }
    }

    pub fn decode(image: &[u8; SECTOR_SIZE]) -> Self {
        let u16_at = |at: usize| u16::from_le_bytes([image[at], image[at + 1]]);
        let u32_at = |at: usize| {
            u32::from_le_bytes([image[at], image[at + 1], image[at + 2], image[at + 3]])
        };

        Self {
            id: u16_at(FOOTER_ID_OFFSET),
            checksum: u16_at(FOOTER_CHECKSUM_OFFSET),
            security: u32_at(SECTOR_SECURITY_OFFSET),
            counter: u32_at(FOOTER_COUNTER_OFFSET),
        }
    }

    pub fn encode(&self, image: &mut [u8; SECTOR_SIZE]) {
        image[FOOTER_ID_OFFSET..FOOTER_ID_OFFSET + 2].copy_from_slice(&self.id.to_le_bytes());
        image[FOOTER_CHECKSUM_OFFSET..FOOTER_CHECKSUM_OFFSET + 2]
            .copy_from_slice(&self.checksum.to_le_bytes());
        image[SECTOR_SECURITY_OFFSET..SECTOR_SECURITY_OFFSET + 4]
            .copy_from_slice(&self.security.to_le_bytes());
        image[FOOTER_COUNTER_OFFSET..FOOTER_COUNTER_OFFSET + 4]
            .copy_from_slice(&self.counter.to_le_bytes());
    }

    /// Security field carries the engine magic.
    pub const fn is_authentic(&self) -> bool {
        self.security == SECTOR_SECURITY_NUM
    }
}

/// Read/write scratch sector owned by the save engine.
#[derive(Clone)]
pub struct SectorBuffer {
    bytes: [u8; SECTOR_SIZE],
}

impl Default for SectorBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SectorBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SectorBuffer")
            .field("footer", &self.footer())
            .finish()
    }
}

impl SectorBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: [0u8; SECTOR_SIZE],
        }
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    pub fn as_bytes(&self) -> &[u8; SECTOR_SIZE] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; SECTOR_SIZE] {
        &mut self.bytes
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes[..SECTOR_DATA_SIZE]
    }

    pub fn footer(&self) -> Footer {
        Footer::decode(&self.bytes)
    }

    /// Rebuilds the image: zero fill, copy `data`, stamp the footer.
    ///
    /// `data` longer than a sector payload is cut at [`SECTOR_DATA_SIZE`].
    pub fn stamp(&mut self, id: ChunkId, counter: u32, data: &[u8]) -> Footer {
        let len = data.len().min(SECTOR_DATA_SIZE);
        self.clear();
        self.bytes[..len].copy_from_slice(&data[..len]);

        let footer = Footer::for_chunk(id, counter, &data[..len]);
        footer.encode(&mut self.bytes);
        footer
    }

    /// Checksum of the payload bounded by the owning chunk's size.
    pub fn payload_checksum(&self, size: usize) -> u16 {
        checksum(self.data(), size)
    }
}
