//! Sector geometry and the read-side trait shared by encoder output and the
//! decoder view.
//!
//! Every image is addressed in fixed 512-byte sectors.  The last sector of an
//! image whose length is not a multiple of 512 is treated as zero-padded.

use thiserror::Error;

/// Size of one sector in bytes.  Fixed; the format has no other block size.
pub const SECTOR_SIZE: usize = 512;

/// A single sector's worth of bytes.
pub type Sector = [u8; SECTOR_SIZE];

/// Number of sectors needed to hold `len` bytes (`ceil(len / 512)`).
#[inline]
pub fn sector_count(len: usize) -> usize {
    len.div_ceil(SECTOR_SIZE)
}

/// `true` when every byte of `data` is zero.  Stops at the first non-zero byte.
#[inline]
pub fn is_empty_sector(data: &[u8]) -> bool {
    !data.iter().any(|&b| b != 0)
}

/// Copy sector `index` of `image` into `dest`, zero-padding past the end.
pub fn padded_sector(image: &[u8], index: usize, dest: &mut Sector) {
    dest.fill(0);
    let start = index.saturating_mul(SECTOR_SIZE);
    if start >= image.len() {
        return;
    }
    let end = (start + SECTOR_SIZE).min(image.len());
    dest[..end - start].copy_from_slice(&image[start..end]);
}

// ── SectorRead ───────────────────────────────────────────────────────────────

/// Whole-sector random read access.
///
/// Implementations never fail: sectors outside the represented data read back
/// as zeros, which is what a block-device layer expects from a ROM disk.
pub trait SectorRead {
    /// Number of sectors in the logical image.
    fn sector_count(&self) -> u32;

    /// Fill `dest` with the contents of `sector`.
    fn read_sector(&self, sector: u32, dest: &mut Sector);
}

// ── Verification ─────────────────────────────────────────────────────────────

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Sector {sector:#06x} differs at byte {byte} (expected {expected:#04x}, got {actual:#04x})")]
    Mismatch { sector: u32, byte: usize, expected: u8, actual: u8 },
    #[error("Sector count mismatch: image has {expected}, reader reports {actual}")]
    SectorCount { expected: u32, actual: u32 },
}

/// Compare every sector of `image` (zero-padded) against `reader`.
///
/// One sector past the end is probed as well, since reads beyond the image
/// must come back zeroed.
pub fn verify(image: &[u8], reader: &dyn SectorRead) -> Result<(), VerifyError> {
    let expected_sectors = sector_count(image.len()) as u32;
    if reader.sector_count() != expected_sectors {
        return Err(VerifyError::SectorCount {
            expected: expected_sectors,
            actual:   reader.sector_count(),
        });
    }

    let mut want = [0u8; SECTOR_SIZE];
    let mut got  = [0u8; SECTOR_SIZE];
    for sector in 0..=expected_sectors {
        padded_sector(image, sector as usize, &mut want);
        reader.read_sector(sector, &mut got);
        if let Some(byte) = want.iter().zip(got.iter()).position(|(a, b)| a != b) {
            return Err(VerifyError::Mismatch {
                sector,
                byte,
                expected: want[byte],
                actual:   got[byte],
            });
        }
    }
    Ok(())
}
