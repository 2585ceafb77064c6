//! Read-side runtime over packed tables.
//!
//! [`SparseView`] borrows an offset table and packed stream (normally the
//! `static` arrays produced by the emitter) and answers byte and sector reads.
//! Both reads are total: anything outside the stored data is zero.  Neither
//! allocates, locks, or keeps state, so a `static` view can be shared by an
//! interrupt handler and the main loop without synchronisation.
//!
//! ```
//! use romdisk::decoder::SparseView;
//! use romdisk::table::EMPTY_SECTOR;
//!
//! static OFFSETS: [u16; 2] = [EMPTY_SECTOR, 0];
//! static STREAM: [u8; 512] = [0x01; 512];
//! static DISK: SparseView<'static> = SparseView::new(3, &OFFSETS, &STREAM);
//!
//! let mut sector = [0xFFu8; 512];
//! DISK.fetch_sector(1, &mut sector);
//! assert_eq!(sector, [0x01; 512]);
//! assert_eq!(DISK.fetch_byte(0), 0);
//! ```

use crate::sector::{Sector, SectorRead, SECTOR_SIZE};
use crate::table::EMPTY_SECTOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseView<'a> {
    total_sectors: u32,
    offsets:       &'a [u16],
    stream:        &'a [u8],
}

impl<'a> SparseView<'a> {
    /// `offsets` uses the raw sentinel encoding; its length is the data
    /// sector count.  `total_sectors` is the size of the original image.
    pub const fn new(total_sectors: u32, offsets: &'a [u16], stream: &'a [u8]) -> Self {
        Self { total_sectors, offsets, stream }
    }

    pub const fn total_sectors(&self) -> u32 { self.total_sectors }

    /// Sectors covered by the table; everything at or past this index is empty.
    pub const fn data_sectors(&self) -> usize { self.offsets.len() }

    pub const fn offsets(&self) -> &'a [u16] { self.offsets }

    pub const fn stream(&self) -> &'a [u8] { self.stream }

    #[inline]
    fn stream_offset(&self, sector: u32) -> Option<usize> {
        match self.offsets.get(sector as usize) {
            Some(&raw) if raw != EMPTY_SECTOR => Some(raw as usize),
            _ => None,
        }
    }

    /// Byte at absolute `offset` in the logical image.
    #[inline]
    pub fn fetch_byte(&self, offset: u32) -> u8 {
        let sector = offset / SECTOR_SIZE as u32;
        match self.stream_offset(sector) {
            Some(base) => self.stream
                .get(base + (offset as usize % SECTOR_SIZE))
                .copied()
                .unwrap_or(0),
            None => 0,
        }
    }

    /// Write exactly one sector into `dest`.
    pub fn fetch_sector(&self, sector: u32, dest: &mut Sector) {
        let window = self.stream_offset(sector)
            .and_then(|base| self.stream.get(base..base + SECTOR_SIZE));
        match window {
            Some(src) => dest.copy_from_slice(src),
            None      => dest.fill(0),
        }
    }
}

impl SectorRead for SparseView<'_> {
    fn sector_count(&self) -> u32 { self.total_sectors }

    fn read_sector(&self, sector: u32, dest: &mut Sector) {
        self.fetch_sector(sector, dest)
    }
}
