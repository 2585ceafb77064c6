//! Per-sector offset table.
//!
//! In memory each entry is a [`SectorEntry`].  On the wire (generated source
//! and blobs) entries are `u16` with `0xFFFF` reserved as the empty marker, so
//! existing firmware built against the 16-bit layout keeps working.

use thiserror::Error;

use crate::sector::SECTOR_SIZE;

/// Raw table value marking a sector with no stored data.
pub const EMPTY_SECTOR: u16 = 0xFFFF;

/// Exclusive upper bound on packed stream length addressable by a raw entry.
pub const MAX_STREAM_LEN: usize = EMPTY_SECTOR as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectorEntry {
    /// All-zero sector; nothing stored.
    Empty,
    /// Byte offset of the sector's 512 bytes in the packed stream.
    Data(u16),
}

impl SectorEntry {
    /// Encode with the sentinel convention.
    #[inline]
    pub const fn to_raw(self) -> u16 {
        match self {
            SectorEntry::Empty     => EMPTY_SECTOR,
            SectorEntry::Data(off) => off,
        }
    }

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        if raw == EMPTY_SECTOR {
            SectorEntry::Empty
        } else {
            SectorEntry::Data(raw)
        }
    }

    pub fn offset(self) -> Option<usize> {
        match self {
            SectorEntry::Empty     => None,
            SectorEntry::Data(off) => Some(off as usize),
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, SectorEntry::Empty)
    }
}

/// Problems found by [`check_raw_table`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableFault {
    #[error("sector {sector:#06x} at offset {found}, expected {expected}")]
    NotContiguous { sector: usize, expected: usize, found: usize },
    #[error("sector {sector:#06x} at offset {offset} runs past the stream end")]
    OutOfStream { sector: usize, offset: usize },
    #[error("table covers {used} of {stream_len} stream bytes")]
    UnreferencedTail { used: usize, stream_len: usize },
    #[error("table ends on an empty sector")]
    TrailingEmpty,
}

/// Check a raw table against a stream of `stream_len` bytes.
///
/// Data entries must start at 0 and advance by exactly one sector, every
/// window must lie inside the stream, the stream must be fully referenced,
/// and the table must end on a data entry.
pub fn check_raw_table(raw: &[u16], stream_len: usize) -> Result<(), TableFault> {
    let mut expected = 0usize;
    for (sector, &value) in raw.iter().enumerate() {
        let Some(found) = SectorEntry::from_raw(value).offset() else { continue };
        if found != expected {
            return Err(TableFault::NotContiguous { sector, expected, found });
        }
        if found + SECTOR_SIZE > stream_len {
            return Err(TableFault::OutOfStream { sector, offset: found });
        }
        expected += SECTOR_SIZE;
    }
    if expected != stream_len {
        return Err(TableFault::UnreferencedTail { used: expected, stream_len });
    }
    if raw.last() == Some(&EMPTY_SECTOR) {
        return Err(TableFault::TrailingEmpty);
    }
    Ok(())
}
