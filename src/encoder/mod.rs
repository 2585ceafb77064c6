//! Build-time encoder: raw image in, offset table and packed stream out.
//!
//! # Layout
//! The image is cut into 512-byte sectors (the tail is zero-padded).  All-zero
//! sectors are dropped; every other sector is appended to the packed stream in
//! index order and its stream offset is recorded in the table.  The table
//! stops at the last populated sector, so trailing empty sectors cost nothing.
//!
//! # Capacity
//! Table entries are 16 bits wide with `0xFFFF` reserved, so the stream must
//! stay strictly below 65535 bytes.  A sector whose 512-byte window would
//! reach that limit aborts the encode with [`EncodeError::CapacityExceeded`];
//! in practice at most 127 populated sectors fit.  The older Python
//! generator only checked the start offset and so accepted a 128th sector;
//! images relying on that no longer encode.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::decoder::SparseView;
use crate::sector::{is_empty_sector, sector_count, Sector, SectorRead, SECTOR_SIZE};
use crate::table::{SectorEntry, MAX_STREAM_LEN};

// ── Options ──────────────────────────────────────────────────────────────────

/// Configuration for [`encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Exclusive upper bound on the packed stream length.  Clamped to the
    /// 16-bit table limit; lowering it reserves ROM for other data.
    pub capacity: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { capacity: MAX_STREAM_LEN }
    }
}

impl EncodeOptions {
    fn effective_capacity(&self) -> usize {
        self.capacity.min(MAX_STREAM_LEN)
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Packed stream too big: sector {sector:#06x} would end at byte {end}, limit is {limit}")]
    CapacityExceeded { sector: usize, end: usize, limit: usize },
    #[error("Image has {0} sectors, more than a 32-bit sector index can address")]
    TooManySectors(usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── SparseImage ──────────────────────────────────────────────────────────────

/// Encoded form of an image.  Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseImage {
    total_sectors: u32,
    entries:       Vec<SectorEntry>,
    raw_offsets:   Vec<u16>,
    stream:        Vec<u8>,
}

impl SparseImage {
    /// Assemble from parts already known to satisfy the table invariants.
    pub(crate) fn from_parts(total_sectors: u32, raw_offsets: Vec<u16>, stream: Vec<u8>) -> Self {
        let entries = raw_offsets.iter().copied().map(SectorEntry::from_raw).collect();
        Self { total_sectors, entries, raw_offsets, stream }
    }

    /// Sector count of the padded source image.
    pub fn total_sectors(&self) -> u32 { self.total_sectors }

    /// Table length: one past the last populated sector.
    pub fn data_sectors(&self) -> usize { self.entries.len() }

    pub fn populated_sectors(&self) -> usize { self.stream.len() / SECTOR_SIZE }

    pub fn entries(&self) -> &[SectorEntry] { &self.entries }

    /// Table in the sentinel encoding used by generated code and blobs.
    pub fn raw_offsets(&self) -> &[u16] { &self.raw_offsets }

    pub fn stream(&self) -> &[u8] { &self.stream }

    pub fn view(&self) -> SparseView<'_> {
        SparseView::new(self.total_sectors, &self.raw_offsets, &self.stream)
    }

    /// CRC-32 of the packed stream.
    pub fn stream_crc32(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.stream);
        hasher.finalize()
    }

    /// Rebuild the zero-padded source image, `total_sectors * 512` bytes.
    pub fn expand(&self) -> Vec<u8> {
        let view = self.view();
        let mut out = Vec::with_capacity(self.total_sectors as usize * SECTOR_SIZE);
        let mut buf: Sector = [0u8; SECTOR_SIZE];
        for sector in 0..self.total_sectors {
            view.fetch_sector(sector, &mut buf);
            out.extend_from_slice(&buf);
        }
        out
    }

    pub fn summary(&self) -> ImageSummary {
        let table_bytes = self.raw_offsets.len() * std::mem::size_of::<u16>();
        ImageSummary {
            total_sectors:     self.total_sectors,
            data_sectors:      self.data_sectors(),
            populated_sectors: self.populated_sectors(),
            empty_sectors:     self.total_sectors as usize - self.populated_sectors(),
            image_bytes:       self.total_sectors as u64 * SECTOR_SIZE as u64,
            stream_len:        self.stream.len(),
            table_bytes,
            stored_bytes:      self.stream.len() + table_bytes,
            stream_crc32:      hex::encode(self.stream_crc32().to_be_bytes()),
        }
    }
}

impl SectorRead for SparseImage {
    fn sector_count(&self) -> u32 { self.total_sectors }

    fn read_sector(&self, sector: u32, dest: &mut Sector) {
        self.view().fetch_sector(sector, dest)
    }
}

/// Size report printed by `romdisk --info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub total_sectors:     u32,
    pub data_sectors:      usize,
    pub populated_sectors: usize,
    pub empty_sectors:     usize,
    pub image_bytes:       u64,
    pub stream_len:        usize,
    pub table_bytes:       usize,
    /// Stream plus table: what the firmware actually stores.
    pub stored_bytes:      usize,
    pub stream_crc32:      String,
}

// ── Encoding ─────────────────────────────────────────────────────────────────

pub fn encode(image: &[u8], opts: &EncodeOptions) -> Result<SparseImage, EncodeError> {
    let sectors = sector_count(image.len());
    let total_sectors = u32::try_from(sectors)
        .map_err(|_| EncodeError::TooManySectors(sectors))?;
    let limit = opts.effective_capacity();

    let mut raw_offsets = Vec::new();
    let mut stream = Vec::new();
    let mut full_count = 0usize;
    let mut sector_buf = [0u8; SECTOR_SIZE];

    for (index, chunk) in image.chunks(SECTOR_SIZE).enumerate() {
        if is_empty_sector(chunk) {
            raw_offsets.push(SectorEntry::Empty.to_raw());
            continue;
        }

        let offset = stream.len();
        let end = offset + SECTOR_SIZE;
        if end >= limit {
            return Err(EncodeError::CapacityExceeded { sector: index, end, limit });
        }
        debug!(sector = index, offset, "packing sector");

        // Only the final chunk can be short; pad it out.
        sector_buf.fill(0);
        sector_buf[..chunk.len()].copy_from_slice(chunk);
        stream.extend_from_slice(&sector_buf);

        raw_offsets.push(SectorEntry::Data(offset as u16).to_raw());
        full_count = index + 1;
    }

    if full_count < sectors {
        debug!(dropped = sectors - full_count, "trailing empty sectors not stored");
    }
    raw_offsets.truncate(full_count);

    let image = SparseImage::from_parts(total_sectors, raw_offsets, stream);
    info!(
        total_sectors = image.total_sectors(),
        data_sectors = image.data_sectors(),
        stream_len = image.stream().len(),
        "encoded image"
    );
    Ok(image)
}

pub fn encode_reader<R: Read>(mut reader: R, opts: &EncodeOptions) -> Result<SparseImage, EncodeError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    encode(&data, opts)
}

pub fn encode_file<P: AsRef<Path>>(path: P, opts: &EncodeOptions) -> Result<SparseImage, EncodeError> {
    encode_reader(File::open(path)?, opts)
}
