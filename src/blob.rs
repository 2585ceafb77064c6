//! Binary container for a packed image.
//!
//! All fields are little-endian:
//!
//! ```text
//! 0   magic          b"RDSK"
//! 4   version        u16   (1)
//! 6   sector_size    u16   (512)
//! 8   total_sectors  u32
//! 12  data_sectors   u32   table entries that follow
//! 16  stream_len     u32
//! 20  stream_crc32   u32   CRC-32 of the stream bytes
//! 24  offsets        u16 x data_sectors, 0xFFFF = empty
//! ..  stream         stream_len bytes
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

use crate::encoder::SparseImage;
use crate::sector::SECTOR_SIZE;
use crate::table::{check_raw_table, MAX_STREAM_LEN};

pub const BLOB_MAGIC: &[u8; 4] = b"RDSK";
pub const BLOB_VERSION: u16 = 1;
pub const BLOB_HEADER_SIZE: usize = 24;

const MAX_PRESIZE_ENTRIES: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Invalid magic number")]
    InvalidMagic,
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u16),
    #[error("Unsupported sector size: {0}")]
    SectorSize(u16),
    #[error("Stream checksum mismatch (stored {stored:08x}, computed {computed:08x})")]
    ChecksumMismatch { stored: u32, computed: u32 },
    #[error("Corrupt offset table: {0}")]
    CorruptTable(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub fn write_blob<W: Write>(image: &SparseImage, mut writer: W) -> Result<(), BlobError> {
    writer.write_all(BLOB_MAGIC)?;
    writer.write_u16::<LittleEndian>(BLOB_VERSION)?;
    writer.write_u16::<LittleEndian>(SECTOR_SIZE as u16)?;
    writer.write_u32::<LittleEndian>(image.total_sectors())?;
    writer.write_u32::<LittleEndian>(image.data_sectors() as u32)?;
    writer.write_u32::<LittleEndian>(image.stream().len() as u32)?;
    writer.write_u32::<LittleEndian>(image.stream_crc32())?;
    for &raw in image.raw_offsets() {
        writer.write_u16::<LittleEndian>(raw)?;
    }
    writer.write_all(image.stream())?;
    Ok(())
}

pub fn read_blob<R: Read>(mut reader: R) -> Result<SparseImage, BlobError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != BLOB_MAGIC {
        return Err(BlobError::InvalidMagic);
    }
    let version = reader.read_u16::<LittleEndian>()?;
    if version != BLOB_VERSION {
        return Err(BlobError::UnsupportedVersion(version));
    }
    let sector_size = reader.read_u16::<LittleEndian>()?;
    if sector_size as usize != SECTOR_SIZE {
        return Err(BlobError::SectorSize(sector_size));
    }
    let total_sectors = reader.read_u32::<LittleEndian>()?;
    let data_sectors  = reader.read_u32::<LittleEndian>()?;
    let stream_len    = reader.read_u32::<LittleEndian>()? as usize;
    let stored_crc    = reader.read_u32::<LittleEndian>()?;

    if data_sectors > total_sectors {
        return Err(BlobError::CorruptTable(format!(
            "{data_sectors} table entries for a {total_sectors}-sector image"
        )));
    }
    if stream_len >= MAX_STREAM_LEN {
        return Err(BlobError::CorruptTable(format!("stream length {stream_len} out of range")));
    }

    // Header counts are untrusted until the table checks pass.
    let mut raw_offsets = Vec::with_capacity((data_sectors as usize).min(MAX_PRESIZE_ENTRIES));
    for _ in 0..data_sectors {
        raw_offsets.push(reader.read_u16::<LittleEndian>()?);
    }
    let mut stream = vec![0u8; stream_len];
    reader.read_exact(&mut stream)?;

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&stream);
    let computed = hasher.finalize();
    if computed != stored_crc {
        return Err(BlobError::ChecksumMismatch { stored: stored_crc, computed });
    }
    check_raw_table(&raw_offsets, stream_len)
        .map_err(|fault| BlobError::CorruptTable(fault.to_string()))?;

    Ok(SparseImage::from_parts(total_sectors, raw_offsets, stream))
}
