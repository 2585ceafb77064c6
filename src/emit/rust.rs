//! Rust module generator.
//!
//! Produces plain `static` tables and two free functions that use nothing
//! beyond `core`, so the output can be `include!`d by a `no_std` firmware
//! crate without depending on this one.

use std::fmt::Write as _;

use super::{write_hex_rows, EmitError, EmitOptions};
use crate::encoder::SparseImage;
use crate::table::EMPTY_SECTOR;

pub fn render(image: &SparseImage, opts: &EmitOptions) -> Result<String, EmitError> {
    let lower = opts.prefix.to_lowercase();
    let upper = opts.prefix.to_uppercase();
    let mut out = String::with_capacity(image.stream().len() * 6 + 2048);

    writeln!(out, "// Generated by romdisk. Do not edit.")?;
    writeln!(out)?;
    writeln!(out, "pub const {upper}_EMPTY_SECTOR: u16 = 0x{EMPTY_SECTOR:04X};")?;
    writeln!(out, "pub const {upper}_SECTORS: u32 = {};", image.total_sectors())?;
    writeln!(out, "pub const {upper}_SECTOR_DATA_COUNT: usize = {};", image.data_sectors())?;
    writeln!(out)?;

    writeln!(out, "pub static {upper}_SECTOR_OFFSETS: [u16; {upper}_SECTOR_DATA_COUNT] = [")?;
    for (sector, &raw) in image.raw_offsets().iter().enumerate() {
        if raw == EMPTY_SECTOR {
            writeln!(out, "    /* {sector:04X} */ {upper}_EMPTY_SECTOR,")?;
        } else {
            writeln!(out, "    /* {sector:04X} */ {raw},")?;
        }
    }
    writeln!(out, "];")?;
    writeln!(out)?;

    writeln!(out, "pub static {upper}_STREAM: [u8; {}] = [", image.stream().len())?;
    write_hex_rows(&mut out, image.stream(), opts.bytes_per_line, "    ", ", ")?;
    writeln!(out, "];")?;
    writeln!(out)?;

    write!(out, r#"pub fn {lower}_fetch_byte(offset: u32) -> u8 {{
    let sector = (offset / 512) as usize;
    if sector >= {upper}_SECTOR_DATA_COUNT || {upper}_SECTOR_OFFSETS[sector] == {upper}_EMPTY_SECTOR {{
        return 0;
    }}
    {upper}_STREAM[{upper}_SECTOR_OFFSETS[sector] as usize + (offset % 512) as usize]
}}

pub fn {lower}_fetch_sector(sector: u32, data: &mut [u8; 512]) {{
    let sector = sector as usize;
    if sector >= {upper}_SECTOR_DATA_COUNT || {upper}_SECTOR_OFFSETS[sector] == {upper}_EMPTY_SECTOR {{
        data.fill(0);
    }} else {{
        let start = {upper}_SECTOR_OFFSETS[sector] as usize;
        data.copy_from_slice(&{upper}_STREAM[start..start + 512]);
    }}
}}
"#)?;

    Ok(out)
}
