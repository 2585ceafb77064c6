//! C translation unit generator.
//!
//! Output layout is fixed; firmware projects diff and commit it.  With the
//! default prefix the symbols are `IMAGE_EMPTY_SECTOR`, `image_sectors`,
//! `IMAGE_SECTOR_DATA_COUNT`, `image_sector_offsets`, `image_stream`,
//! `image_fetch_byte` and `image_fetch_sector`.  Like the Rust generator,
//! functions and tables take the lower-cased prefix, macros the upper-cased.

use std::fmt::Write as _;

use super::{write_hex_rows, EmitError, EmitOptions};
use crate::encoder::SparseImage;
use crate::table::EMPTY_SECTOR;

pub fn render(image: &SparseImage, opts: &EmitOptions) -> Result<String, EmitError> {
    let lower = opts.prefix.to_lowercase();
    let upper = opts.prefix.to_uppercase();
    let mut out = String::with_capacity(image.stream().len() * 5 + 2048);

    writeln!(out, "#include <stdint.h>")?;
    writeln!(out, "#include <string.h>")?;
    writeln!(out, "#define {upper}_EMPTY_SECTOR 0x{EMPTY_SECTOR:04X}")?;
    writeln!(out, "static const uint32_t {lower}_sectors = {};", image.total_sectors())?;
    writeln!(out, "#define {upper}_SECTOR_DATA_COUNT {}", image.data_sectors())?;

    // C forbids zero-length arrays; an all-empty image gets one placeholder
    // entry that the count check keeps unreachable.
    if image.data_sectors() == 0 {
        writeln!(out, "static const uint16_t {lower}_sector_offsets[1] = {{")?;
        writeln!(out, " {upper}_EMPTY_SECTOR,")?;
    } else {
        writeln!(out, "static const uint16_t {lower}_sector_offsets[{upper}_SECTOR_DATA_COUNT] = {{")?;
        for (sector, &raw) in image.raw_offsets().iter().enumerate() {
            if raw == EMPTY_SECTOR {
                writeln!(out, " /* {sector:04X} */ {upper}_EMPTY_SECTOR,")?;
            } else {
                writeln!(out, " /* {sector:04X} */ {raw},")?;
            }
        }
    }
    writeln!(out, "}};")?;

    let stream = image.stream();
    if stream.is_empty() {
        writeln!(out, "static const uint8_t {lower}_stream[1] = {{")?;
        write_hex_rows(&mut out, &[0], 1, " ", ",")?;
    } else {
        writeln!(out, "static const uint8_t {lower}_stream[{}] = {{", stream.len())?;
        write_hex_rows(&mut out, stream, opts.bytes_per_line, " ", ",")?;
    }
    writeln!(out, "}};")?;
    writeln!(out)?;

    write!(out, r#"uint8_t {lower}_fetch_byte(uint32_t offset) {{
    uint32_t sector = offset / 512;
    if (sector >= {upper}_SECTOR_DATA_COUNT || {lower}_sector_offsets[sector] == {upper}_EMPTY_SECTOR)
        return 0;
    return {lower}_stream[{lower}_sector_offsets[sector] + offset % 512];
}}

void {lower}_fetch_sector(uint32_t sector, void* data) {{
    if (sector >= {upper}_SECTOR_DATA_COUNT || {lower}_sector_offsets[sector] == {upper}_EMPTY_SECTOR) {{
        memset(data, 0, 512);
    }}
    else {{
        memcpy(data, {lower}_stream + {lower}_sector_offsets[sector], 512);
    }}
}}
"#)?;

    Ok(out)
}
