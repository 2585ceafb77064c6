pub mod sector;
pub mod table;
pub mod encoder;
pub mod decoder;
pub mod emit;
pub mod blob;
pub mod logging;

pub use sector::{SectorRead, SECTOR_SIZE, verify};
pub use table::{SectorEntry, EMPTY_SECTOR};
pub use encoder::{EncodeOptions, SparseImage, encode, encode_file};
pub use decoder::SparseView;
pub use emit::{EmitOptions, Lang, emit};
