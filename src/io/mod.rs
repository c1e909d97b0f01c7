mod endian;
mod positioned;
mod zero_fill;

pub use endian::{encode_uint_le, read_u16_le, read_u32_le, read_u64_le, read_uint_le};
pub use positioned::{ReadAt, WriteAt};
pub use zero_fill::{zero_fill, ByteRange, ZERO_FILL_CHUNK};
