pub mod compression;
pub mod container;
pub mod error;
pub mod pack;

pub use compression::{ Compressor, ZstdCompressor, };
pub use container::CompressedContainer;
pub use error::ContainerError;
pub use pack::{ PackOptions, PackStats, pack, unpack, };
