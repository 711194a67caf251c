use crate::ContainerError;

/// Whole-buffer compressor used by the packer. The compressor owns the payload format; the packer only records the
/// uncompressed size in front of it.
pub trait Compressor {
	/// Compresses `source` into `destination` and returns how many bytes of `destination` were used. Zero means the
	/// compressor declined, either because the data cannot be compressed or because `destination` is too small.
	fn compress(&self, source: &[u8], destination: &mut [u8]) -> usize;

	/// The largest amount of bytes `compress` can produce for `length` input bytes.
	fn bound(&self, length: usize) -> usize;

	/// Decompresses a payload that expands into exactly `uncompressed_size` bytes.
	fn decompress(&self, payload: &[u8], uncompressed_size: usize) -> Result<Vec<u8>, ContainerError>;
}

/// zstd compression at a fixed level.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ZstdCompressor {
	pub level: i32,
}

impl Default for ZstdCompressor {
	fn default() -> Self {
		ZstdCompressor {
			level: zstd::DEFAULT_COMPRESSION_LEVEL,
		}
	}
}

impl Compressor for ZstdCompressor {
	fn compress(&self, source: &[u8], destination: &mut [u8]) -> usize {
		// empty input has nothing worth framing
		if source.is_empty() {
			return 0;
		}

		match zstd::bulk::compress_to_buffer(source, destination, self.level) {
			Ok(length) => length,
			Err(error) => {
				tracing::debug!("zstd declined {} bytes into a {} byte buffer: {}", source.len(), destination.len(), error);
				0
			},
		}
	}

	fn bound(&self, length: usize) -> usize {
		zstd::zstd_safe::compress_bound(length)
	}

	fn decompress(&self, payload: &[u8], uncompressed_size: usize) -> Result<Vec<u8>, ContainerError> {
		let data = zstd::bulk::decompress(payload, uncompressed_size)
			.map_err(|error| ContainerError::Decompress(error.to_string()))?;

		if data.len() != uncompressed_size {
			return Err(ContainerError::Decompress(
				format!("expected {} bytes, got {}", uncompressed_size, data.len())
			));
		}

		Ok(data)
	}
}
