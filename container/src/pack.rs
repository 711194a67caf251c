use std::fs::File;
use std::io::{ Read, Seek, SeekFrom, Write, };
use std::path::{ Path, PathBuf, };

use streams::{ BufferReadStream, BufferWriteStream, ReadStream, WriteStream, };

use crate::{ CompressedContainer, Compressor, ContainerError, };

/// Controls how the packer writes the container back over its input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PackOptions {
	/// Write the container next to the input and rename it over the original. When disabled the input is truncated and
	/// rewritten in place, which leaves a partial file behind if the write fails.
	pub atomic_replace: bool,
}

impl Default for PackOptions {
	fn default() -> Self {
		PackOptions {
			atomic_replace: true,
		}
	}
}

/// Sizes observed during a successful pack.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PackStats {
	pub uncompressed_size: usize,
	pub container_size: usize,
}

impl PackStats {
	/// Container size as a fraction of the original size.
	pub fn ratio(&self) -> f64 {
		if self.uncompressed_size == 0 {
			return 0.0;
		}

		self.container_size as f64 / self.uncompressed_size as f64
	}
}

/// Compressed output can be larger than its input, so the first attempt gets 5% of slack.
fn slack_capacity(length: usize) -> usize {
	std::cmp::max(length + (length + 19) / 20, 1)
}

/// Reads an entire file into memory. The length is taken by seeking to the end so a short read can be detected.
fn read_file(path: &Path) -> Result<Vec<u8>, ContainerError> {
	let read_error = |source| ContainerError::Read {
		path: path.to_path_buf(),
		source,
	};

	let mut file = File::open(path).map_err(read_error)?;
	let length = file.seek(SeekFrom::End(0)).map_err(read_error)?;
	file.seek(SeekFrom::Start(0)).map_err(read_error)?;

	let mut data = vec![0; length as usize];
	file.read_exact(&mut data).map_err(read_error)?;

	Ok(data)
}

/// Sibling path used while atomically replacing `path`.
fn staging_path(path: &Path) -> PathBuf {
	let mut file_name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
	file_name.push(".packing");
	path.with_file_name(file_name)
}

fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
	let mut file = File::create(path)?;
	file.write_all(data)?;
	file.flush()
}

/// Writes `data` over `path`, either through a staging file and a rename or by truncating the original.
fn replace_file(path: &Path, data: &[u8], options: &PackOptions) -> Result<(), ContainerError> {
	let write_error = |source| ContainerError::Write {
		path: path.to_path_buf(),
		source,
	};

	if !options.atomic_replace {
		return write_file(path, data).map_err(write_error);
	}

	let staging = staging_path(path);
	let result = write_file(&staging, data).and_then(|_| std::fs::rename(&staging, path));
	if let Err(error) = result {
		// the original is still intact at this point, only the staging file needs to go
		let _ = std::fs::remove_file(&staging);
		return Err(write_error(error));
	}

	Ok(())
}

/// Compresses `data` with the slack buffer first, then once more with the compressor's worst case bound if that did
/// not fit. Returns the compressed bytes, or `None` if the compressor declined both times.
fn compress<C: Compressor>(compressor: &C, data: &[u8]) -> Option<Vec<u8>> {
	let mut buffer = vec![0; slack_capacity(data.len())];
	let mut length = compressor.compress(data, &mut buffer);

	let bound = compressor.bound(data.len());
	if length == 0 && bound > buffer.len() {
		tracing::debug!("compressed data overflowed {} bytes of slack, retrying with {}", buffer.len(), bound);
		buffer.resize(bound, 0);
		length = compressor.compress(data, &mut buffer);
	}

	if length == 0 {
		return None;
	}

	buffer.truncate(length);
	Some(buffer)
}

/// Compresses the file at `path` and rewrites it as a `CompressedContainer`. If reading or compressing fails the file is
/// not touched.
pub fn pack<C: Compressor>(path: &Path, compressor: &C, options: &PackOptions) -> Result<PackStats, ContainerError> {
	let data = read_file(path)?;

	let compress_error = || ContainerError::Compress {
		path: path.to_path_buf(),
		length: data.len(),
	};

	// the header can only describe sizes that fit in an i32
	let Ok(uncompressed_size) = i32::try_from(data.len()) else {
		return Err(compress_error());
	};

	let Some(payload) = compress(compressor, &data) else {
		return Err(compress_error());
	};

	let container = CompressedContainer {
		uncompressed_size,
		payload,
	};

	let mut stream = BufferWriteStream::with_capacity(container.encoded_size());
	let buffer = match stream.encode(&container).and_then(|_| stream.export()) {
		Ok(buffer) => buffer,
		Err(never) => match never {},
	};

	replace_file(path, &buffer, options)?;

	let stats = PackStats {
		uncompressed_size: data.len(),
		container_size: buffer.len(),
	};

	tracing::info!(
		"packed '{}': {} -> {} bytes ({:.1}%)",
		path.display(),
		stats.uncompressed_size,
		stats.container_size,
		stats.ratio() * 100.0
	);

	Ok(stats)
}

/// Reads the container at `path` and returns the original bytes.
pub fn unpack<C: Compressor>(path: &Path, compressor: &C) -> Result<Vec<u8>, ContainerError> {
	let mut stream = BufferReadStream::new(read_file(path)?);
	let (container, _) = stream.decode::<CompressedContainer>()?;

	let Ok(uncompressed_size) = usize::try_from(container.uncompressed_size) else {
		return Err(ContainerError::InvalidSize(container.uncompressed_size));
	};

	let data = compressor.decompress(&container.payload, uncompressed_size)?;
	tracing::debug!("unpacked '{}' into {} bytes", path.display(), data.len());

	Ok(data)
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use crate::{ ContainerError, ZstdCompressor, };
	use crate::compression::Compressor;
	use crate::test_helpers::temp_path;

	use super::{ PackOptions, pack, replace_file, slack_capacity, staging_path, unpack, };

	/// Compressor that refuses everything.
	struct DecliningCompressor;

	impl Compressor for DecliningCompressor {
		fn compress(&self, _: &[u8], _: &mut [u8]) -> usize {
			0
		}

		fn bound(&self, length: usize) -> usize {
			length * 2
		}

		fn decompress(&self, _: &[u8], _: usize) -> Result<Vec<u8>, ContainerError> {
			Err(ContainerError::Decompress(String::from("declined")))
		}
	}

	fn vertex_stream() -> Vec<u8> {
		let mut text = String::new();
		for i in 0..500 {
			text.push_str(&format!("{:x} f4240 0 0 0 0 0 0 0 0 0\n", i * 1000));
		}
		text.into_bytes()
	}

	/// Bytes that do not compress well.
	fn noise(length: usize) -> Vec<u8> {
		let mut state: u32 = 0x12345678;
		(0..length)
			.map(|_| {
				state = state.wrapping_mul(1664525).wrapping_add(1013904223);
				(state >> 24) as u8
			})
			.collect()
	}

	fn pack_and_check(path: &Path, original: &[u8], options: &PackOptions) {
		std::fs::write(path, original).expect("Could not write test file");

		let stats = pack(path, &ZstdCompressor::default(), options).expect("Could not pack");
		assert_eq!(stats.uncompressed_size, original.len());

		let packed = std::fs::read(path).expect("Could not read packed file");
		assert_eq!(packed.len(), stats.container_size);
		assert_eq!(i32::from_le_bytes([packed[0], packed[1], packed[2], packed[3]]), original.len() as i32);

		let data = unpack(path, &ZstdCompressor::default()).expect("Could not unpack");
		assert_eq!(data, original);

		std::fs::remove_file(path).expect("Could not remove test file");
	}

	#[test]
	fn slack_is_five_percent_rounded_up() {
		assert_eq!(slack_capacity(0), 1);
		assert_eq!(slack_capacity(1), 2);
		assert_eq!(slack_capacity(20), 21);
		assert_eq!(slack_capacity(21), 23);
		assert_eq!(slack_capacity(1000), 1050);
	}

	#[test]
	fn round_trips_atomically() {
		let path = temp_path("atomic.sos");
		pack_and_check(&path, &vertex_stream(), &PackOptions::default());
		assert!(!staging_path(&path).exists());
	}

	#[test]
	fn round_trips_in_place() {
		let path = temp_path("in_place.sos");
		pack_and_check(&path, &vertex_stream(), &PackOptions {
			atomic_replace: false,
		});
	}

	#[test]
	fn tiny_input_grows_the_buffer() {
		// a zstd frame for three bytes is larger than three bytes plus slack
		let path = temp_path("tiny.sos");
		pack_and_check(&path, b"0 0", &PackOptions::default());
	}

	#[test]
	fn incompressible_input_round_trips() {
		let path = temp_path("noise.sos");
		pack_and_check(&path, &noise(64 * 1024), &PackOptions::default());
	}

	#[test]
	fn compress_failure_leaves_file_untouched() {
		let path = temp_path("declined.sos");
		let original = vertex_stream();
		std::fs::write(&path, &original).expect("Could not write test file");

		let result = pack(&path, &DecliningCompressor, &PackOptions::default());
		assert!(matches!(result, Err(ContainerError::Compress { length, .. }) if length == original.len()));
		assert_eq!(std::fs::read(&path).expect("Could not read test file"), original);

		std::fs::remove_file(&path).expect("Could not remove test file");
	}

	#[test]
	fn empty_file_is_declined() {
		let path = temp_path("empty.sos");
		std::fs::write(&path, b"").expect("Could not write test file");

		let result = pack(&path, &ZstdCompressor::default(), &PackOptions::default());
		assert!(matches!(result, Err(ContainerError::Compress { length: 0, .. })));
		assert_eq!(std::fs::read(&path).expect("Could not read test file").len(), 0);

		std::fs::remove_file(&path).expect("Could not remove test file");
	}

	#[test]
	fn missing_file_is_a_read_failure() {
		let path = temp_path("missing.sos");
		let result = pack(&path, &ZstdCompressor::default(), &PackOptions::default());
		assert!(matches!(result, Err(ContainerError::Read { .. })));
	}

	#[test]
	fn unpack_rejects_bad_headers() {
		let short = temp_path("short.sos");
		std::fs::write(&short, [1, 2]).expect("Could not write test file");
		assert!(matches!(unpack(&short, &ZstdCompressor::default()), Err(ContainerError::MalformedContainer(_))));
		std::fs::remove_file(&short).expect("Could not remove test file");

		let negative = temp_path("negative.sos");
		std::fs::write(&negative, [0xFF, 0xFF, 0xFF, 0xFF, 1]).expect("Could not write test file");
		assert!(matches!(unpack(&negative, &ZstdCompressor::default()), Err(ContainerError::InvalidSize(-1))));
		std::fs::remove_file(&negative).expect("Could not remove test file");

		let garbage = temp_path("garbage.sos");
		std::fs::write(&garbage, [4, 0, 0, 0, 1, 2, 3, 4]).expect("Could not write test file");
		assert!(matches!(unpack(&garbage, &ZstdCompressor::default()), Err(ContainerError::Decompress(_))));
		std::fs::remove_file(&garbage).expect("Could not remove test file");
	}

	#[test]
	fn blocked_staging_file_is_a_write_failure() {
		let path = temp_path("blocked.sos");
		let original = vertex_stream();
		std::fs::write(&path, &original).expect("Could not write test file");

		// a directory where the staging file should go makes creating it fail
		let staging = staging_path(&path);
		std::fs::create_dir(&staging).expect("Could not create directory");

		let result = pack(&path, &ZstdCompressor::default(), &PackOptions::default());
		assert!(matches!(result, Err(ContainerError::Write { .. })));
		assert_eq!(std::fs::read(&path).expect("Could not read test file"), original);

		std::fs::remove_dir(&staging).expect("Could not remove directory");
		std::fs::remove_file(&path).expect("Could not remove test file");
	}

	#[test]
	fn failed_rename_removes_staging_file() {
		// renaming a file over a non-empty directory fails after the staging file was written
		let path = temp_path("occupied");
		std::fs::create_dir(&path).expect("Could not create directory");
		let resident = path.join("resident");
		std::fs::write(&resident, b"keep").expect("Could not write test file");

		let result = replace_file(&path, b"container", &PackOptions::default());
		assert!(matches!(result, Err(ContainerError::Write { .. })));
		assert!(!staging_path(&path).exists());
		assert_eq!(std::fs::read(&resident).expect("Could not read test file"), b"keep");

		std::fs::remove_dir_all(&path).expect("Could not remove directory");
	}

	#[test]
	fn in_place_write_failure() {
		let path = temp_path("in_place_dir");
		std::fs::create_dir(&path).expect("Could not create directory");

		let result = replace_file(&path, b"container", &PackOptions {
			atomic_replace: false,
		});
		assert!(matches!(result, Err(ContainerError::Write { .. })));

		std::fs::remove_dir(&path).expect("Could not remove directory");
	}
}
