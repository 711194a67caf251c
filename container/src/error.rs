use std::path::PathBuf;

use streams::StreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
	/// The input file could not be opened, sized or read in full.
	#[error("could not read '{}': {source}", .path.display())]
	Read {
		path: PathBuf,
		source: std::io::Error,
	},
	/// The compressor declined the data. The file on disk is left untouched.
	#[error("could not compress '{}' ({length} bytes)", .path.display())]
	Compress {
		path: PathBuf,
		length: usize,
	},
	/// The container could not be written back out.
	#[error("could not write '{}': {source}", .path.display())]
	Write {
		path: PathBuf,
		source: std::io::Error,
	},
	/// The file is too short to hold a container header.
	#[error("malformed container: {0}")]
	MalformedContainer(#[from] StreamError),
	/// The header records a size that no file can have.
	#[error("container records an invalid uncompressed size of {0}")]
	InvalidSize(i32),
	/// The payload did not decompress into the size recorded in the header.
	#[error("could not decompress container payload: {0}")]
	Decompress(String),
}
