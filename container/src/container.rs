use streams::{ Decode, Encode, ReadStream, StreamPosition, WriteStream, };
use streams::u8_io::{ U8ReadStream, U8WriteStream, };

/// Number of bytes taken up by the size header.
pub const HEADER_SIZE: usize = std::mem::size_of::<i32>();

/// A compressed payload annotated with the size of the data it decompresses into, so a reader can allocate the output
/// buffer up front.
///
/// Container encoding:
/// | uncompressed size (4 bytes, signed, little-endian) | payload (rest of the file) |
///
/// There is no magic number, version or checksum. The payload's internal structure belongs to the compressor.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct CompressedContainer {
	pub uncompressed_size: i32,
	pub payload: Vec<u8>,
}

impl CompressedContainer {
	/// Size of the encoded container in bytes.
	pub fn encoded_size(&self) -> usize {
		HEADER_SIZE + self.payload.len()
	}
}

impl<T, U> Encode<T, U> for CompressedContainer
where
	T: WriteStream<U> + U8WriteStream<U>,
{
	fn encode(&self, stream: &mut T) -> Result<(), U> {
		stream.write_i32(self.uncompressed_size)?;
		stream.write_vector(&self.payload)
	}
}

/// The payload runs to the end of the stream, so decoding consumes everything that is left.
impl<T, U> Decode<T, U> for CompressedContainer
where
	T: ReadStream<U> + U8ReadStream<U>,
{
	fn decode(stream: &mut T) -> Result<(Self, StreamPosition), U> {
		let (uncompressed_size, _) = stream.read_i32()?;
		let (payload, position) = stream.read_remaining()?;

		Ok((
			CompressedContainer {
				uncompressed_size,
				payload,
			},
			position,
		))
	}
}
