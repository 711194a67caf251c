pub mod buffer_stream;
pub mod decode;
pub mod encode;
pub mod error;
pub mod read_stream;
pub mod u8_io;
pub mod write_stream;

pub use buffer_stream::BufferReadStream;
pub use buffer_stream::BufferWriteStream;
pub use decode::Decode;
pub use encode::Encode;
pub use error::StreamError;
pub use read_stream::ReadStream;
pub use read_stream::StreamPosition;
pub use write_stream::WriteStream;

/// Test the `u8` encoding reference implementation of read/write streams.
#[cfg(test)]
mod tests {
	use std::convert::Infallible;

	use super::{ BufferReadStream, BufferWriteStream, Decode, Encode, ReadStream, StreamError, StreamPosition, WriteStream, };
	use super::u8_io::{ U8ReadStream, U8WriteStream, };
	use super::u8_io::reading::{ read_i32, read_vector, };
	use super::u8_io::writing::write_i32;

	#[derive(Debug, Eq, PartialEq)]
	struct TestObject {
		signed_int: i32,
		trailer: Vec<u8>,
	}

	impl<T, U> Encode<T, U> for TestObject
	where
		T: WriteStream<U> + U8WriteStream<U>
	{
		fn encode(&self, stream: &mut T) -> Result<(), U> {
			stream.write_i32(self.signed_int)?;
			stream.write_vector(&self.trailer)
		}
	}

	impl<T, U> Decode<T, U> for TestObject
	where
		T: ReadStream<U> + U8ReadStream<U>
	{
		fn decode(stream: &mut T) -> Result<(Self, StreamPosition), U> {
			let (signed_int, _) = stream.read_i32()?;
			let (trailer, position) = stream.read_remaining()?;

			Ok((
				TestObject {
					signed_int,
					trailer,
				},
				position,
			))
		}
	}

	fn test_object() -> TestObject {
		TestObject {
			signed_int: -96892,
			trailer: vec![9, 8, 7],
		}
	}

	fn encode_infallible<T: Encode<BufferWriteStream, Infallible>>(object: &T) -> Vec<u8> {
		let mut stream = BufferWriteStream::default();
		match stream.encode(object).and_then(|_| stream.export()) {
			Ok(bytes) => bytes,
			Err(never) => match never {},
		}
	}

	#[test]
	fn export_empties_stream() {
		let mut stream = BufferWriteStream::with_capacity(16);
		stream.encode(&test_object()).unwrap();

		assert_eq!(stream.export().unwrap().len(), 4 + 3);
		assert!(stream.export().unwrap().is_empty());
	}

	#[test]
	fn has_equality() {
		let exported = encode_infallible(&test_object());
		let length = exported.len() as StreamPosition;

		let mut stream = BufferReadStream::new(exported);
		let (decoded, position) = stream.decode::<TestObject>().expect("Could not decode TestObject");
		assert_eq!(decoded, test_object());
		assert_eq!(position, length);
	}

	#[test]
	fn little_endian_layout() {
		let mut vector = Vec::new();
		write_i32(-2, &mut vector);
		write_i32(0x03040506, &mut vector);
		assert_eq!(vector, vec![0xFE, 0xFF, 0xFF, 0xFF, 0x06, 0x05, 0x04, 0x03]);

		assert_eq!(read_i32(&vector).unwrap(), (-2, 4));
		assert_eq!(read_i32(&vector[4..]).unwrap(), (0x03040506, 4));
	}

	#[test]
	fn short_reads_fail() {
		assert_eq!(
			read_i32(&[1, 2, 3]),
			Err(StreamError::UnexpectedEnd {
				needed: 4,
				remaining: 3,
			})
		);
		assert!(read_vector(&[1, 2], 3).is_err());

		let mut stream = BufferReadStream::new(vec![1, 2]);
		assert!(stream.read_i32().is_err());
		// a failed read does not move the stream
		assert_eq!(stream.read_remaining().expect("Could not read remaining"), (vec![1, 2], 2));
	}
}
