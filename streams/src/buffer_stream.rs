use std::convert::Infallible;

use crate::{ Decode, Encode, ReadStream, StreamError, StreamPosition, WriteStream, };
use crate::u8_io::{ U8ReadStream, U8WriteStream, };
use crate::u8_io::reading;
use crate::u8_io::writing;

/// In-memory write stream backed by a `Vec<u8>`. Appending to a vector cannot fail, so neither can encoding.
#[derive(Debug, Default)]
pub struct BufferWriteStream {
	buffer: Vec<u8>,
}

impl BufferWriteStream {
	/// Creates a stream with room for `capacity` bytes before it has to reallocate.
	pub fn with_capacity(capacity: usize) -> Self {
		BufferWriteStream {
			buffer: Vec::with_capacity(capacity),
		}
	}
}

impl U8WriteStream<Infallible> for BufferWriteStream {
	fn write_i32(&mut self, number: i32) -> Result<(), Infallible> {
		writing::write_i32(number, &mut self.buffer);
		Ok(())
	}

	fn write_vector(&mut self, vector: &[u8]) -> Result<(), Infallible> {
		self.buffer.extend_from_slice(vector);
		Ok(())
	}
}

impl WriteStream<Infallible> for BufferWriteStream {
	type Export = Vec<u8>;

	fn encode<T: Encode<Self, Infallible>>(&mut self, object: &T) -> Result<(), Infallible> {
		object.encode(self)
	}

	fn export(&mut self) -> Result<Self::Export, Infallible> {
		Ok(std::mem::take(&mut self.buffer))
	}
}

/// In-memory read stream over an owned byte buffer.
#[derive(Debug, Default)]
pub struct BufferReadStream {
	buffer: Vec<u8>,
	position: StreamPosition,
}

impl BufferReadStream {
	pub fn new(buffer: Vec<u8>) -> Self {
		BufferReadStream {
			buffer,
			position: 0,
		}
	}

	/// The bytes that have not been read yet.
	fn remaining(&self) -> &[u8] {
		&self.buffer[self.position as usize..]
	}
}

impl U8ReadStream<StreamError> for BufferReadStream {
	fn read_i32(&mut self) -> Result<(i32, StreamPosition), StreamError> {
		let (number, read_bytes) = reading::read_i32(self.remaining())?;
		self.position += read_bytes;
		Ok((number, self.position))
	}

	fn read_remaining(&mut self) -> Result<(Vec<u8>, StreamPosition), StreamError> {
		let remaining = self.remaining();
		let (vector, read_bytes) = reading::read_vector(remaining, remaining.len())?;
		self.position += read_bytes;
		Ok((vector, self.position))
	}
}

impl ReadStream<StreamError> for BufferReadStream {
	fn decode<T: Decode<Self, StreamError>>(&mut self) -> Result<(T, StreamPosition), StreamError> {
		T::decode(self)
	}
}
