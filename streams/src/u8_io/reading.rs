use crate::StreamError;
use crate::read_stream::{ StreamPosition, StreamPositionDelta, };

/// Makes sure `vector` has at least `needed` bytes left.
fn check_length(vector: &[u8], needed: usize) -> Result<(), StreamError> {
	if vector.len() < needed {
		Err(StreamError::UnexpectedEnd {
			needed,
			remaining: vector.len(),
		})
	} else {
		Ok(())
	}
}

/// Reads four bytes in little-endian format and reinterprets them as a two's complement integer.
pub fn read_i32(vector: &[u8]) -> Result<(i32, StreamPositionDelta), StreamError> {
	check_length(vector, 4)?;

	let mut number = 0;
	for i in 0..4 {
		number |= (vector[i] as u32) << (i * 8);
	}
	return Ok((number as i32, 4));
}

/// Copies `length` bytes out of the vector.
pub fn read_vector(vector: &[u8], length: usize) -> Result<(Vec<u8>, StreamPositionDelta), StreamError> {
	check_length(vector, length)?;
	Ok((vector[..length].to_vec(), length as StreamPositionDelta))
}

/// Trait for a stream that implements `u8` reading.
pub trait U8ReadStream<Error> {
	/// Reads four bytes in little-endian format as a signed integer.
	fn read_i32(&mut self) -> Result<(i32, StreamPosition), Error>;

	/// Reads every byte left in the stream.
	fn read_remaining(&mut self) -> Result<(Vec<u8>, StreamPosition), Error>;
}
