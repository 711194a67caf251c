/// Writes a signed integer as its four byte two's complement representation in little-endian format.
pub fn write_i32(number: i32, vector: &mut Vec<u8>) {
	let mut shift = number as u32;
	for _ in 0..4 {
		vector.push((shift & 0xFF) as u8);
		shift >>= 8;
	}
}

/// Trait for a stream that implements `u8` writing.
pub trait U8WriteStream<Error> {
	/// Writes a signed integer in four bytes, little-endian format.
	fn write_i32(&mut self, number: i32) -> Result<(), Error>;

	/// Writes a byte slice as-is.
	fn write_vector(&mut self, vector: &[u8]) -> Result<(), Error>;
}
