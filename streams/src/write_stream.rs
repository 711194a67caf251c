use crate::Encode;

/// Stream that encodes Rust objects and transforms the encoded data into the `Export` type.
pub trait WriteStream<Error>: Sized {
	type Export;

	/// Use the `Encode` trait to encode an object into the stream.
	fn encode<T: Encode<Self, Error>>(&mut self, object: &T) -> Result<(), Error>;

	/// Transforms the encoded data into the `Export` object, leaving the stream empty.
	fn export(&mut self) -> Result<Self::Export, Error>;
}
