use crate::Decode;

pub type StreamPosition = u64;
pub type StreamPositionDelta = u64;

/// Stream that decodes Rust objects out of imported data. `Error` is chosen by the implementor so decoders can report
/// failures in the vocabulary of whatever format sits on top of the stream.
pub trait ReadStream<Error>: Sized {
	/// Use the `Decode` trait to decode an object out of the stream.
	fn decode<T: Decode<Self, Error>>(&mut self) -> Result<(T, StreamPosition), Error>;
}
