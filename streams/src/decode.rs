use crate::StreamPosition;

/// Decode an object. Returns the deserialized object along with the stream position after the last primitive that was
/// read. For more information on how `Error` is meant to be used, see `ReadStream`.
pub trait Decode<Stream, Error>: Sized {
	fn decode(stream: &mut Stream) -> Result<(Self, StreamPosition), Error>;
}
