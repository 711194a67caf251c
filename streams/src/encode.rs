/// Encode an object. For more information on how `Error` is meant to be used, see `ReadStream`.
pub trait Encode<Stream, Error> {
	fn encode(&self, stream: &mut Stream) -> Result<(), Error>;
}
