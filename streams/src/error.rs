use thiserror::Error;

/// Errors produced by the reference `u8` codecs.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum StreamError {
	/// A read asked for more bytes than the buffer had left.
	#[error("unexpected end of stream: needed {needed} byte(s), {remaining} remaining")]
	UnexpectedEnd {
		needed: usize,
		remaining: usize,
	},
}
