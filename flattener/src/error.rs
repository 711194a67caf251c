use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
	#[error("Could not open '{}': {source}", .path.display())]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("Unsupported scene format '{extension}'")]
	UnsupportedFormat {
		extension: String,
	},
	#[error("Could not parse '{}': {reason}", .path.display())]
	Parse {
		path: PathBuf,
		reason: String,
	},
	#[error("'{}' contains no scene", .path.display())]
	EmptyScene {
		path: PathBuf,
	},
}

#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
	#[error(transparent)]
	Import(#[from] ImportError),
	#[error("Could not create '{}': {source}", .path.display())]
	Create {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("Could not write vertex stream: {0}")]
	Write(#[from] std::io::Error),
	#[error("Invalid scene: {0}")]
	InvalidScene(String),
}
