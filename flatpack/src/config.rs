use flattener::{ DEFAULT_MAX_DEPTH, FlattenOptions, ImportFlags, TransformMode, VertexFormat, };
use serde::{ Deserialize, Serialize, };
use std::path::{ Path, PathBuf, };

/// Emitted when a `.toml` configuration file cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// Could not read the configuration file
	#[error("Could not read config '{}': {source}", .path.display())]
	FileError {
		path: PathBuf,
		source: std::io::Error,
	},
	/// Configuration file did not have the .toml extension
	#[error("Config '{}' does not have the .toml extension", .0.display())]
	IncorrectExtension(PathBuf),
	/// Configuration file TOML contents could not be deserialized
	#[error("Could not parse config: {0}")]
	ParseError(#[from] toml::de::Error),
}

/// Settings for a conversion. Every field has a default, so a config file only needs the keys it changes. Command line
/// flags are applied on top of whatever the file sets.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlatpackConfig {
	/// Replace the output through a temporary sibling file and a rename instead of truncating it.
	pub atomic_replace: bool,
	/// zstd level used for the container payload.
	pub compression_level: i32,
	pub flags: ImportFlags,
	pub format: VertexFormat,
	/// Stop after flattening and leave the uncompressed vertex stream in place.
	pub keep_intermediate: bool,
	pub max_depth: usize,
	pub strict_triangles: bool,
	pub transforms: TransformMode,
}

impl Default for FlatpackConfig {
	fn default() -> Self {
		FlatpackConfig {
			atomic_replace: true,
			compression_level: container::ZstdCompressor::default().level,
			flags: ImportFlags::default(),
			format: VertexFormat::default(),
			keep_intermediate: false,
			max_depth: DEFAULT_MAX_DEPTH,
			strict_triangles: false,
			transforms: TransformMode::default(),
		}
	}
}

impl FlatpackConfig {
	/// Parse a TOML configuration file. The file must carry the `.toml` extension.
	pub fn read_file(path: &Path) -> Result<FlatpackConfig, ConfigError> {
		if path.extension().and_then(|extension| extension.to_str()) != Some("toml") {
			return Err(ConfigError::IncorrectExtension(path.to_path_buf()));
		}

		let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileError {
			path: path.to_path_buf(),
			source,
		})?;

		FlatpackConfig::parse(&contents)
	}

	pub fn parse(contents: &str) -> Result<FlatpackConfig, ConfigError> {
		Ok(toml::from_str::<FlatpackConfig>(contents)?)
	}

	pub fn flatten_options(&self) -> FlattenOptions {
		FlattenOptions {
			flags: self.flags,
			format: self.format,
			max_depth: self.max_depth,
			strict_triangles: self.strict_triangles,
			transforms: self.transforms,
		}
	}
}
