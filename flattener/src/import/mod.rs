mod dae;
#[cfg(feature = "fbx")]
mod fbx;
mod gltf;
mod obj;

use std::path::Path;

use crate::error::ImportError;
use crate::scene::{ ImportFlags, Scene, post_process, };

fn parse_error(path: &Path, reason: impl ToString) -> ImportError {
	ImportError::Parse {
		path: path.to_path_buf(),
		reason: reason.to_string(),
	}
}

/// Produces a scene graph from a file. The scene is released when it is dropped.
pub trait SceneImporter {
	fn import(&self, path: &Path, flags: ImportFlags) -> Result<Scene, ImportError>;
}

/// Picks a parser from the file extension and applies the requested post-processing to what it returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileImporter;

impl SceneImporter for FileImporter {
	fn import(&self, path: &Path, flags: ImportFlags) -> Result<Scene, ImportError> {
		std::fs::metadata(path).map_err(|source| ImportError::Io {
			path: path.to_path_buf(),
			source,
		})?;

		let extension = path.extension()
			.and_then(|extension| extension.to_str())
			.map(|extension| extension.to_ascii_lowercase())
			.unwrap_or_default();

		let mut scene = match extension.as_str() {
			"gltf" | "glb" => gltf::load(path)?,
			"dae" => dae::load(path)?,
			"obj" => obj::load(path)?,
			#[cfg(feature = "fbx")]
			"fbx" => fbx::load(path)?,
			_ => return Err(ImportError::UnsupportedFormat {
				extension,
			}),
		};

		post_process::apply(&mut scene, flags);

		tracing::debug!("imported {:?}: {:?}", path, scene.summary());

		Ok(scene)
	}
}

#[cfg(test)]
pub(crate) mod test_helpers {
	use std::path::PathBuf;
	use std::sync::atomic::{ AtomicUsize, Ordering, };

	static COUNTER: AtomicUsize = AtomicUsize::new(0);

	/// Writes `contents` to a fresh file in the temporary directory.
	pub fn temp_file(name: &str, contents: &str) -> PathBuf {
		let path = std::env::temp_dir().join(format!(
			"flattener-{}-{}-{}",
			std::process::id(),
			COUNTER.fetch_add(1, Ordering::Relaxed),
			name
		));
		std::fs::write(&path, contents).expect("Could not write temporary file");
		path
	}
}
