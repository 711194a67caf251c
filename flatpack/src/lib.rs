mod config;

use container::{ ContainerError, PackOptions, PackStats, ZstdCompressor, };
use flattener::{ FileImporter, FlattenError, FlattenStats, ImportError, SceneImporter, SceneSummary, };
use std::path::{ Path, PathBuf, };

pub use config::{ ConfigError, FlatpackConfig, };

#[derive(Debug, thiserror::Error)]
pub enum FlatpackError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Container(#[from] ContainerError),
	#[error(transparent)]
	Flatten(#[from] FlattenError),
	#[error(transparent)]
	Import(#[from] ImportError),
	#[error("Could not write '{}': {source}", .path.display())]
	Write {
		path: PathBuf,
		source: std::io::Error,
	},
}

/// What a conversion produced. `pack` is empty when the intermediate file was kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvertReport {
	pub flatten: FlattenStats,
	pub pack: Option<PackStats>,
}

/// Flattens the scene at `input` into `output`, then compresses `output` into a container unless the config asks to
/// keep the intermediate vertex stream.
pub fn convert(input: &Path, output: &Path, config: &FlatpackConfig) -> Result<ConvertReport, FlatpackError> {
	let flatten = flattener::flatten(&FileImporter, input, output, &config.flatten_options())?;

	if config.keep_intermediate {
		tracing::info!("keeping uncompressed vertex stream {:?}", output);
		return Ok(ConvertReport {
			flatten,
			pack: None,
		});
	}

	let compressor = ZstdCompressor {
		level: config.compression_level,
	};

	let pack = container::pack(output, &compressor, &PackOptions {
		atomic_replace: config.atomic_replace,
	})?;

	Ok(ConvertReport {
		flatten,
		pack: Some(pack),
	})
}

/// Imports `input` without writing anything and reports what a conversion would see.
pub fn validate(input: &Path, config: &FlatpackConfig) -> Result<SceneSummary, FlatpackError> {
	let scene = FileImporter.import(input, config.flags)?;
	let summary = scene.summary();

	tracing::info!(
		"{:?}: {} node(s), depth {}, {} mesh(es), {} face(s), {} flat vertices",
		input,
		summary.nodes,
		summary.depth,
		summary.meshes,
		summary.faces,
		summary.vertices
	);

	Ok(summary)
}

/// Decompresses the container at `input` and writes the vertex stream to `output`. Returns the stream's size.
pub fn unpack_to(input: &Path, output: &Path) -> Result<usize, FlatpackError> {
	let data = container::unpack(input, &ZstdCompressor::default())?;

	std::fs::write(output, &data).map_err(|source| FlatpackError::Write {
		path: output.to_path_buf(),
		source,
	})?;

	tracing::info!("unpacked {:?} into {:?}: {} bytes", input, output, data.len());

	Ok(data.len())
}

#[cfg(test)]
mod tests {
	use std::io::Write;
	use std::path::PathBuf;
	use std::sync::{ Arc, Mutex, };
	use std::sync::atomic::{ AtomicUsize, Ordering, };

	use flattener::{ ImportError, VertexFormat, };

	use super::{ FlatpackConfig, FlatpackError, convert, unpack_to, validate, };

	const CUBE: &str = "o cube\n\
		v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0 0 1\nv 1 0 1\nv 1 1 1\nv 0 1 1\n\
		f 1 4 3 2\nf 5 6 7 8\nf 1 2 6 5\nf 4 8 7 3\nf 1 5 8 4\nf 2 3 7 6\n";

	fn temp_path(name: &str) -> PathBuf {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		std::env::temp_dir().join(format!(
			"flatpack-{}-{}-{}",
			std::process::id(),
			COUNTER.fetch_add(1, Ordering::Relaxed),
			name
		))
	}

	#[test]
	fn convert_and_unpack() {
		let input = temp_path("cube.obj");
		std::fs::write(&input, CUBE).unwrap();

		let intermediate = temp_path("cube.sos");
		let keep = FlatpackConfig {
			keep_intermediate: true,
			..FlatpackConfig::default()
		};
		let report = convert(&input, &intermediate, &keep).expect("Could not convert");
		assert_eq!(report.flatten.vertices, 36);
		assert!(report.pack.is_none());
		let expected = std::fs::read(&intermediate).unwrap();

		let packed = temp_path("cube.sos.lz");
		let report = convert(&input, &packed, &FlatpackConfig::default()).expect("Could not convert");
		let pack = report.pack.expect("Missing pack stats");
		assert_eq!(pack.uncompressed_size, expected.len());
		assert_eq!(pack.container_size as u64, std::fs::metadata(&packed).unwrap().len());

		let unpacked = temp_path("cube.unpacked.sos");
		let size = unpack_to(&packed, &unpacked).expect("Could not unpack");
		assert_eq!(size, expected.len());
		assert_eq!(std::fs::read(&unpacked).unwrap(), expected);

		let text = String::from_utf8(expected).unwrap();
		assert_eq!(text.lines().count(), 36);
		assert!(text.lines().all(|line| VertexFormat::Quantized.parse_line(line).is_ok()));

		for path in [input, intermediate, packed, unpacked] {
			std::fs::remove_file(path).unwrap();
		}
	}

	#[test]
	fn validate_writes_nothing() {
		let input = temp_path("validate.obj");
		std::fs::write(&input, CUBE).unwrap();

		let summary = validate(&input, &FlatpackConfig::default()).expect("Could not validate");
		std::fs::remove_file(&input).unwrap();

		assert_eq!(summary.meshes, 1);
		assert_eq!(summary.faces, 12);
		assert_eq!(summary.vertices, 36);
	}

	#[test]
	fn unsupported_input() {
		let input = temp_path("scene.blend");
		std::fs::write(&input, "BLENDER").unwrap();
		let output = temp_path("scene.sos.lz");

		let result = convert(&input, &output, &FlatpackConfig::default());
		std::fs::remove_file(&input).unwrap();

		assert!(matches!(
			result,
			Err(FlatpackError::Flatten(flattener::FlattenError::Import(ImportError::UnsupportedFormat { .. })))
		));
		assert!(!output.exists());
	}

	#[test]
	fn unpack_rejects_plain_files() {
		let input = temp_path("plain.sos");
		std::fs::write(&input, [0xff, 0xff, 0xff, 0xff, 1, 2, 3]).unwrap();
		let output = temp_path("plain.out");

		let result = unpack_to(&input, &output);
		std::fs::remove_file(&input).unwrap();

		assert!(matches!(result, Err(FlatpackError::Container(_))));
		assert!(!output.exists());
	}

	/// Log output collected by a test subscriber.
	#[derive(Clone, Default)]
	struct CapturedLog(Arc<Mutex<Vec<u8>>>);

	impl Write for CapturedLog {
		fn write(&mut self, buffer: &[u8]) -> std::io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buffer);
			Ok(buffer.len())
		}

		fn flush(&mut self) -> std::io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn each_step_is_logged_once() {
		let input = temp_path("logged.obj");
		std::fs::write(&input, CUBE).unwrap();
		let output = temp_path("logged.sos.lz");

		let log = CapturedLog::default();
		let writer = log.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_ansi(false)
			.with_max_level(tracing::Level::INFO)
			.with_writer(move || writer.clone())
			.finish();

		tracing::subscriber::with_default(subscriber, || {
			convert(&input, &output, &FlatpackConfig::default()).expect("Could not convert");
		});

		std::fs::remove_file(&input).unwrap();
		std::fs::remove_file(&output).unwrap();

		let text = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
		assert_eq!(text.lines().filter(|line| line.contains("flattened")).count(), 1);
		assert_eq!(text.lines().filter(|line| line.contains("packed")).count(), 1);
	}
}
