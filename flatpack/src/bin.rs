use anyhow::Context;
use clap::{ ArgAction, Parser, ValueEnum, };
use flatpack::FlatpackConfig;
use flattener::{ TransformMode, VertexFormat, };
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
	Quantized,
	Float,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TransformArg {
	Local,
	Accumulated,
}

/// Flattens a 3D scene into a vertex stream and packs it into a compressed container.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
	/// Scene to convert (.gltf, .glb, .obj, .fbx, .dae), or a container when unpacking
	input: PathBuf,
	/// Destination file. Without it the scene is only imported and summarized
	output: Option<PathBuf>,
	/// Decompress the container at INPUT into OUTPUT
	#[arg(long)]
	unpack: bool,
	/// TOML file with conversion settings. Flags given here override it
	#[arg(long)]
	config: Option<PathBuf>,
	#[arg(long, value_enum)]
	format: Option<FormatArg>,
	#[arg(long, value_enum)]
	transforms: Option<TransformArg>,
	/// zstd compression level
	#[arg(long)]
	level: Option<i32>,
	/// Fail on faces that are not triangles
	#[arg(long)]
	strict: bool,
	/// Truncate and rewrite the output instead of replacing it atomically
	#[arg(long)]
	in_place: bool,
	/// Skip compression and leave the vertex stream as text
	#[arg(long)]
	keep_intermediate: bool,
	/// Raise log verbosity, once for debug and twice for trace
	#[arg(short, long, action = ArgAction::Count)]
	verbose: u8,
}

impl Args {
	fn config(&self) -> anyhow::Result<FlatpackConfig> {
		let mut config = match self.config.as_ref() {
			Some(path) => FlatpackConfig::read_file(path).context("Could not load configuration")?,
			None => FlatpackConfig::default(),
		};

		if let Some(format) = self.format {
			config.format = match format {
				FormatArg::Quantized => VertexFormat::Quantized,
				FormatArg::Float => VertexFormat::Float,
			};
		}

		if let Some(transforms) = self.transforms {
			config.transforms = match transforms {
				TransformArg::Local => TransformMode::Local,
				TransformArg::Accumulated => TransformMode::Accumulated,
			};
		}

		if let Some(level) = self.level {
			config.compression_level = level;
		}

		config.strict_triangles |= self.strict;
		config.keep_intermediate |= self.keep_intermediate;
		if self.in_place {
			config.atomic_replace = false;
		}

		Ok(config)
	}
}

fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => "info",
		1 => "debug",
		_ => "trace",
	};

	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn run(args: &Args) -> anyhow::Result<()> {
	let config = args.config()?;

	if args.unpack {
		let output = args.output.as_ref().context("--unpack needs an output path")?;
		flatpack::unpack_to(&args.input, output)
			.with_context(|| format!("Could not unpack {:?}", args.input))?;
		return Ok(());
	}

	match args.output.as_ref() {
		Some(output) => {
			flatpack::convert(&args.input, output, &config)
				.with_context(|| format!("Could not convert {:?}", args.input))?;
		},
		None => {
			flatpack::validate(&args.input, &config)
				.with_context(|| format!("Could not import {:?}", args.input))?;
		},
	}

	Ok(())
}

fn main() -> ExitCode {
	let args = Args::parse();
	init_logging(args.verbose);

	match run(&args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(error) => {
			tracing::error!("{:#}", error);
			ExitCode::FAILURE
		},
	}
}
