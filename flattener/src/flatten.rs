use glam::Mat4;
use serde::{ Deserialize, Serialize, };
use std::io::{ BufWriter, Write, };
use std::path::Path;

use crate::error::FlattenError;
use crate::format::VertexFormat;
use crate::import::SceneImporter;
use crate::scene::{ ImportFlags, Scene, };
use crate::vertex::FlatVertex;

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Which transform is applied to a node's mesh positions.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
	/// Only the node's own transform, ignoring its ancestors.
	#[default]
	Local,
	/// The product of every transform from the root down to the node.
	Accumulated,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlattenOptions {
	pub flags: ImportFlags,
	pub format: VertexFormat,
	/// Nodes deeper than this make the scene invalid. The root is at depth 0.
	pub max_depth: usize,
	/// Reject faces that do not have exactly three indices instead of warning about them.
	pub strict_triangles: bool,
	pub transforms: TransformMode,
}

impl Default for FlattenOptions {
	fn default() -> Self {
		FlattenOptions {
			flags: ImportFlags::default(),
			format: VertexFormat::default(),
			max_depth: DEFAULT_MAX_DEPTH,
			strict_triangles: false,
			transforms: TransformMode::default(),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FlattenStats {
	pub faces: usize,
	/// Mesh references visited, an instanced mesh counts once per node.
	pub meshes: usize,
	pub nodes: usize,
	pub non_triangular_faces: usize,
	pub vertices: usize,
}

/// Imports `scene_path` and writes its flattened vertex stream to `output_path`, replacing anything already there.
pub fn flatten<I: SceneImporter>(
	importer: &I, scene_path: &Path, output_path: &Path, options: &FlattenOptions
) -> Result<FlattenStats, FlattenError> {
	let scene = importer.import(scene_path, options.flags)?;

	let file = std::fs::File::create(output_path).map_err(|source| FlattenError::Create {
		path: output_path.to_path_buf(),
		source,
	})?;

	let mut writer = BufWriter::new(file);
	let stats = flatten_scene(&scene, &mut writer, options)?;
	writer.flush()?;

	tracing::info!(
		"flattened {:?} into {:?}: {} vertices from {} faces",
		scene_path,
		output_path,
		stats.vertices,
		stats.faces
	);

	Ok(stats)
}

/// Walks `scene` pre-order and writes one line per face index. Children are visited in the order they are stored.
pub fn flatten_scene<W: Write>(
	scene: &Scene, writer: &mut W, options: &FlattenOptions
) -> Result<FlattenStats, FlattenError> {
	let mut stats = FlattenStats::default();

	let mut stack = vec![(&scene.root, Mat4::IDENTITY, 0)];
	while let Some((node, parent_transform, depth)) = stack.pop() {
		if depth > options.max_depth {
			return Err(FlattenError::InvalidScene(
				format!("node '{}' is deeper than the limit of {}", node.name, options.max_depth)
			));
		}

		stats.nodes += 1;

		let world_transform = parent_transform * node.transform;
		let transform = match options.transforms {
			TransformMode::Local => node.transform,
			TransformMode::Accumulated => world_transform,
		};

		tracing::debug!("node '{}' at depth {} with {} mesh(es)", node.name, depth, node.meshes.len());

		for mesh_index in node.meshes.iter() {
			let Some(mesh) = scene.meshes.get(*mesh_index) else {
				return Err(FlattenError::InvalidScene(format!(
					"node '{}' references mesh {} but the scene has {}", node.name, mesh_index, scene.meshes.len()
				)));
			};

			stats.meshes += 1;

			for face in mesh.faces.iter() {
				if !face.is_triangle() {
					if options.strict_triangles {
						return Err(FlattenError::InvalidScene(format!(
							"mesh '{}' has a face with {} indices", mesh.name, face.indices.len()
						)));
					}

					stats.non_triangular_faces += 1;
				}

				for index in face.indices.iter() {
					let Some(vertex) = FlatVertex::from_mesh(mesh, *index, &transform) else {
						return Err(FlattenError::InvalidScene(format!(
							"mesh '{}' has vertex index {} out of range", mesh.name, index
						)));
					};

					options.format.write_vertex(writer, &vertex)?;
					stats.vertices += 1;
				}

				stats.faces += 1;
			}
		}

		// reversed so the first child is popped first
		for child in node.children.iter().rev() {
			stack.push((child, world_transform, depth + 1));
		}
	}

	if stats.non_triangular_faces != 0 {
		tracing::warn!("{} face(s) are not triangles", stats.non_triangular_faces);
	}

	Ok(stats)
}
