use glam::{ Mat4, Vec2, Vec3, Vec4, };
use gltf::mesh::Mode;
use std::path::Path;

use crate::error::ImportError;
use crate::scene::{ Face, Mesh, Scene, SceneNode, };

use super::parse_error;

/// glTF forbids cycles in the node graph, this only guards against files that ignore that.
const MAX_NODE_DEPTH: usize = 1024;

/// Loads a `.gltf` or `.glb` file. Every primitive becomes its own mesh, and the scene's root nodes are gathered under a
/// synthetic root with an identity transform. Images are never decoded.
pub(crate) fn load(path: &Path) -> Result<Scene, ImportError> {
	let gltf::Gltf { document, blob, } = gltf::Gltf::open(path).map_err(|error| parse_error(path, error))?;
	let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(|error| parse_error(path, error))?;

	let Some(gltf_scene) = document.default_scene().or_else(|| document.scenes().next()) else {
		return Err(ImportError::EmptyScene {
			path: path.to_path_buf(),
		});
	};

	// meshes in glTF hold several primitives, `mesh_map` maps a glTF mesh index to the meshes built from its primitives
	let mut meshes = Vec::new();
	let mut mesh_map = Vec::new();
	for mesh in document.meshes() {
		let mut indices = Vec::new();
		for primitive in mesh.primitives() {
			let name = match mesh.name() {
				Some(name) => format!("{}#{}", name, primitive.index()),
				None => format!("mesh{}#{}", mesh.index(), primitive.index()),
			};

			if let Some(converted) = load_primitive(path, &name, &primitive, &buffers)? {
				indices.push(meshes.len());
				meshes.push(converted);
			}
		}
		mesh_map.push(indices);
	}

	let mut children = Vec::new();
	for node in gltf_scene.nodes() {
		children.push(parse_tree(path, &node, &mesh_map, 1)?);
	}

	let root = SceneNode::new(gltf_scene.name().unwrap_or_default(), Mat4::IDENTITY).with_children(children);
	Ok(Scene::new(root, meshes))
}

fn parse_tree(
	path: &Path, node: &gltf::Node, mesh_map: &[Vec<usize>], depth: usize
) -> Result<SceneNode, ImportError> {
	if depth > MAX_NODE_DEPTH {
		return Err(parse_error(path, format!("node hierarchy deeper than {}", MAX_NODE_DEPTH)));
	}

	let meshes = node.mesh()
		.and_then(|mesh| mesh_map.get(mesh.index()))
		.cloned()
		.unwrap_or_default();

	let mut children = Vec::new();
	for child in node.children() {
		children.push(parse_tree(path, &child, mesh_map, depth + 1)?);
	}

	let name = match node.name() {
		Some(name) => name.to_string(),
		None => format!("node{}", node.index()),
	};

	Ok(
		SceneNode::new(&name, Mat4::from_cols_array_2d(&node.transform().matrix()))
			.with_meshes(meshes)
			.with_children(children)
	)
}

/// Converts one primitive. Returns `None` for primitives that cannot be expressed as faces.
fn load_primitive(
	path: &Path, name: &str, primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]
) -> Result<Option<Mesh>, ImportError> {
	let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

	let Some(positions) = reader.read_positions() else {
		tracing::warn!("skipping primitive '{}' without positions", name);
		return Ok(None);
	};
	let positions = positions.map(Vec3::from_array).collect::<Vec<Vec3>>();

	let indices = match reader.read_indices() {
		Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
		None => (0..positions.len() as u32).collect(),
	};

	let faces = match primitive.mode() {
		Mode::Triangles => chunk_faces(&indices, 3),
		Mode::Lines => chunk_faces(&indices, 2),
		Mode::Points => chunk_faces(&indices, 1),
		Mode::TriangleStrip => {
			indices.windows(3)
				.enumerate()
				.map(|(index, window)| {
					// every other triangle in a strip has its winding flipped
					if index % 2 == 0 {
						Face::triangle(window[0], window[1], window[2])
					} else {
						Face::triangle(window[1], window[0], window[2])
					}
				})
				.collect()
		},
		Mode::TriangleFan => {
			if indices.len() < 3 {
				Vec::new()
			} else {
				indices[1..].windows(2)
					.map(|pair| Face::triangle(indices[0], pair[0], pair[1]))
					.collect()
			}
		},
		mode => {
			tracing::warn!("skipping primitive '{}' with unsupported mode {:?}", name, mode);
			return Ok(None);
		},
	};

	let mut mesh = Mesh::new(name, positions, faces);

	if let Some(normals) = reader.read_normals() {
		mesh.normals = Some(normals.map(Vec3::from_array).collect());
	}

	if let Some(colors) = reader.read_colors(0) {
		mesh.colors.push(colors.into_rgba_f32().map(Vec4::from_array).collect());
	}

	if let Some(tex_coords) = reader.read_tex_coords(0) {
		mesh.tex_coords.push(tex_coords.into_f32().map(Vec2::from_array).collect());
	}

	if !mesh.is_consistent() {
		return Err(parse_error(path, format!("attributes of primitive '{}' differ in length", name)));
	}

	tracing::debug!("gltf primitive '{}': {} vertices, {} faces", name, mesh.positions.len(), mesh.faces.len());

	Ok(Some(mesh))
}

/// Splits a flat index list into faces of `size` indices. A trailing partial face is dropped.
fn chunk_faces(indices: &[u32], size: usize) -> Vec<Face> {
	indices.chunks_exact(size)
		.map(|chunk| Face::new(chunk.to_vec()))
		.collect()
}
