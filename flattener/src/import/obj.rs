use glam::{ Mat4, Vec2, Vec3, Vec4, };
use std::path::Path;

use crate::error::ImportError;
use crate::scene::{ Face, Mesh, Scene, SceneNode, };

/// Loads a Wavefront OBJ file. Every object or group becomes a child of the root node owning a single mesh. Faces are
/// kept as written, triangulation is left to post-processing.
pub(crate) fn load(path: &Path) -> Result<Scene, ImportError> {
	let options = tobj::LoadOptions {
		single_index: true,
		triangulate: false,
		..tobj::LoadOptions::default()
	};

	let (models, materials) = tobj::load_obj(path, &options).map_err(|error| ImportError::Parse {
		path: path.to_path_buf(),
		reason: error.to_string(),
	})?;

	if let Err(error) = materials {
		tracing::debug!("ignoring materials for {:?}: {}", path, error);
	}

	// tobj always emits a trailing model, even for files without any faces
	let models = models.into_iter()
		.filter(|model| !model.mesh.indices.is_empty())
		.collect::<Vec<tobj::Model>>();

	if models.is_empty() {
		return Err(ImportError::EmptyScene {
			path: path.to_path_buf(),
		});
	}

	let mut meshes = Vec::new();
	let mut children = Vec::new();
	for model in models.iter() {
		let mesh = convert_mesh(&model.name, &model.mesh);
		tracing::debug!("obj model '{}': {} vertices, {} faces", model.name, mesh.positions.len(), mesh.faces.len());

		children.push(SceneNode::new(&model.name, Mat4::IDENTITY).with_meshes(vec![meshes.len()]));
		meshes.push(mesh);
	}

	let root_name = path.file_stem()
		.and_then(|stem| stem.to_str())
		.unwrap_or_default();

	Ok(Scene::new(SceneNode::new(root_name, Mat4::IDENTITY).with_children(children), meshes))
}

fn convert_mesh(name: &str, mesh: &tobj::Mesh) -> Mesh {
	let positions = mesh.positions.chunks_exact(3)
		.map(|position| Vec3::new(position[0], position[1], position[2]))
		.collect::<Vec<Vec3>>();

	// face_arities is only filled in when the file has a face that is not a triangle
	let faces = if mesh.face_arities.is_empty() {
		mesh.indices.chunks_exact(3)
			.map(|indices| Face::new(indices.to_vec()))
			.collect::<Vec<Face>>()
	} else {
		let mut faces = Vec::with_capacity(mesh.face_arities.len());
		let mut start = 0;
		for arity in mesh.face_arities.iter() {
			let end = std::cmp::min(start + *arity as usize, mesh.indices.len());
			faces.push(Face::new(mesh.indices[start..end].to_vec()));
			start = end;
		}
		faces
	};

	let mut result = Mesh::new(name, positions, faces);

	// attributes that do not line up with the positions are treated as absent
	if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
		result.normals = Some(
			mesh.normals.chunks_exact(3)
				.map(|normal| Vec3::new(normal[0], normal[1], normal[2]))
				.collect()
		);
	}

	if !mesh.vertex_color.is_empty() && mesh.vertex_color.len() == mesh.positions.len() {
		result.colors.push(
			mesh.vertex_color.chunks_exact(3)
				.map(|color| Vec4::new(color[0], color[1], color[2], 1.0))
				.collect()
		);
	}

	if !mesh.texcoords.is_empty() && mesh.texcoords.len() / 2 == mesh.positions.len() / 3 {
		result.tex_coords.push(
			mesh.texcoords.chunks_exact(2)
				.map(|tex_coord| Vec2::new(tex_coord[0], tex_coord[1]))
				.collect()
		);
	}

	result
}
