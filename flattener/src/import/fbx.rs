use anyhow::Context;
use fbxcel_dom::any::AnyDocument;
use fbxcel_dom::v7400::data::mesh::{ PolygonVertex, PolygonVertices, };
use fbxcel_dom::v7400::data::mesh::layer::TypedLayerElementHandle;
use fbxcel_dom::v7400::object::TypedObjectHandle;
use fbxcel_dom::v7400::object::geometry::MeshHandle;
use fbxcel_dom::v7400::object::model::TypedModelHandle;
use glam::{ Mat4, Vec2, Vec3, Vec4, };
use std::io::BufReader;
use std::path::Path;

use crate::error::ImportError;
use crate::scene::{ Face, Mesh, Scene, SceneNode, };

use super::parse_error;

/// Splits a polygon into a fan of triangles around its first vertex.
fn triangulator(
	_: &PolygonVertices, polygon: &[PolygonVertex], triangles: &mut Vec<[PolygonVertex; 3]>
) -> anyhow::Result<()> {
	if polygon.len() < 3 {
		anyhow::bail!("Polygon with {} vertices cannot be triangulated", polygon.len());
	}

	for pair in polygon[1..].windows(2) {
		triangles.push([polygon[0], pair[0], pair[1]]);
	}

	Ok(())
}

/// Rotation in degrees, applied x first, then y, then z (FBX's default `eEulerXYZ` order).
fn euler_xyz(degrees: [f64; 3]) -> Mat4 {
	let [x, y, z] = degrees.map(|angle| (angle as f32).to_radians());
	Mat4::from_rotation_z(z) * Mat4::from_rotation_y(y) * Mat4::from_rotation_x(x)
}

/// Composes a model's local transform from its `Lcl Translation`, `PreRotation`, `Lcl Rotation` and `Lcl Scaling`
/// properties. Pivots and offsets are not read.
fn local_transform(translation: [f64; 3], pre_rotation: [f64; 3], rotation: [f64; 3], scaling: [f64; 3]) -> Mat4 {
	let [x, y, z] = translation.map(|value| value as f32);
	let [sx, sy, sz] = scaling.map(|value| value as f32);
	Mat4::from_translation(Vec3::new(x, y, z))
		* euler_xyz(pre_rotation)
		* euler_xyz(rotation)
		* Mat4::from_scale(Vec3::new(sx, sy, sz))
}

/// Loads a binary FBX 7.4 file. Each mesh model becomes a child of the root node carrying the model's local transform.
/// Polygons are triangulated while loading and every triangle corner gets its own vertex so per polygon-vertex
/// attributes survive.
pub(crate) fn load(path: &Path) -> Result<Scene, ImportError> {
	let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
		path: path.to_path_buf(),
		source,
	})?;

	let document = AnyDocument::from_seekable_reader(BufReader::new(file)).map_err(|error| parse_error(path, error))?;

	let fbx_dom = match document {
		AnyDocument::V7400(_, fbx_dom) => fbx_dom, // note: this is the only FBX version supported
		_ => return Err(parse_error(path, "unsupported FBX version")),
	};

	let mut meshes = Vec::new();
	let mut children = Vec::new();
	for object in fbx_dom.objects() {
		if let TypedObjectHandle::Model(TypedModelHandle::Mesh(model)) = object.get_typed() {
			let name = model.name().unwrap_or_default();
			let properties = model.properties_by_native_typename("FbxNode");
			let vector = |property: &str, default: f64| {
				properties.get_property(property)
					.map(|property| property.value_part().iter().filter_map(|value| value.get_f64()).collect::<Vec<_>>())
					.and_then(|values| <[f64; 3]>::try_from(values.as_slice()).ok())
					.unwrap_or([default; 3])
			};

			let transform = local_transform(
				vector("Lcl Translation", 0.0),
				vector("PreRotation", 0.0),
				vector("Lcl Rotation", 0.0),
				vector("Lcl Scaling", 1.0),
			);

			let mesh = model.geometry()
				.and_then(|geometry| load_geometry(name, &geometry))
				.map_err(|error| parse_error(path, format!("{:#}", error)))?;

			tracing::debug!("fbx mesh '{}': {} faces", name, mesh.faces.len());

			children.push(SceneNode::new(name, transform).with_meshes(vec![meshes.len()]));
			meshes.push(mesh);
		}
	}

	if meshes.is_empty() {
		return Err(ImportError::EmptyScene {
			path: path.to_path_buf(),
		});
	}

	Ok(Scene::new(SceneNode::default().with_children(children), meshes))
}

fn load_geometry(name: &str, geometry: &MeshHandle) -> anyhow::Result<Mesh> {
	let triangulated_vertices = geometry
		.polygon_vertices()
		.context(format!("Could not get polygon vertices for mesh {:?}", name))?
		.triangulate_each(triangulator)
		.context(format!("Could not triangulate vertices for mesh {:?}", name))?;

	let mut raw_normals = None;
	let mut raw_tex_coords = None;
	let mut raw_colors = None;
	if let Some(layer) = geometry.layers().next() {
		for entry in layer.layer_element_entries() {
			match entry.typed_layer_element() {
				Ok(TypedLayerElementHandle::Normal(handle)) if raw_normals.is_none() => {
					raw_normals = Some(handle.normals().context(format!("Could not get normals for mesh {:?}", name))?);
				},
				Ok(TypedLayerElementHandle::Uv(handle)) if raw_tex_coords.is_none() => {
					raw_tex_coords = Some(handle.uv().context(format!("Could not get uvs for mesh {:?}", name))?);
				},
				Ok(TypedLayerElementHandle::Color(handle)) if raw_colors.is_none() => {
					raw_colors = Some(handle.color().context(format!("Could not get colors for mesh {:?}", name))?);
				},
				_ => {},
			}
		}
	}

	let mut positions = Vec::new();
	let mut normals = Vec::new();
	let mut tex_coords = Vec::new();
	let mut colors = Vec::new();
	for index in triangulated_vertices.triangle_vertex_indices() {
		let point = triangulated_vertices.control_point(index)
			.with_context(|| format!("Missing control point for mesh {:?}", name))?;
		positions.push(Vec3::new(point.x as f32, point.y as f32, point.z as f32));

		if let Some(raw_normals) = raw_normals.as_ref() {
			let normal = raw_normals.normal(&triangulated_vertices, index)?;
			normals.push(Vec3::new(normal.x as f32, normal.y as f32, normal.z as f32));
		}

		if let Some(raw_tex_coords) = raw_tex_coords.as_ref() {
			let uv = raw_tex_coords.uv(&triangulated_vertices, index)?;
			tex_coords.push(Vec2::new(uv.x as f32, uv.y as f32));
		}

		if let Some(raw_colors) = raw_colors.as_ref() {
			let color = raw_colors.color(&triangulated_vertices, index)?;
			colors.push(Vec4::new(color.r as f32, color.g as f32, color.b as f32, color.a as f32));
		}
	}

	let faces = (0..positions.len() as u32 / 3)
		.map(|triangle| Face::triangle(triangle * 3, triangle * 3 + 1, triangle * 3 + 2))
		.collect();

	let mut mesh = Mesh::new(name, positions, faces);
	if raw_normals.is_some() {
		mesh.normals = Some(normals);
	}

	if raw_tex_coords.is_some() {
		mesh.tex_coords.push(tex_coords);
	}

	if raw_colors.is_some() {
		mesh.colors.push(colors);
	}

	Ok(mesh)
}
