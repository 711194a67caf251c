use glam::{ Mat4, Vec2, Vec3, };

use crate::scene::Mesh;

/// The unit of output: one record per face index.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatVertex {
	/// Vertex color, RGB. Zero when the mesh has no color channel.
	pub color: Vec3,
	/// Copied from the mesh untransformed. Zero when the mesh has no normals.
	pub normal: Vec3,
	/// Mesh position with the node transform applied.
	pub position: Vec3,
	/// Zero when the mesh has no texture coordinate channel.
	pub tex_coord: Vec2,
}

impl FlatVertex {
	/// Resolves the vertex at `index` of `mesh`. Returns `None` if `index` is outside of any attribute array the mesh
	/// carries.
	pub fn from_mesh(mesh: &Mesh, index: u32, transform: &Mat4) -> Option<FlatVertex> {
		let index = index as usize;

		let position = transform.transform_point3(*mesh.positions.get(index)?);

		let normal = match mesh.normals.as_ref() {
			Some(normals) => *normals.get(index)?,
			None => Vec3::ZERO,
		};

		let color = match mesh.color_channel() {
			Some(colors) => colors.get(index)?.truncate(),
			None => Vec3::ZERO,
		};

		let tex_coord = match mesh.tex_coord_channel() {
			Some(tex_coords) => *tex_coords.get(index)?,
			None => Vec2::ZERO,
		};

		Some(FlatVertex {
			color,
			normal,
			position,
			tex_coord,
		})
	}
}
