use glam::{ Vec2, Vec3, Vec4, };

/// An ordered list of indices into a mesh's vertex arrays. Triangulated meshes have three indices per face, but lines,
/// points and untriangulated polygons are representable too.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Face {
	pub indices: Vec<u32>,
}

impl Face {
	pub fn new(indices: Vec<u32>) -> Self {
		Face {
			indices,
		}
	}

	pub fn triangle(a: u32, b: u32, c: u32) -> Self {
		Face {
			indices: vec![a, b, c],
		}
	}

	pub fn is_triangle(&self) -> bool {
		self.indices.len() == 3
	}
}

/// Which optional vertex attributes a mesh carries. Only the first color and texture coordinate channels count.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AttributeLayout {
	pub color: bool,
	pub normal: bool,
	pub tex_coord: bool,
}

/// Indexed mesh data. Every per-vertex array runs parallel to `positions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
	/// Vertex color channels. Colors are RGBA.
	pub colors: Vec<Vec<Vec4>>,
	pub faces: Vec<Face>,
	pub name: String,
	pub normals: Option<Vec<Vec3>>,
	pub positions: Vec<Vec3>,
	/// Texture coordinate channels.
	pub tex_coords: Vec<Vec<Vec2>>,
}

impl Mesh {
	pub fn new(name: &str, positions: Vec<Vec3>, faces: Vec<Face>) -> Self {
		Mesh {
			faces,
			name: name.to_string(),
			positions,
			..Mesh::default()
		}
	}

	/// The color channel the flattener reads from.
	pub fn color_channel(&self) -> Option<&[Vec4]> {
		self.colors.first().map(|channel| channel.as_slice())
	}

	/// The texture coordinate channel the flattener reads from.
	pub fn tex_coord_channel(&self) -> Option<&[Vec2]> {
		self.tex_coords.first().map(|channel| channel.as_slice())
	}

	pub fn layout(&self) -> AttributeLayout {
		AttributeLayout {
			color: self.color_channel().is_some(),
			normal: self.normals.is_some(),
			tex_coord: self.tex_coord_channel().is_some(),
		}
	}

	/// Whether every attribute the flattener reads is as long as `positions`.
	pub fn is_consistent(&self) -> bool {
		let length = self.positions.len();
		self.normals.as_ref().map_or(true, |normals| normals.len() == length)
			&& self.color_channel().map_or(true, |colors| colors.len() == length)
			&& self.tex_coord_channel().map_or(true, |tex_coords| tex_coords.len() == length)
	}

	/// Whether every face index points at an existing vertex.
	pub fn indices_in_range(&self) -> bool {
		let length = self.positions.len();
		self.faces.iter().all(|face| face.indices.iter().all(|index| (*index as usize) < length))
	}

	/// Amount of flat vertices this mesh expands into: one per face index.
	pub fn flat_vertex_count(&self) -> usize {
		self.faces.iter().map(|face| face.indices.len()).sum()
	}

	/// Appends `other` to this mesh. Only the first color and texture coordinate channels are kept, and both meshes are
	/// expected to share the same `AttributeLayout`.
	pub(crate) fn append(&mut self, other: &Mesh) {
		let offset = self.positions.len() as u32;

		self.positions.extend_from_slice(&other.positions);

		if let (Some(normals), Some(other_normals)) = (self.normals.as_mut(), other.normals.as_ref()) {
			normals.extend_from_slice(other_normals);
		}

		self.colors.truncate(1);
		if let (Some(colors), Some(other_colors)) = (self.colors.first_mut(), other.color_channel()) {
			colors.extend_from_slice(other_colors);
		}

		self.tex_coords.truncate(1);
		if let (Some(tex_coords), Some(other_tex_coords)) = (self.tex_coords.first_mut(), other.tex_coord_channel()) {
			tex_coords.extend_from_slice(other_tex_coords);
		}

		for face in other.faces.iter() {
			self.faces.push(Face::new(face.indices.iter().map(|index| index + offset).collect()));
		}
	}
}
