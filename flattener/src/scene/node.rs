use glam::Mat4;

/// Represents a node in a scene tree. The transform is relative to the parent node.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
	pub children: Vec<SceneNode>,
	/// Indices into `Scene::meshes`.
	pub meshes: Vec<usize>,
	pub name: String,
	pub transform: Mat4,
}

impl Default for SceneNode {
	fn default() -> Self {
		SceneNode {
			children: Vec::new(),
			meshes: Vec::new(),
			name: String::new(),
			transform: Mat4::IDENTITY,
		}
	}
}

impl SceneNode {
	pub fn new(name: &str, transform: Mat4) -> Self {
		SceneNode {
			name: name.to_string(),
			transform,
			..SceneNode::default()
		}
	}

	pub fn with_meshes(mut self, meshes: Vec<usize>) -> Self {
		self.meshes = meshes;
		self
	}

	pub fn with_children(mut self, children: Vec<SceneNode>) -> Self {
		self.children = children;
		self
	}
}
