mod mesh;
mod node;
pub mod post_process;

pub use mesh::{ AttributeLayout, Face, Mesh, };
pub use node::SceneNode;
pub use post_process::ImportFlags;

/// A scene graph produced by an importer. Nodes reference meshes by their index into `meshes`, so one mesh can be
/// instanced by several nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub meshes: Vec<Mesh>,
	pub root: SceneNode,
}

/// Counts gathered by walking a scene without flattening it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SceneSummary {
	pub depth: usize,
	/// Faces referenced by nodes. Instanced meshes are counted once per instance.
	pub faces: usize,
	pub mesh_references: usize,
	pub meshes: usize,
	pub nodes: usize,
	/// Flat vertices the scene expands into.
	pub vertices: usize,
}

impl Scene {
	pub fn new(root: SceneNode, meshes: Vec<Mesh>) -> Self {
		Scene {
			meshes,
			root,
		}
	}

	/// Walks the whole tree and counts what a flatten pass would produce. Mesh references that point outside of
	/// `meshes` are counted as references but contribute no faces.
	pub fn summary(&self) -> SceneSummary {
		let mut summary = SceneSummary {
			meshes: self.meshes.len(),
			..SceneSummary::default()
		};

		let mut stack = vec![(&self.root, 0)];
		while let Some((node, depth)) = stack.pop() {
			summary.nodes += 1;
			summary.depth = std::cmp::max(summary.depth, depth);

			for mesh in node.meshes.iter().filter_map(|index| self.meshes.get(*index)) {
				summary.faces += mesh.faces.len();
				summary.vertices += mesh.flat_vertex_count();
			}
			summary.mesh_references += node.meshes.len();

			stack.extend(node.children.iter().map(|child| (child, depth + 1)));
		}

		summary
	}
}
