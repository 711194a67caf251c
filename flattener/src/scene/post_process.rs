use glam::{ Mat4, Vec3, };
use serde::{ Deserialize, Serialize, };

use super::{ AttributeLayout, Face, Mesh, Scene, SceneNode, };

/// Post-processing steps an importer runs on a freshly parsed scene.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ImportFlags {
	/// Split every face with more than three indices into a triangle fan.
	pub triangulate: bool,
	/// Mirror the scene along the z axis, flip the v texture coordinate and reverse face winding.
	pub make_left_handed: bool,
	/// Merge consecutive meshes on a node that share an attribute layout.
	pub optimize_meshes: bool,
}

impl Default for ImportFlags {
	fn default() -> Self {
		ImportFlags {
			triangulate: true,
			make_left_handed: true,
			optimize_meshes: true,
		}
	}
}

impl ImportFlags {
	/// Leave the scene exactly as parsed.
	pub const NONE: ImportFlags = ImportFlags {
		triangulate: false,
		make_left_handed: false,
		optimize_meshes: false,
	};
}

/// Runs the steps requested by `flags` in order: triangulation, handedness conversion, mesh merging.
pub fn apply(scene: &mut Scene, flags: ImportFlags) {
	if flags.triangulate {
		let split = scene.meshes.iter_mut().map(triangulate).sum::<usize>();
		if split != 0 {
			tracing::debug!("triangulated {} polygon(s)", split);
		}
	}

	if flags.make_left_handed {
		make_left_handed(scene);
	}

	if flags.optimize_meshes {
		let merged = optimize_meshes(scene);
		if merged != 0 {
			tracing::debug!("merged {} mesh reference(s)", merged);
		}
	}
}

/// Replaces every face with more than three indices by a fan of triangles sharing its first index. Lines and points are
/// left as they are. Returns the amount of faces that were split.
fn triangulate(mesh: &mut Mesh) -> usize {
	if mesh.faces.iter().all(|face| face.indices.len() <= 3) {
		return 0;
	}

	let mut split = 0;
	let mut faces = Vec::with_capacity(mesh.faces.len());
	for face in mesh.faces.drain(..) {
		if face.indices.len() <= 3 {
			faces.push(face);
			continue;
		}

		split += 1;
		for pair in face.indices[1..].windows(2) {
			faces.push(Face::triangle(face.indices[0], pair[0], pair[1]));
		}
	}

	mesh.faces = faces;
	split
}

/// Converts a right-handed scene into a left-handed one by mirroring the z axis. Node transforms are conjugated by the
/// mirror so that the hierarchy composes the same way it did before.
fn make_left_handed(scene: &mut Scene) {
	let mirror = Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0));

	for mesh in scene.meshes.iter_mut() {
		for position in mesh.positions.iter_mut() {
			position.z = -position.z;
		}

		if let Some(normals) = mesh.normals.as_mut() {
			for normal in normals.iter_mut() {
				normal.z = -normal.z;
			}
		}

		for channel in mesh.tex_coords.iter_mut() {
			for tex_coord in channel.iter_mut() {
				tex_coord.y = 1.0 - tex_coord.y;
			}
		}

		// mirroring flips the winding, so flip it back
		for face in mesh.faces.iter_mut() {
			face.indices.reverse();
		}
	}

	let mut stack = vec![&mut scene.root];
	while let Some(node) = stack.pop() {
		node.transform = mirror * node.transform * mirror;
		stack.extend(node.children.iter_mut());
	}
}

/// Merges runs of consecutive mesh references on a node whose meshes share an `AttributeLayout`. Flattened output is
/// unchanged since the merged mesh lists faces in the same order. Meshes no longer referenced are dropped. Returns the
/// amount of references that were folded away.
fn optimize_meshes(scene: &mut Scene) -> usize {
	let mesh_count = scene.meshes.len();

	// invalid scenes are rejected by the flattener, leave them alone so the error points at the original indices
	let mut all_valid = true;
	let mut stack = vec![&scene.root];
	while let Some(node) = stack.pop() {
		all_valid &= node.meshes.iter().all(|index| *index < mesh_count);
		stack.extend(node.children.iter());
	}

	if !all_valid {
		tracing::warn!("scene references meshes that do not exist, skipping mesh optimization");
		return 0;
	}

	let mergeable = |meshes: &Vec<Mesh>, index: usize| -> Option<AttributeLayout> {
		// merging rebases indices, so an index past the end would land on the next mesh's vertices
		let mesh = &meshes[index];
		if mesh.is_consistent() && mesh.indices_in_range() {
			Some(mesh.layout())
		} else {
			None
		}
	};

	let meshes = &mut scene.meshes;
	let mut folded = 0;
	let mut stack = vec![&mut scene.root];
	while let Some(node) = stack.pop() {
		let mut groups: Vec<Vec<usize>> = Vec::new();
		for index in node.meshes.iter().copied() {
			let layout = mergeable(meshes, index);
			match groups.last_mut() {
				Some(group) if layout.is_some() && mergeable(meshes, group[0]) == layout => group.push(index),
				_ => groups.push(vec![index]),
			}
		}

		let mut references = Vec::with_capacity(groups.len());
		for group in groups {
			if group.len() == 1 {
				references.push(group[0]);
				continue;
			}

			folded += group.len() - 1;

			let mut merged = meshes[group[0]].clone();
			for index in group[1..].iter() {
				merged.append(&meshes[*index]);
			}

			references.push(meshes.len());
			meshes.push(merged);
		}

		node.meshes = references;
		stack.extend(node.children.iter_mut());
	}

	if folded != 0 {
		compact_meshes(meshes, &mut scene.root);
	}

	folded
}

/// Drops meshes no node references and renumbers the references that remain.
fn compact_meshes(meshes: &mut Vec<Mesh>, root: &mut SceneNode) {
	let mut used = vec![false; meshes.len()];
	let mut stack = vec![&*root];
	while let Some(node) = stack.pop() {
		for index in node.meshes.iter() {
			used[*index] = true;
		}
		stack.extend(node.children.iter());
	}

	let mut remap = vec![0; meshes.len()];
	let mut next = 0;
	for (index, is_used) in used.iter().enumerate() {
		remap[index] = next;
		if *is_used {
			next += 1;
		}
	}

	let mut index = 0;
	meshes.retain(|_| {
		let keep = used[index];
		index += 1;
		keep
	});

	let mut stack = vec![root];
	while let Some(node) = stack.pop() {
		for reference in node.meshes.iter_mut() {
			*reference = remap[*reference];
		}
		stack.extend(node.children.iter_mut());
	}
}

#[cfg(test)]
mod tests {
	use glam::{ Mat4, Vec2, Vec3, Vec4, };

	use crate::scene::{ Face, Mesh, Scene, SceneNode, };

	use super::{ ImportFlags, apply, };

	fn quad() -> Mesh {
		let mut mesh = Mesh::new(
			"quad",
			vec![Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 1.0, 1.0)],
			vec![Face::new(vec![0, 1, 2, 3]), Face::new(vec![0, 2])],
		);
		mesh.normals = Some(vec![Vec3::Z; 4]);
		mesh.tex_coords = vec![vec![Vec2::new(0.0, 0.25); 4]];
		mesh
	}

	fn only(flags: fn(&mut ImportFlags)) -> ImportFlags {
		let mut output = ImportFlags::NONE;
		flags(&mut output);
		output
	}

	#[test]
	fn triangulates_into_fans() {
		let mut scene = Scene::new(SceneNode::default().with_meshes(vec![0]), vec![quad()]);
		apply(&mut scene, only(|flags| flags.triangulate = true));

		assert_eq!(scene.meshes[0].faces, vec![Face::triangle(0, 1, 2), Face::triangle(0, 2, 3), Face::new(vec![0, 2])]);
	}

	#[test]
	fn left_handed_mirrors_z() {
		let translation = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
		let mut scene = Scene::new(
			SceneNode::new("root", translation).with_children(vec![SceneNode::new("child", translation).with_meshes(vec![0])]),
			vec![quad()],
		);
		apply(&mut scene, only(|flags| flags.make_left_handed = true));

		let mesh = &scene.meshes[0];
		assert_eq!(mesh.positions[1], Vec3::new(1.0, 0.0, -1.0));
		assert_eq!(mesh.normals.as_ref().unwrap()[0], Vec3::new(0.0, 0.0, -1.0));
		assert_eq!(mesh.tex_coords[0][0], Vec2::new(0.0, 0.75));
		assert_eq!(mesh.faces[0].indices, vec![3, 2, 1, 0]);

		let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, -3.0));
		assert_eq!(scene.root.transform, expected);
		assert_eq!(scene.root.children[0].transform, expected);
	}

	#[test]
	fn merges_consecutive_meshes_with_matching_layout() {
		let mut colored = quad();
		colored.colors = vec![vec![Vec4::ONE; 4]];

		let root = SceneNode::default()
			.with_meshes(vec![0, 1, 2, 0])
			.with_children(vec![SceneNode::default().with_meshes(vec![1])]);
		let mut scene = Scene::new(root, vec![quad(), quad(), colored]);
		let before = scene.summary();

		apply(&mut scene, only(|flags| flags.optimize_meshes = true));

		// [0, 1] merge, 2 differs in layout, the trailing 0 stands alone
		assert_eq!(scene.root.meshes.len(), 3);
		let merged = &scene.meshes[scene.root.meshes[0]];
		assert_eq!(merged.positions.len(), 8);
		assert_eq!(merged.faces[2], Face::new(vec![4, 5, 6, 7]));

		// mesh 1 is still referenced by the child, mesh 0 by the root, so only the merged mesh is new
		assert_eq!(scene.meshes.len(), 4);
		assert_eq!(scene.meshes[scene.root.children[0].meshes[0]], quad());

		let after = scene.summary();
		assert_eq!(before.vertices, after.vertices);
		assert_eq!(before.faces, after.faces);
	}

	#[test]
	fn drops_meshes_that_were_merged_away() {
		let mut scene = Scene::new(SceneNode::default().with_meshes(vec![0, 1]), vec![quad(), quad()]);
		apply(&mut scene, only(|flags| flags.optimize_meshes = true));

		assert_eq!(scene.meshes.len(), 1);
		assert_eq!(scene.root.meshes, vec![0]);
		assert_eq!(scene.meshes[0].faces.len(), 4);
	}

	#[test]
	fn invalid_references_are_not_optimized() {
		let mut scene = Scene::new(SceneNode::default().with_meshes(vec![0, 0, 5]), vec![quad()]);
		apply(&mut scene, only(|flags| flags.optimize_meshes = true));

		assert_eq!(scene.root.meshes, vec![0, 0, 5]);
		assert_eq!(scene.meshes.len(), 1);
	}

	#[test]
	fn meshes_with_stray_indices_are_not_merged() {
		let mut stray = Mesh::new("stray", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![Face::triangle(0, 1, 3)]);
		stray.normals = Some(vec![Vec3::Z; 3]);

		let mut neighbour = Mesh::new("neighbour", vec![Vec3::splat(5.0); 3], vec![Face::triangle(0, 1, 2)]);
		neighbour.normals = Some(vec![Vec3::Z; 3]);

		let mut scene = Scene::new(SceneNode::default().with_meshes(vec![0, 1]), vec![stray, neighbour]);
		apply(&mut scene, only(|flags| flags.optimize_meshes = true));

		assert_eq!(scene.root.meshes, vec![0, 1]);
		assert_eq!(scene.meshes[0].faces[0].indices, vec![0, 1, 3]);

		let result = crate::flatten_scene(&scene, &mut Vec::new(), &crate::FlattenOptions::default());
		assert!(matches!(result, Err(crate::FlattenError::InvalidScene(_))));
	}
}
