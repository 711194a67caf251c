use glam::{ Mat4, Vec2, Vec3, Vec4, };
use roxmltree::Node;
use std::collections::HashMap;
use std::path::Path;

use crate::error::ImportError;
use crate::scene::{ Face, Mesh, Scene, SceneNode, };

use super::parse_error;

/// `<instance_node>` can point back up the tree, this only guards against files that do that.
const MAX_NODE_DEPTH: usize = 1024;

type Ids<'a, 'input> = HashMap<&'a str, Node<'a, 'input>>;

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
	node.children().find(|child| child.is_element() && child.tag_name().name() == name)
}

fn children<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
	node.children().filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn numbers<T: std::str::FromStr>(path: &Path, node: Node) -> Result<Vec<T>, ImportError> {
	node.text()
		.unwrap_or_default()
		.split_whitespace()
		.map(|value| value.parse::<T>().map_err(|_| parse_error(path, format!("'{}' is not a number", value))))
		.collect()
}

/// Looks up the element a `#id` reference points at.
fn resolve<'a, 'input>(ids: &Ids<'a, 'input>, url: &str) -> Option<Node<'a, 'input>> {
	ids.get(url.trim_start_matches('#')).copied()
}

/// Loads a COLLADA 1.4/1.5 document. Each `<triangles>`, `<polylist>`, `<polygons>` or `<lines>` element becomes its own
/// mesh. Every polygon corner gets its own vertex, since COLLADA indexes each attribute separately.
pub(crate) fn load(path: &Path) -> Result<Scene, ImportError> {
	let text = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
		path: path.to_path_buf(),
		source,
	})?;

	let document = roxmltree::Document::parse(&text).map_err(|error| parse_error(path, error))?;
	let collada = document.root_element();
	if collada.tag_name().name() != "COLLADA" {
		return Err(parse_error(path, format!("root element is <{}>", collada.tag_name().name())));
	}

	let ids: Ids = collada.descendants()
		.filter_map(|node| node.attribute("id").map(|id| (id, node)))
		.collect();

	let mut meshes = Vec::new();
	let mut geometry_map = HashMap::new();
	for geometry in collada.descendants().filter(|node| node.is_element() && node.tag_name().name() == "geometry") {
		let Some(id) = geometry.attribute("id") else {
			continue;
		};

		let Some(mesh) = child(geometry, "mesh") else {
			tracing::debug!("skipping geometry '{}' without a <mesh>", id);
			continue;
		};

		let geometry_name = geometry.attribute("name").unwrap_or(id);
		let mut indices = Vec::new();
		for primitive in mesh.children().filter(|node| node.is_element()) {
			let name = format!("{}#{}", geometry_name, indices.len());
			if let Some(converted) = load_primitive(path, &ids, primitive, &name)? {
				indices.push(meshes.len());
				meshes.push(converted);
			}
		}

		geometry_map.insert(id, indices);
	}

	let visual_scene = child(collada, "scene")
		.and_then(|scene| child(scene, "instance_visual_scene"))
		.and_then(|instance| instance.attribute("url"))
		.and_then(|url| resolve(&ids, url))
		.or_else(|| collada.descendants().find(|node| node.is_element() && node.tag_name().name() == "visual_scene"));

	let Some(visual_scene) = visual_scene else {
		return Err(ImportError::EmptyScene {
			path: path.to_path_buf(),
		});
	};

	let mut nodes = Vec::new();
	for node in children(visual_scene, "node") {
		nodes.push(parse_node(path, &ids, &geometry_map, node, 1)?);
	}

	let up_axis = child(collada, "asset")
		.and_then(|asset| child(asset, "up_axis"))
		.and_then(|up_axis| up_axis.text())
		.map(|up_axis| up_axis.trim())
		.unwrap_or("Y_UP");

	let name = visual_scene.attribute("name").or(visual_scene.attribute("id")).unwrap_or_default();
	let root = SceneNode::new(name, up_axis_transform(up_axis)).with_children(nodes);

	Ok(Scene::new(root, meshes))
}

/// Rotates a document's up axis onto +y.
fn up_axis_transform(up_axis: &str) -> Mat4 {
	match up_axis {
		"Z_UP" => Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2),
		"X_UP" => Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2),
		_ => Mat4::IDENTITY,
	}
}

fn parse_node(
	path: &Path, ids: &Ids, geometry_map: &HashMap<&str, Vec<usize>>, node: Node, depth: usize
) -> Result<SceneNode, ImportError> {
	if depth > MAX_NODE_DEPTH {
		return Err(parse_error(path, format!("node hierarchy deeper than {}", MAX_NODE_DEPTH)));
	}

	let mut transform = Mat4::IDENTITY;
	let mut meshes = Vec::new();
	let mut scene_children = Vec::new();
	for element in node.children().filter(|element| element.is_element()) {
		match element.tag_name().name() {
			"matrix" => {
				let values = numbers::<f32>(path, element)?;
				let Ok(values) = <[f32; 16]>::try_from(values.as_slice()) else {
					return Err(parse_error(path, "<matrix> needs 16 values"));
				};

				// stored row-major
				transform *= Mat4::from_cols_array(&values).transpose();
			},
			"translate" => {
				let values = numbers::<f32>(path, element)?;
				let [x, y, z] = <[f32; 3]>::try_from(values.as_slice())
					.map_err(|_| parse_error(path, "<translate> needs 3 values"))?;
				transform *= Mat4::from_translation(Vec3::new(x, y, z));
			},
			"rotate" => {
				let values = numbers::<f32>(path, element)?;
				let [x, y, z, angle] = <[f32; 4]>::try_from(values.as_slice())
					.map_err(|_| parse_error(path, "<rotate> needs 4 values"))?;
				let axis = Vec3::new(x, y, z);
				if axis.length_squared() > 0.0 {
					transform *= Mat4::from_axis_angle(axis.normalize(), angle.to_radians());
				}
			},
			"scale" => {
				let values = numbers::<f32>(path, element)?;
				let [x, y, z] = <[f32; 3]>::try_from(values.as_slice())
					.map_err(|_| parse_error(path, "<scale> needs 3 values"))?;
				transform *= Mat4::from_scale(Vec3::new(x, y, z));
			},
			"lookat" | "skew" => {
				tracing::warn!("ignoring <{}> transform on node {:?}", element.tag_name().name(), node.attribute("id"));
			},
			"instance_geometry" => {
				let url = element.attribute("url").unwrap_or_default();
				match geometry_map.get(url.trim_start_matches('#')) {
					Some(indices) => meshes.extend_from_slice(indices),
					None => tracing::warn!("node {:?} instances unknown geometry '{}'", node.attribute("id"), url),
				}
			},
			"instance_node" => {
				let url = element.attribute("url").unwrap_or_default();
				match resolve(ids, url) {
					Some(instanced) => scene_children.push(parse_node(path, ids, geometry_map, instanced, depth + 1)?),
					None => tracing::warn!("node {:?} instances unknown node '{}'", node.attribute("id"), url),
				}
			},
			"node" => scene_children.push(parse_node(path, ids, geometry_map, element, depth + 1)?),
			_ => {},
		}
	}

	let name = node.attribute("name").or(node.attribute("id")).unwrap_or_default();
	Ok(
		SceneNode::new(name, transform)
			.with_meshes(meshes)
			.with_children(scene_children)
	)
}

/// One attribute stream of a primitive: float data, how many floats each element takes, and which slot of every
/// `<p>` corner holds its index.
struct Channel {
	data: Vec<f32>,
	offset: usize,
	stride: usize,
}

impl Channel {
	fn get(&self, corner: &[u32], width: usize) -> Option<&[f32]> {
		let start = *corner.get(self.offset)? as usize * self.stride;
		self.data.get(start..start + width)
	}
}

fn read_source(path: &Path, ids: &Ids, url: &str, offset: usize) -> Result<Channel, ImportError> {
	let Some(source) = resolve(ids, url) else {
		return Err(parse_error(path, format!("missing source '{}'", url)));
	};

	let Some(float_array) = child(source, "float_array") else {
		return Err(parse_error(path, format!("source '{}' has no <float_array>", url)));
	};

	let stride = child(source, "technique_common")
		.and_then(|technique| child(technique, "accessor"))
		.and_then(|accessor| accessor.attribute("stride"))
		.and_then(|stride| stride.parse::<usize>().ok())
		.unwrap_or(1);

	Ok(Channel {
		data: numbers::<f32>(path, float_array)?,
		offset,
		stride,
	})
}

#[derive(Default)]
struct Channels {
	color: Option<Channel>,
	normal: Option<Channel>,
	position: Option<Channel>,
	/// Set number the texture coordinates came from. Only the lowest set is kept.
	tex_coord: Option<(usize, Channel)>,
}

impl Channels {
	fn add(&mut self, path: &Path, ids: &Ids, input: Node, offset: usize) -> Result<(), ImportError> {
		let semantic = input.attribute("semantic").unwrap_or_default();
		let source = input.attribute("source").unwrap_or_default();
		match semantic {
			"POSITION" => self.position = Some(read_source(path, ids, source, offset)?),
			"NORMAL" => self.normal = Some(read_source(path, ids, source, offset)?),
			"COLOR" => self.color = Some(read_source(path, ids, source, offset)?),
			"TEXCOORD" => {
				let set = input.attribute("set").and_then(|set| set.parse::<usize>().ok()).unwrap_or(0);
				if self.tex_coord.as_ref().map_or(true, |(current, _)| set < *current) {
					self.tex_coord = Some((set, read_source(path, ids, source, offset)?));
				}
			},
			"VERTEX" => {
				let Some(vertices) = resolve(ids, source) else {
					return Err(parse_error(path, format!("missing vertices '{}'", source)));
				};

				// the attributes of <vertices> share the VERTEX index
				for vertex_input in children(vertices, "input") {
					self.add(path, ids, vertex_input, offset)?;
				}
			},
			_ => {},
		}

		Ok(())
	}
}

/// Converts one primitive element. Returns `None` for elements that are not primitives or cannot be expressed as faces.
fn load_primitive(path: &Path, ids: &Ids, primitive: Node, name: &str) -> Result<Option<Mesh>, ImportError> {
	let kind = primitive.tag_name().name();
	match kind {
		"triangles" | "polylist" | "polygons" | "lines" => {},
		"trifans" | "tristrips" | "linestrips" => {
			tracing::warn!("skipping primitive '{}' with unsupported element <{}>", name, kind);
			return Ok(None);
		},
		_ => return Ok(None),
	}

	let mut channels = Channels::default();
	let mut slots = 1;
	for input in children(primitive, "input") {
		let offset = input.attribute("offset").and_then(|offset| offset.parse::<usize>().ok()).unwrap_or(0);
		slots = std::cmp::max(slots, offset + 1);
		channels.add(path, ids, input, offset)?;
	}

	let Some(position) = channels.position.as_ref() else {
		tracing::warn!("skipping primitive '{}' without positions", name);
		return Ok(None);
	};

	// every entry in `arities` is one face, counted in corners
	let mut indices = Vec::new();
	let arities = match kind {
		"polygons" => {
			let mut arities = Vec::new();
			for polygon in children(primitive, "p") {
				let polygon = numbers::<u32>(path, polygon)?;
				let arity = polygon.len() / slots;
				arities.push(arity);
				indices.extend_from_slice(&polygon[..arity * slots]);
			}
			arities
		},
		_ => {
			if let Some(p) = child(primitive, "p") {
				indices = numbers::<u32>(path, p)?;
			}

			match kind {
				"polylist" => match child(primitive, "vcount") {
					Some(vcount) => numbers::<usize>(path, vcount)?,
					None => Vec::new(),
				},
				"lines" => vec![2; indices.len() / slots / 2],
				_ => vec![3; indices.len() / slots / 3],
			}
		},
	};

	let corners = arities.iter().sum::<usize>();
	if corners * slots > indices.len() {
		return Err(parse_error(path, format!("primitive '{}' has fewer indices than its faces need", name)));
	}

	let out_of_range = || parse_error(path, format!("primitive '{}' indexes past the end of a source", name));

	let mut positions = Vec::with_capacity(corners);
	let mut normals = Vec::with_capacity(corners);
	let mut colors = Vec::with_capacity(corners);
	let mut tex_coords = Vec::with_capacity(corners);
	for corner in indices.chunks_exact(slots).take(corners) {
		let value = position.get(corner, 3).ok_or_else(out_of_range)?;
		positions.push(Vec3::new(value[0], value[1], value[2]));

		if let Some(normal) = channels.normal.as_ref() {
			let value = normal.get(corner, 3).ok_or_else(out_of_range)?;
			normals.push(Vec3::new(value[0], value[1], value[2]));
		}

		if let Some(color) = channels.color.as_ref() {
			let width = std::cmp::min(std::cmp::max(color.stride, 3), 4);
			let value = color.get(corner, width).ok_or_else(out_of_range)?;
			colors.push(Vec4::new(value[0], value[1], value[2], value.get(3).copied().unwrap_or(1.0)));
		}

		if let Some((_, tex_coord)) = channels.tex_coord.as_ref() {
			let value = tex_coord.get(corner, 2).ok_or_else(out_of_range)?;
			tex_coords.push(Vec2::new(value[0], value[1]));
		}
	}

	let mut faces = Vec::with_capacity(arities.len());
	let mut next = 0;
	for arity in arities {
		faces.push(Face::new((next..next + arity as u32).collect()));
		next += arity as u32;
	}

	let mut mesh = Mesh::new(name, positions, faces);
	if channels.normal.is_some() {
		mesh.normals = Some(normals);
	}

	if channels.color.is_some() {
		mesh.colors.push(colors);
	}

	if channels.tex_coord.is_some() {
		mesh.tex_coords.push(tex_coords);
	}

	tracing::debug!("dae primitive '{}': {} corners, {} faces", name, corners, mesh.faces.len());

	Ok(Some(mesh))
}
