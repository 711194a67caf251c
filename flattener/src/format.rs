use std::io::Write;

use glam::{ Vec2, Vec3, };
use serde::{ Deserialize, Serialize, };

use crate::vertex::FlatVertex;

/// Multiplier applied to every component before it is truncated to an integer.
pub const SCALE_FACTOR: f32 = 1_000_000.0;

/// Scales `value` by `SCALE_FACTOR` in single precision and truncates toward zero. Out of range values saturate.
pub fn quantize(value: f32) -> i32 {
	(value * SCALE_FACTOR) as i32
}

pub fn dequantize(value: i32) -> f32 {
	value as f32 / SCALE_FACTOR
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FormatError {
	#[error("Expected {expected} fields, found {found}")]
	FieldCount {
		expected: usize,
		found: usize,
	},
	#[error("Could not parse field '{0}'")]
	Field(String),
}

/// Text encoding of a flat vertex. Each vertex is one line.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexFormat {
	/// Eleven lowercase hex fields holding the 32-bit pattern of each quantized component: position, normal, color,
	/// texture coordinate.
	#[default]
	Quantized,
	/// Eight decimal fields with six fractional digits: position, normal, texture coordinate.
	Float,
}

impl VertexFormat {
	pub fn field_count(&self) -> usize {
		match self {
			VertexFormat::Quantized => 11,
			VertexFormat::Float => 8,
		}
	}

	pub fn write_vertex<W: Write>(&self, writer: &mut W, vertex: &FlatVertex) -> std::io::Result<()> {
		let FlatVertex { color, normal, position, tex_coord, } = vertex;
		match self {
			VertexFormat::Quantized => {
				writeln!(
					writer,
					"{:x} {:x} {:x} {:x} {:x} {:x} {:x} {:x} {:x} {:x} {:x}",
					quantize(position.x), quantize(position.y), quantize(position.z),
					quantize(normal.x), quantize(normal.y), quantize(normal.z),
					quantize(color.x), quantize(color.y), quantize(color.z),
					quantize(tex_coord.x), quantize(tex_coord.y),
				)
			},
			VertexFormat::Float => {
				writeln!(
					writer,
					"{:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
					position.x, position.y, position.z,
					normal.x, normal.y, normal.z,
					tex_coord.x, tex_coord.y,
				)
			},
		}
	}

	/// Reads back one line written by `write_vertex`. Quantized fields come back within one truncation step of the
	/// original value, the float format carries no color.
	pub fn parse_line(&self, line: &str) -> Result<FlatVertex, FormatError> {
		let fields = line.split_whitespace().collect::<Vec<&str>>();
		if fields.len() != self.field_count() {
			return Err(FormatError::FieldCount {
				expected: self.field_count(),
				found: fields.len(),
			});
		}

		let values = match self {
			VertexFormat::Quantized => fields.iter()
				.map(|field| {
					u32::from_str_radix(field, 16)
						.map(|bits| dequantize(bits as i32))
						.map_err(|_| FormatError::Field(field.to_string()))
				})
				.collect::<Result<Vec<f32>, FormatError>>()?,
			VertexFormat::Float => fields.iter()
				.map(|field| field.parse::<f32>().map_err(|_| FormatError::Field(field.to_string())))
				.collect::<Result<Vec<f32>, FormatError>>()?,
		};

		let position = Vec3::new(values[0], values[1], values[2]);
		let normal = Vec3::new(values[3], values[4], values[5]);

		Ok(match self {
			VertexFormat::Quantized => FlatVertex {
				color: Vec3::new(values[6], values[7], values[8]),
				normal,
				position,
				tex_coord: Vec2::new(values[9], values[10]),
			},
			VertexFormat::Float => FlatVertex {
				color: Vec3::ZERO,
				normal,
				position,
				tex_coord: Vec2::new(values[6], values[7]),
			},
		})
	}
}
