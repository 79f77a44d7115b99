use glam::{Mat4, Vec2, Vec3};

use crate::mafia::bytes::Cursor;
use crate::mafia::{DiagnosticKind, Diagnostics, Result};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
	/// Minimum corner.
	pub min: Vec3,
	/// Maximum corner.
	pub max: Vec3,
}

impl Bounds {
	pub(crate) fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
		Ok(Self {
			min: cursor.read_vec3()?,
			max: cursor.read_vec3()?,
		})
	}
}

/// Triangles sharing one material.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGroup {
	/// Triangle vertex indices.
	pub faces: Vec<[u16; 3]>,
	/// Zero-based material table index, `None` when untextured or dangling.
	pub material: Option<usize>,
}

/// One level of detail of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshLod {
	/// Distance up to which this LOD is drawn.
	pub clipping_range: f32,
	/// Vertex positions.
	pub positions: Vec<Vec3>,
	/// Vertex normals, index-aligned with `positions`.
	pub normals: Vec<Vec3>,
	/// Texture coordinates, index-aligned with `positions`.
	pub uvs: Vec<Vec2>,
	/// Material-partitioned triangles.
	pub face_groups: Vec<FaceGroup>,
}

impl MeshLod {
	/// Total triangles over all face groups.
	pub fn triangle_count(&self) -> usize {
		self.face_groups.iter().map(|group| group.faces.len()).sum()
	}

	/// Flattened triangle index list in face-group order.
	pub fn indices(&self) -> Vec<u32> {
		self.face_groups
			.iter()
			.flat_map(|group| group.faces.iter())
			.flat_map(|face| face.iter().map(|index| u32::from(*index)))
			.collect()
	}
}

/// Per-bone skinning data of a skinned LOD.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinBone {
	/// Inverse bind matrix.
	pub inverse_bind: Mat4,
	/// Vertices fully bound to this bone.
	pub locked_vertices: u32,
	/// Bone id matching a joint frame's bone id.
	pub bone_id: u32,
	/// Bone-local bounds.
	pub bounds: Bounds,
	/// Weights of the partially bound vertices following the locked run.
	pub weights: Vec<f32>,
}

/// Skinning data of one LOD.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinLod {
	/// Vertices not influenced by any bone.
	pub non_weighted_vertices: u32,
	/// Skinned bounds.
	pub bounds: Bounds,
	/// Bone bindings.
	pub bones: Vec<SkinBone>,
}

/// One morph channel of a LOD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphChannel {
	/// Per morphed vertex, one `(position, normal)` pair per target.
	pub vertices: Vec<Vec<(Vec3, Vec3)>>,
	/// Mesh vertex each morphed vertex replaces; `None` means the identity mapping.
	pub indices: Option<Vec<u16>>,
}

/// Morph targets of one LOD.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphLod {
	/// Channels in file order.
	pub channels: Vec<MorphChannel>,
	/// Morph bounds.
	pub bounds: Bounds,
	/// Morph bounding sphere centre.
	pub center: Vec3,
	/// Morph bounding sphere radius.
	pub radius: f32,
}

/// Morph target block of a morph visual.
#[derive(Debug, Clone, PartialEq)]
pub struct Morph {
	/// Targets per morphed vertex.
	pub targets: u8,
	/// Per-LOD channels.
	pub lods: Vec<MorphLod>,
}

/// Geometry owned by a model and referenced by mesh nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
	/// Zero-based index in the model's mesh table.
	pub id: usize,
	/// LODs, most detailed first.
	pub lods: Vec<MeshLod>,
	/// Per-LOD skinning for single-mesh visuals.
	pub skin: Vec<SkinLod>,
	/// Morph targets for morph visuals.
	pub morph: Option<Morph>,
}

impl MeshData {
	/// Most detailed LOD, if any.
	pub fn base_lod(&self) -> Option<&MeshLod> {
		self.lods.first()
	}
}

/// Object geometry block as stored: either an instance of an earlier frame or inline LODs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ObjectGeometry {
	Instance(u16),
	Inline(Vec<MeshLod>),
}

/// Decode an object geometry block.
///
/// Material ids are 1-based with 0 meaning untextured; out-of-range ids and faces that
/// index past the vertex list are dropped with a diagnostic against `subject`.
pub(crate) fn parse_object(cursor: &mut Cursor<'_>, material_count: usize, subject: &str, diags: &mut Diagnostics) -> Result<ObjectGeometry> {
	let instance_id = cursor.read_u16()?;
	if instance_id > 0 {
		return Ok(ObjectGeometry::Instance(instance_id));
	}

	let lod_count = cursor.read_u8()?;
	let mut lods = Vec::with_capacity(usize::from(lod_count));
	for _ in 0..lod_count {
		lods.push(parse_lod(cursor, material_count, subject, diags)?);
	}
	Ok(ObjectGeometry::Inline(lods))
}

fn parse_lod(cursor: &mut Cursor<'_>, material_count: usize, subject: &str, diags: &mut Diagnostics) -> Result<MeshLod> {
	let clipping_range = cursor.read_f32()?;
	let vertex_count = usize::from(cursor.read_u16()?);

	let mut positions = Vec::with_capacity(vertex_count);
	let mut normals = Vec::with_capacity(vertex_count);
	let mut uvs = Vec::with_capacity(vertex_count);
	for _ in 0..vertex_count {
		positions.push(cursor.read_vec3()?);
		normals.push(cursor.read_vec3()?);
		uvs.push(cursor.read_vec2()?);
	}

	let group_count = cursor.read_u8()?;
	let mut face_groups = Vec::with_capacity(usize::from(group_count));
	for _ in 0..group_count {
		let face_count = cursor.read_u16()?;
		let mut faces = Vec::with_capacity(usize::from(face_count));
		let mut dropped = None;
		for _ in 0..face_count {
			let face = [cursor.read_u16()?, cursor.read_u16()?, cursor.read_u16()?];
			match face.iter().find(|index| usize::from(**index) >= vertex_count) {
				Some(bad) => {
					dropped.get_or_insert(*bad);
				}
				None => faces.push(face),
			}
		}
		if let Some(index) = dropped {
			diags.push(
				subject,
				DiagnosticKind::DanglingReference {
					what: "vertex",
					index: u32::from(index),
				},
			);
		}

		let material_id = cursor.read_u16()?;
		let material = match usize::from(material_id) {
			0 => None,
			id if id <= material_count => Some(id - 1),
			_ => {
				diags.push(
					subject,
					DiagnosticKind::DanglingReference {
						what: "material",
						index: u32::from(material_id),
					},
				);
				None
			}
		};

		face_groups.push(FaceGroup { faces, material });
	}

	Ok(MeshLod {
		clipping_range,
		positions,
		normals,
		uvs,
		face_groups,
	})
}

/// Decode one skin block per LOD.
pub(crate) fn parse_skin(cursor: &mut Cursor<'_>, lod_count: usize) -> Result<Vec<SkinLod>> {
	let mut lods = Vec::with_capacity(lod_count);
	for _ in 0..lod_count {
		let bone_count = cursor.read_u8()?;
		let non_weighted_vertices = cursor.read_u32()?;
		let bounds = Bounds::parse(cursor)?;

		let mut bones = Vec::with_capacity(usize::from(bone_count));
		for _ in 0..bone_count {
			let inverse_bind = cursor.read_mat4()?;
			let locked_vertices = cursor.read_u32()?;
			let weighted = cursor.read_u32()? as usize;
			let bone_id = cursor.read_u32()?;
			let bounds = Bounds::parse(cursor)?;

			cursor.ensure(weighted.saturating_mul(4))?;
			let mut weights = Vec::with_capacity(weighted);
			for _ in 0..weighted {
				weights.push(cursor.read_f32()?);
			}

			bones.push(SkinBone {
				inverse_bind,
				locked_vertices,
				bone_id,
				bounds,
				weights,
			});
		}

		lods.push(SkinLod {
			non_weighted_vertices,
			bounds,
			bones,
		});
	}
	Ok(lods)
}

/// Decode a morph block; a zero target count ends the block immediately.
pub(crate) fn parse_morph(cursor: &mut Cursor<'_>) -> Result<Option<Morph>> {
	let targets = cursor.read_u8()?;
	if targets == 0 {
		return Ok(None);
	}

	let channel_count = cursor.read_u8()?;
	let lod_count = cursor.read_u8()?;

	let mut lods = Vec::with_capacity(usize::from(lod_count));
	for _ in 0..lod_count {
		let mut channels = Vec::with_capacity(usize::from(channel_count));
		for _ in 0..channel_count {
			let vertex_count = usize::from(cursor.read_u16()?);
			if vertex_count == 0 {
				channels.push(MorphChannel::default());
				continue;
			}

			let mut vertices = Vec::with_capacity(vertex_count);
			for _ in 0..vertex_count {
				let mut per_target = Vec::with_capacity(usize::from(targets));
				for _ in 0..targets {
					per_target.push((cursor.read_vec3()?, cursor.read_vec3()?));
				}
				vertices.push(per_target);
			}

			let indices = if cursor.read_u8()? != 0 {
				let mut indices = Vec::with_capacity(vertex_count);
				for _ in 0..vertex_count {
					indices.push(cursor.read_u16()?);
				}
				Some(indices)
			} else {
				None
			};

			channels.push(MorphChannel { vertices, indices });
		}

		let bounds = Bounds::parse(cursor)?;
		let center = cursor.read_vec3()?;
		let radius = cursor.read_f32()?;
		lods.push(MorphLod {
			channels,
			bounds,
			center,
			radius,
		});
	}

	Ok(Some(Morph { targets, lods }))
}

#[cfg(test)]
mod tests;
