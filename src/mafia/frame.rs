use glam::{Mat4, Vec3, Vec4};

use crate::mafia::bytes::Cursor;
use crate::mafia::mesh::{Bounds, MeshData, ObjectGeometry, parse_morph, parse_object, parse_skin};
use crate::mafia::{Diagnostics, Result, Transform};

/// Frame type codes.
pub mod frame_type {
	/// Visual (renderable) frame.
	pub const VISUAL: u8 = 1;
	/// Light frame.
	pub const LIGHT: u8 = 2;
	/// Camera frame.
	pub const CAMERA: u8 = 3;
	/// Sound frame.
	pub const SOUND: u8 = 4;
	/// Sector (visibility cell) frame.
	pub const SECTOR: u8 = 5;
	/// Dummy (empty) frame.
	pub const DUMMY: u8 = 6;
	/// Target frame.
	pub const TARGET: u8 = 7;
	/// User frame.
	pub const USER: u8 = 8;
	/// Model frame.
	pub const MODEL: u8 = 9;
	/// Joint (bone) frame.
	pub const JOINT: u8 = 10;
	/// Volume frame.
	pub const VOLUME: u8 = 11;
	/// Occluder frame.
	pub const OCCLUDER: u8 = 12;
	/// Scene frame.
	pub const SCENE: u8 = 13;
	/// Area frame.
	pub const AREA: u8 = 14;
	/// Landscape frame.
	pub const LANDSCAPE: u8 = 15;
}

/// Visual subtype of a visual frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualType {
	/// Static mesh.
	Object,
	/// Static mesh with baked lighting.
	LitObject,
	/// Skinned mesh.
	SingleMesh,
	/// Skinned mesh with morph targets.
	SingleMorph,
	/// Camera-facing mesh.
	Billboard,
	/// Mesh with morph targets.
	Morph,
	/// Lens flare.
	Lens,
	/// Projector.
	Projector,
	/// Mirror.
	Mirror,
	/// Particle emitter.
	Emitor,
	/// Shadow volume.
	Shadow,
	/// Landscape patch.
	LandPatch,
	/// Unassigned code.
	Other(u8),
}

impl VisualType {
	/// Map a raw visual type code.
	pub fn from_code(code: u8) -> Self {
		match code {
			0 => Self::Object,
			1 => Self::LitObject,
			2 => Self::SingleMesh,
			3 => Self::SingleMorph,
			4 => Self::Billboard,
			5 => Self::Morph,
			6 => Self::Lens,
			7 => Self::Projector,
			8 => Self::Mirror,
			9 => Self::Emitor,
			10 => Self::Shadow,
			11 => Self::LandPatch,
			other => Self::Other(other),
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Object => "object",
			Self::LitObject => "lit_object",
			Self::SingleMesh => "single_mesh",
			Self::SingleMorph => "single_morph",
			Self::Billboard => "billboard",
			Self::Morph => "morph",
			Self::Lens => "lens",
			Self::Projector => "projector",
			Self::Mirror => "mirror",
			Self::Emitor => "emitor",
			Self::Shadow => "shadow",
			Self::LandPatch => "land_patch",
			Self::Other(_) => "other",
		}
	}
}

/// Node-type tag of a model node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	/// Renderable mesh.
	Mesh(VisualType),
	/// Empty with bounds.
	Dummy,
	/// Look-at target.
	Target,
	/// Visibility sector.
	Sector,
	/// Occlusion hull.
	Occluder,
	/// Skeleton joint.
	Joint,
	/// Frame whose payload layout is unknown; kept opaque.
	Unsupported {
		/// Raw frame type.
		frame_type: u8,
		/// Raw visual type for visual frames.
		visual_type: Option<u8>,
	},
}

impl NodeKind {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Mesh(_) => "mesh",
			Self::Dummy => "dummy",
			Self::Target => "target",
			Self::Sector => "sector",
			Self::Occluder => "occluder",
			Self::Joint => "joint",
			Self::Unsupported { .. } => "unsupported",
		}
	}
}

/// Closed triangle hull used by sectors and occluders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hull {
	/// Vertex positions.
	pub positions: Vec<Vec3>,
	/// Triangles.
	pub faces: Vec<[u16; 3]>,
}

/// Portal polygon between sectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
	/// Plane equation.
	pub plane: Vec4,
	/// Raw flags.
	pub flags: u32,
	/// Near visibility range.
	pub near_range: f32,
	/// Far visibility range.
	pub far_range: f32,
	/// Polygon vertices.
	pub positions: Vec<Vec3>,
}

/// Sector payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
	/// Raw flag words.
	pub flags: [u32; 2],
	/// Sector hull.
	pub hull: Hull,
	/// Sector bounds.
	pub bounds: Bounds,
	/// Portals leaving the sector.
	pub portals: Vec<Portal>,
}

/// Type-specific data attached to a model node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
	/// No extra data.
	None,
	/// Dummy bounds.
	Dummy(Bounds),
	/// Target links (frame ids).
	Target {
		/// Raw flags.
		flags: u16,
		/// Linked frame ids.
		links: Vec<u16>,
	},
	/// Billboard orientation.
	Billboard {
		/// Rotation axis code.
		axis: u32,
		/// Rotation mode.
		mode: u8,
	},
	/// Sector geometry and portals.
	Sector(Sector),
	/// Occluder hull.
	Occluder(Hull),
	/// Joint bind matrix and bone id.
	Joint {
		/// Joint matrix.
		matrix: Mat4,
		/// Bone id referenced by skin blocks.
		bone_id: u32,
	},
}

/// One frame as decoded, before parent ids are resolved into tree links.
#[derive(Debug, Clone)]
pub(crate) struct RawFrame {
	pub name: String,
	pub kind: NodeKind,
	pub parent_id: u16,
	pub transform: Transform,
	pub culling_flags: u8,
	pub render_flags: [u8; 2],
	pub user_props: String,
	pub mesh: Option<usize>,
	pub instance_of: Option<u16>,
	pub data: NodeData,
}

/// Decode one frame; geometry blocks are appended to `meshes`.
///
/// Unsupported frames return with only their common header decoded; the caller must stop
/// reading frames afterwards because the payload length is unknown.
pub(crate) fn parse_frame(cursor: &mut Cursor<'_>, material_count: usize, meshes: &mut Vec<MeshData>, diags: &mut Diagnostics) -> Result<RawFrame> {
	let frame_type = cursor.read_u8()?;
	let (visual_type, render_flags) = if frame_type == frame_type::VISUAL {
		let visual = cursor.read_u8()?;
		let flags = [cursor.read_u8()?, cursor.read_u8()?];
		(Some(visual), flags)
	} else {
		(None, [0, 0])
	};

	let parent_id = cursor.read_u16()?;
	let position = cursor.read_vec3()?;
	let scale = cursor.read_vec3()?;
	let rotation = cursor.read_quat()?;
	let culling_flags = cursor.read_u8()?;
	let name = cursor.read_string8()?;
	let user_props = cursor.read_string8()?;

	log::debug!("frame {name:?} type={frame_type} visual={visual_type:?} parent={parent_id}");

	let mut frame = RawFrame {
		name,
		kind: NodeKind::Unsupported { frame_type, visual_type },
		parent_id,
		transform: Transform::new(position, rotation, scale),
		culling_flags,
		render_flags,
		user_props,
		mesh: None,
		instance_of: None,
		data: NodeData::None,
	};

	match (frame_type, visual_type.map(VisualType::from_code)) {
		(frame_type::VISUAL, Some(visual)) => parse_visual(cursor, visual, material_count, meshes, &mut frame, diags)?,
		(frame_type::DUMMY, _) => {
			frame.kind = NodeKind::Dummy;
			frame.data = NodeData::Dummy(Bounds::parse(cursor)?);
		}
		(frame_type::TARGET, _) => {
			let flags = cursor.read_u16()?;
			let count = cursor.read_u8()?;
			let mut links = Vec::with_capacity(usize::from(count));
			for _ in 0..count {
				links.push(cursor.read_u16()?);
			}
			frame.kind = NodeKind::Target;
			frame.data = NodeData::Target { flags, links };
		}
		(frame_type::SECTOR, _) => {
			frame.kind = NodeKind::Sector;
			frame.data = NodeData::Sector(parse_sector(cursor)?);
		}
		(frame_type::OCCLUDER, _) => {
			let vertex_count = cursor.read_u32()? as usize;
			let face_count = cursor.read_u32()? as usize;
			frame.kind = NodeKind::Occluder;
			frame.data = NodeData::Occluder(parse_hull(cursor, vertex_count, face_count)?);
		}
		(frame_type::JOINT, _) => {
			let matrix = cursor.read_mat4()?;
			let bone_id = cursor.read_u32()?;
			frame.kind = NodeKind::Joint;
			frame.data = NodeData::Joint { matrix, bone_id };
		}
		_ => {}
	}

	Ok(frame)
}

fn parse_visual(
	cursor: &mut Cursor<'_>,
	visual: VisualType,
	material_count: usize,
	meshes: &mut Vec<MeshData>,
	frame: &mut RawFrame,
	diags: &mut Diagnostics,
) -> Result<()> {
	let (skinned, morphed, billboard) = match visual {
		VisualType::Object | VisualType::LitObject => (false, false, false),
		VisualType::SingleMesh => (true, false, false),
		VisualType::SingleMorph => (true, true, false),
		VisualType::Morph => (false, true, false),
		VisualType::Billboard => (false, false, true),
		_ => return Ok(()),
	};

	frame.kind = NodeKind::Mesh(visual);
	let lods = match parse_object(cursor, material_count, &frame.name, diags)? {
		ObjectGeometry::Instance(id) => {
			frame.instance_of = Some(id);
			return Ok(());
		}
		ObjectGeometry::Inline(lods) => lods,
	};

	let skin = if skinned { parse_skin(cursor, lods.len())? } else { Vec::new() };
	let morph = if morphed { parse_morph(cursor)? } else { None };
	if billboard {
		let axis = cursor.read_u32()?;
		let mode = cursor.read_u8()?;
		frame.data = NodeData::Billboard { axis, mode };
	}

	let id = meshes.len();
	meshes.push(MeshData { id, lods, skin, morph });
	frame.mesh = Some(id);
	Ok(())
}

fn parse_hull(cursor: &mut Cursor<'_>, vertex_count: usize, face_count: usize) -> Result<Hull> {
	cursor.ensure(vertex_count.saturating_mul(12))?;
	let mut positions = Vec::with_capacity(vertex_count);
	for _ in 0..vertex_count {
		positions.push(cursor.read_vec3()?);
	}

	cursor.ensure(face_count.saturating_mul(6))?;
	let mut faces = Vec::with_capacity(face_count);
	for _ in 0..face_count {
		faces.push([cursor.read_u16()?, cursor.read_u16()?, cursor.read_u16()?]);
	}

	Ok(Hull { positions, faces })
}

fn parse_sector(cursor: &mut Cursor<'_>) -> Result<Sector> {
	let flags = [cursor.read_u32()?, cursor.read_u32()?];
	let vertex_count = cursor.read_u32()? as usize;
	let face_count = cursor.read_u32()? as usize;
	let hull = parse_hull(cursor, vertex_count, face_count)?;
	let bounds = Bounds::parse(cursor)?;

	let portal_count = cursor.read_u8()?;
	let mut portals = Vec::with_capacity(usize::from(portal_count));
	for _ in 0..portal_count {
		let vertex_count = cursor.read_u8()?;
		let plane = Vec4::new(cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?);
		let flags = cursor.read_u32()?;
		let near_range = cursor.read_f32()?;
		let far_range = cursor.read_f32()?;
		let mut positions = Vec::with_capacity(usize::from(vertex_count));
		for _ in 0..vertex_count {
			positions.push(cursor.read_vec3()?);
		}
		portals.push(Portal {
			plane,
			flags,
			near_range,
			far_range,
			positions,
		});
	}

	Ok(Sector { flags, hull, bounds, portals })
}
