use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::mafia::chunk::{Chunk, ChunkIter, rebase};
use crate::mafia::{DiagnosticKind, Diagnostics, MafiaError, Result, Transform};

mod tags {
	pub const CONTAINERS: [u16; 2] = [0x4000, 0xAE20];
	pub const ELEMENTS: [u16; 2] = [0x4010, 0xAE21];

	pub const NAME: [u16; 2] = [0x0010, 0xAE23];
	pub const MODEL: u16 = 0x2012;
	pub const POSITION: u16 = 0x0020;
	pub const ROTATION: u16 = 0x0022;
	pub const SCALE: u16 = 0x002D;
	pub const OBJECT_TYPE: u16 = 0x4011;
	pub const SPECIAL_TYPE: u16 = 0xAE22;
	pub const HIDDEN: u16 = 0x4033;
	pub const PARENT: u16 = 0x4020;
	pub const LIGHT: u16 = 0x4040;

	pub const LIGHT_TYPE: u16 = 0x4041;
	pub const LIGHT_COLOR: u16 = 0x0026;
	pub const LIGHT_POWER: u16 = 0x4042;
	pub const LIGHT_CONE: u16 = 0x4043;
	pub const LIGHT_RANGE: u16 = 0x4044;
}

/// Bytes of group bounds between the group name and its instances.
const CACHE_GROUP_BOUNDS: usize = 0x4C;

/// World container grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldKind {
	/// `scene2.bin`: nested element chunks with property sub-chunks.
	Scene2,
	/// `cache.bin`: instance groups of static models.
	Cache,
}

impl WorldKind {
	/// Pick the grammar from a file name (`scene2.bin` or `cache.bin`, case-insensitive).
	pub fn from_file_name(path: &Path) -> Result<Self> {
		let name = path.file_name().map(|name| name.to_string_lossy().to_ascii_lowercase()).unwrap_or_default();
		match name.as_str() {
			"scene2.bin" => Ok(Self::Scene2),
			"cache.bin" => Ok(Self::Cache),
			_ => Err(MafiaError::UnknownWorldFile {
				name: path.display().to_string(),
			}),
		}
	}

	/// Parse a CLI value.
	pub fn parse(value: &str) -> Option<Self> {
		match value.to_ascii_lowercase().as_str() {
			"scene2" | "scene2.bin" => Some(Self::Scene2),
			"cache" | "cache.bin" => Some(Self::Cache),
			_ => None,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Scene2 => "scene2",
			Self::Cache => "cache",
		}
	}
}

/// Entity category of a placement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
	/// No type property was present.
	Unset,
	/// Light source.
	Light,
	/// Camera.
	Camera,
	/// Sound emitter.
	Sound,
	/// Model placement.
	Model,
	/// Occluder.
	Occluder,
	/// Sector.
	Sector,
	/// Lightmap.
	Lightmap,
	/// Script.
	Script,
	/// Unassigned code.
	Other(u32),
}

impl ObjectType {
	/// Map a raw object type code.
	pub fn from_code(code: u32) -> Self {
		match code {
			0x00 => Self::Unset,
			0x02 => Self::Light,
			0x03 => Self::Camera,
			0x04 => Self::Sound,
			0x09 => Self::Model,
			0x0C => Self::Occluder,
			0x99 => Self::Sector,
			0x9A => Self::Lightmap,
			0x9B => Self::Script,
			other => Self::Other(other),
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Unset => "unset",
			Self::Light => "light",
			Self::Camera => "camera",
			Self::Sound => "sound",
			Self::Model => "model",
			Self::Occluder => "occluder",
			Self::Sector => "sector",
			Self::Lightmap => "lightmap",
			Self::Script => "script",
			Self::Other(_) => "other",
		}
	}
}

/// Gameplay category of a placement record (definition section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialType {
	/// No special type property was present.
	Unset,
	/// Physics object.
	Physical,
	/// Player spawn.
	Player,
	/// Character.
	Character,
	/// Car.
	Car,
	/// Door.
	Door,
	/// Dog.
	Dog,
	/// Fuel pump.
	Pumper,
	/// Public transport vehicle.
	PublicVehicle,
	/// Script holder.
	Script,
	/// Unassigned code.
	Other(u32),
}

impl SpecialType {
	/// Map a raw special type code.
	pub fn from_code(code: u32) -> Self {
		match code {
			0x00 => Self::Unset,
			0x02 => Self::Player,
			0x04 => Self::Car,
			0x05 => Self::Script,
			0x06 => Self::Door,
			0x08 => Self::PublicVehicle,
			0x15 => Self::Dog,
			0x19 => Self::Pumper,
			0x1B => Self::Character,
			0x23 => Self::Physical,
			other => Self::Other(other),
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Unset => "unset",
			Self::Physical => "physical",
			Self::Player => "player",
			Self::Character => "character",
			Self::Car => "car",
			Self::Door => "door",
			Self::Dog => "dog",
			Self::Pumper => "pumper",
			Self::PublicVehicle => "public_vehicle",
			Self::Script => "script",
			Self::Other(_) => "other",
		}
	}
}

/// Light shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
	/// Omnidirectional.
	Point,
	/// Cone.
	Spot,
	/// Sun-like.
	Directional,
	/// Area emitter.
	Area,
	/// Unassigned code; treat as point.
	Other(u32),
}

impl LightKind {
	/// Map a raw light type code.
	pub fn from_code(code: u32) -> Self {
		match code {
			0x01 | 0x05 | 0x06 => Self::Point,
			0x02 => Self::Spot,
			0x03 => Self::Directional,
			0x04 | 0x08 => Self::Area,
			other => Self::Other(other),
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Point => "point",
			Self::Spot => "spot",
			Self::Directional => "directional",
			Self::Area => "area",
			Self::Other(_) => "other",
		}
	}
}

/// Light parameters of a light placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
	/// Light shape.
	pub kind: LightKind,
	/// Linear RGB colour.
	pub color: Vec3,
	/// Intensity.
	pub power: f32,
	/// Falloff start.
	pub near: f32,
	/// Falloff end.
	pub far: f32,
	/// Spot cone angle in radians.
	pub cone: f32,
}

impl Default for Light {
	fn default() -> Self {
		Self {
			kind: LightKind::Point,
			color: Vec3::ONE,
			power: 1.0,
			near: 0.0,
			far: 0.0,
			cone: 0.0,
		}
	}
}

/// One entity of a world container.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRecord {
	/// Entity name.
	pub name: String,
	/// Entity category.
	pub object_type: ObjectType,
	/// Gameplay category.
	pub special_type: SpecialType,
	/// Transform as stored.
	pub transform: Transform,
	/// Parent entity name, `None` for world-level entities.
	pub parent: Option<String>,
	/// Normalised `.4ds` asset name (lower case).
	pub asset: Option<String>,
	/// Light parameters.
	pub light: Option<Light>,
	/// Hidden flag.
	pub hidden: bool,
	/// `cache.bin` group the instance belongs to.
	pub group: Option<String>,
	/// Absolute offset of the record chunk.
	pub offset: usize,
}

impl PlacementRecord {
	fn new(offset: usize) -> Self {
		Self {
			name: String::new(),
			object_type: ObjectType::Unset,
			special_type: SpecialType::Unset,
			transform: Transform::IDENTITY,
			parent: None,
			asset: None,
			light: None,
			hidden: false,
			group: None,
			offset,
		}
	}
}

/// Successful world decode.
#[derive(Debug, Clone)]
pub struct WorldDecode {
	/// Grammar used.
	pub kind: WorldKind,
	/// Records in file order.
	pub records: Vec<PlacementRecord>,
	/// Tags that were skipped by their declared size, in encounter order.
	pub unrecognized: Vec<u16>,
	/// Recoverable problems.
	pub diagnostics: Diagnostics,
}

/// Decode a world container.
pub fn decode_world(bytes: &[u8], kind: WorldKind) -> Result<WorldDecode> {
	let mut out = WorldDecode {
		kind,
		records: Vec::new(),
		unrecognized: Vec::new(),
		diagnostics: Diagnostics::new(),
	};

	match kind {
		WorldKind::Scene2 => decode_scene2(bytes, &mut out)?,
		WorldKind::Cache => decode_cache(bytes, &mut out)?,
	}

	log::debug!(
		"decoded {}: {} records, {} unrecognized tags",
		kind.as_str(),
		out.records.len(),
		out.unrecognized.len()
	);
	Ok(out)
}

impl WorldDecode {
	fn skip(&mut self, chunk: &Chunk<'_>) {
		self.unrecognized.push(chunk.head.tag);
		self.diagnostics.push(
			format!("@0x{:x}", chunk.offset),
			DiagnosticKind::UnrecognizedRecord {
				tag: chunk.head.tag,
				at: chunk.offset,
			},
		);
	}
}

fn first_chunk(bytes: &[u8]) -> Result<Chunk<'_>> {
	ChunkIter::new(bytes, 0).next().unwrap_or(Err(MafiaError::TruncatedData {
		at: 0,
		need: 6,
		rem: bytes.len(),
	}))
}

fn decode_scene2(bytes: &[u8], out: &mut WorldDecode) -> Result<()> {
	let root = first_chunk(bytes)?;
	let mut stack = vec![root.children()];

	while let Some(iter) = stack.last_mut() {
		let Some(chunk) = iter.next() else {
			stack.pop();
			continue;
		};
		let chunk = chunk?;

		if tags::CONTAINERS.contains(&chunk.head.tag) {
			stack.push(chunk.children());
		} else if tags::ELEMENTS.contains(&chunk.head.tag) {
			if let Some(record) = read_element(&chunk, out)? {
				out.records.push(record);
			}
		} else {
			out.skip(&chunk);
		}
	}

	Ok(())
}

fn read_element(element: &Chunk<'_>, out: &mut WorldDecode) -> Result<Option<PlacementRecord>> {
	let mut record = PlacementRecord::new(element.offset);
	let mut name = None;

	for prop in element.children() {
		let prop = prop?;
		let base = prop.payload_offset();
		let at = |err| rebase(err, base);
		let mut cursor = prop.cursor();
		let tag = prop.head.tag;

		match tag {
			_ if tags::NAME.contains(&tag) => name = Some(cursor.read_cstring().map_err(at)?),
			tags::MODEL => record.asset = normalize_asset(&cursor.read_cstring().map_err(at)?),
			tags::POSITION => record.transform.position = cursor.read_vec3().map_err(at)?,
			tags::ROTATION => record.transform.rotation = normalized_quat(cursor.read_quat().map_err(at)?),
			tags::SCALE => record.transform.scale = cursor.read_vec3().map_err(at)?,
			tags::OBJECT_TYPE => record.object_type = ObjectType::from_code(cursor.read_u32().map_err(at)?),
			tags::SPECIAL_TYPE => record.special_type = SpecialType::from_code(cursor.read_u32().map_err(at)?),
			tags::HIDDEN => record.hidden = true,
			tags::PARENT => record.parent = read_parent(&prop)?,
			tags::LIGHT => {
				record.light = Some(read_light(&prop, out)?);
				record.object_type = ObjectType::Light;
			}
			_ => out.skip(&prop),
		}
	}

	match name {
		Some(name) if !name.is_empty() => {
			record.name = name;
			Ok(Some(record))
		}
		_ => {
			out.diagnostics.push(format!("@0x{:x}", element.offset), DiagnosticKind::MissingField { field: "name" });
			Ok(None)
		}
	}
}

fn read_parent(chunk: &Chunk<'_>) -> Result<Option<String>> {
	for inner in chunk.children() {
		let inner = inner?;
		if tags::NAME.contains(&inner.head.tag) {
			let name = inner.cursor().read_cstring().map_err(|err| rebase(err, inner.payload_offset()))?;
			return Ok(Some(name).filter(|name| !name.is_empty()));
		}
	}
	Ok(None)
}

fn read_light(chunk: &Chunk<'_>, out: &mut WorldDecode) -> Result<Light> {
	let mut light = Light::default();
	for inner in chunk.children() {
		let inner = inner?;
		let base = inner.payload_offset();
		let at = |err| rebase(err, base);
		let mut cursor = inner.cursor();

		match inner.head.tag {
			tags::LIGHT_TYPE => light.kind = LightKind::from_code(cursor.read_u32().map_err(at)?),
			tags::LIGHT_COLOR => light.color = cursor.read_vec3().map_err(at)?,
			tags::LIGHT_POWER => light.power = cursor.read_f32().map_err(at)?,
			tags::LIGHT_RANGE => {
				light.near = cursor.read_f32().map_err(at)?;
				light.far = cursor.read_f32().map_err(at)?;
			}
			tags::LIGHT_CONE => {
				cursor.skip(4).map_err(at)?;
				light.cone = cursor.read_f32().map_err(at)?;
			}
			_ => out.skip(&inner),
		}
	}
	Ok(light)
}

fn decode_cache(bytes: &[u8], out: &mut WorldDecode) -> Result<()> {
	let root = first_chunk(bytes)?;

	let mut cursor = root.cursor();
	cursor.read_u32().map_err(|err| rebase(err, root.payload_offset()))?;

	// The root payload ends with a 4-byte terminator after the last group.
	let groups_end = root.payload.len().saturating_sub(4).max(cursor.pos());
	let groups = &root.payload[cursor.pos()..groups_end];

	// Group and instance chunks are read by position; their tags are not checked.
	for group in ChunkIter::new(groups, root.payload_offset() + cursor.pos()) {
		read_group(&group?, out)?;
	}

	Ok(())
}

fn read_group(group: &Chunk<'_>, out: &mut WorldDecode) -> Result<()> {
	let base = group.payload_offset();
	let mut cursor = group.cursor();
	let name = cursor.read_string32().map_err(|err| rebase(err, base))?;
	cursor.skip(CACHE_GROUP_BOUNDS).map_err(|err| rebase(err, base))?;

	let start = cursor.pos();
	for instance in ChunkIter::new(&group.payload[start..], base + start) {
		let instance = instance?;
		let base = instance.payload_offset();
		let mut cursor = instance.cursor();
		let mut read = || -> Result<(String, Transform)> {
			let model = cursor.read_string32()?;
			let position = cursor.read_vec3()?;
			let rotation = normalized_quat(cursor.read_quat()?);
			let scale = cursor.read_vec3()?;
			cursor.read_u32()?;
			cursor.read_vec3()?;
			Ok((model, Transform::new(position, rotation, scale)))
		};
		let (model, transform) = read().map_err(|err| rebase(err, base))?;

		let Some(asset) = normalize_asset(&model) else {
			out.diagnostics.push(format!("@0x{:x}", instance.offset), DiagnosticKind::MissingField { field: "model" });
			continue;
		};

		let mut record = PlacementRecord::new(instance.offset);
		record.name = asset.strip_suffix(".4ds").unwrap_or(&asset).to_owned();
		record.object_type = ObjectType::Model;
		record.transform = transform;
		record.asset = Some(asset);
		record.group = Some(name.clone());
		out.records.push(record);
	}

	Ok(())
}

/// Lower-case a stored model name and map the `.i3d` extension to `.4ds`.
pub fn normalize_asset(raw: &str) -> Option<String> {
	let lower = raw.trim().to_ascii_lowercase();
	if lower.is_empty() {
		return None;
	}
	match lower.strip_suffix(".i3d") {
		Some(stem) => Some(format!("{stem}.4ds")),
		None => Some(lower),
	}
}

fn normalized_quat(value: Quat) -> Quat {
	if value.length_squared() == 0.0 { Quat::IDENTITY } else { value.normalize() }
}
