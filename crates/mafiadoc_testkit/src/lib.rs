//! Shared test helpers: byte builders for synthetic `.4ds`, `scene2.bin`, and `cache.bin`
//! fixtures, plus scratch directories under the workspace target directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve the workspace target directory.
pub fn target_dir() -> PathBuf {
	std::env::var_os("CARGO_TARGET_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|| workspace_root().join("target"))
}

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Create a fresh, empty directory under `<target>/mafiadoc-scratch`.
pub fn scratch_dir(label: &str) -> PathBuf {
	let serial = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
	let dir = target_dir()
		.join("mafiadoc-scratch")
		.join(format!("{label}-{}-{serial}", std::process::id()));
	if dir.exists() {
		std::fs::remove_dir_all(&dir).expect("stale scratch dir removes");
	}
	std::fs::create_dir_all(&dir).expect("scratch dir creates");
	dir
}

/// Little-endian byte sink mirroring the decoder's primitive reads.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
	bytes: Vec<u8>,
}

impl ByteWriter {
	/// Create an empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Consume the writer.
	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes
	}

	/// Bytes written so far.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Return `true` when nothing was written.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Append raw bytes.
	pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
		self.bytes.extend_from_slice(bytes);
		self
	}

	/// Append a `u8`.
	pub fn u8(&mut self, value: u8) -> &mut Self {
		self.raw(&[value])
	}

	/// Append a `u16`.
	pub fn u16(&mut self, value: u16) -> &mut Self {
		self.raw(&value.to_le_bytes())
	}

	/// Append a `u32`.
	pub fn u32(&mut self, value: u32) -> &mut Self {
		self.raw(&value.to_le_bytes())
	}

	/// Append a `u64`.
	pub fn u64(&mut self, value: u64) -> &mut Self {
		self.raw(&value.to_le_bytes())
	}

	/// Append an `f32`.
	pub fn f32(&mut self, value: f32) -> &mut Self {
		self.raw(&value.to_le_bytes())
	}

	/// Append three `f32` values.
	pub fn vec3(&mut self, value: [f32; 3]) -> &mut Self {
		for item in value {
			self.f32(item);
		}
		self
	}

	/// Append a quaternion given as `[w, x, y, z]`.
	pub fn quat(&mut self, wxyz: [f32; 4]) -> &mut Self {
		for item in wxyz {
			self.f32(item);
		}
		self
	}

	/// Append a `u8`-length-prefixed string.
	pub fn string8(&mut self, value: &str) -> &mut Self {
		let len = u8::try_from(value.len()).expect("string8 fits in u8");
		self.u8(len).raw(value.as_bytes())
	}

	/// Append a `u32`-length-prefixed string.
	pub fn string32(&mut self, value: &str) -> &mut Self {
		self.u32(value.len() as u32).raw(value.as_bytes())
	}

	/// Append a zero-terminated string.
	pub fn cstring(&mut self, value: &str) -> &mut Self {
		self.raw(value.as_bytes()).u8(0)
	}

	/// Append a world chunk: `u16` tag, `u32` size including the header, payload.
	pub fn chunk(&mut self, tag: u16, payload: &[u8]) -> &mut Self {
		self.u16(tag).u32(6 + payload.len() as u32).raw(payload)
	}
}

/// Identity rotation as `[w, x, y, z]`.
pub const QUAT_IDENTITY: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

/// `.4ds` frame type codes.
pub mod frame_type {
	/// Visual frame.
	pub const VISUAL: u8 = 1;
	/// Light frame.
	pub const LIGHT: u8 = 2;
	/// Dummy frame.
	pub const DUMMY: u8 = 6;
	/// Target frame.
	pub const TARGET: u8 = 7;
	/// Joint frame.
	pub const JOINT: u8 = 10;
	/// Occluder frame.
	pub const OCCLUDER: u8 = 12;
}

/// One mesh LOD for [`FourDsBuilder::mesh`].
#[derive(Debug, Clone)]
pub struct LodSpec {
	/// Vertex positions.
	pub positions: Vec<[f32; 3]>,
	/// Triangles.
	pub faces: Vec<[u16; 3]>,
	/// 1-based material id, 0 for none.
	pub material: u16,
}

impl LodSpec {
	/// Unit cube: 8 vertices, 12 triangles.
	pub fn cube(material: u16) -> Self {
		let positions = vec![
			[-1.0, -1.0, -1.0],
			[1.0, -1.0, -1.0],
			[1.0, 1.0, -1.0],
			[-1.0, 1.0, -1.0],
			[-1.0, -1.0, 1.0],
			[1.0, -1.0, 1.0],
			[1.0, 1.0, 1.0],
			[-1.0, 1.0, 1.0],
		];
		let faces = vec![
			[0, 2, 1],
			[0, 3, 2],
			[4, 5, 6],
			[4, 6, 7],
			[0, 1, 5],
			[0, 5, 4],
			[1, 2, 6],
			[1, 6, 5],
			[2, 3, 7],
			[2, 7, 6],
			[3, 0, 4],
			[3, 4, 7],
		];
		Self { positions, faces, material }
	}
}

/// Frame transform for builder calls.
#[derive(Debug, Clone, Copy)]
pub struct FrameTransform {
	/// Position.
	pub position: [f32; 3],
	/// Scale.
	pub scale: [f32; 3],
	/// Rotation as `[w, x, y, z]`.
	pub rotation: [f32; 4],
}

impl Default for FrameTransform {
	fn default() -> Self {
		Self {
			position: [0.0; 3],
			scale: [1.0; 3],
			rotation: QUAT_IDENTITY,
		}
	}
}

impl FrameTransform {
	/// Translation-only transform.
	pub fn at(position: [f32; 3]) -> Self {
		Self {
			position,
			..Self::default()
		}
	}
}

/// Builder for synthetic version-29 `.4ds` files.
#[derive(Debug, Clone, Default)]
pub struct FourDsBuilder {
	materials: Vec<Vec<u8>>,
	frames: Vec<Vec<u8>>,
	animated: bool,
}

impl FourDsBuilder {
	/// Create an empty model.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of frames added so far; the next frame gets id `frame_count() + 1`.
	pub fn frame_count(&self) -> usize {
		self.frames.len()
	}

	/// Add a plain diffuse-textured material.
	pub fn material(&mut self, diffuse_texture: &str) -> &mut Self {
		self.material_with_flags(0x0004_0000, diffuse_texture)
	}

	/// Add a material with explicit flags; optional blocks are filled with fixed values.
	pub fn material_with_flags(&mut self, flags: u32, diffuse_texture: &str) -> &mut Self {
		let mut w = ByteWriter::new();
		w.u32(flags).vec3([0.5; 3]).vec3([1.0; 3]).vec3([0.0; 3]).f32(1.0);
		if flags & 0x0008_0000 != 0 {
			w.f32(0.25).string8("ENV.BMP");
		}
		w.string8(diffuse_texture);
		if flags & 0x0000_8000 != 0 && flags & 0x4000_0000 != 0 {
			w.string8("ALPHA.BMP");
		}
		if flags & 0x0400_0000 != 0 {
			w.u32(4).u16(0).u32(100).u32(0).u32(0);
		}
		self.materials.push(w.into_bytes());
		self
	}

	/// Set the trailing animation flag.
	pub fn animated(&mut self, animated: bool) -> &mut Self {
		self.animated = animated;
		self
	}

	fn frame_header(w: &mut ByteWriter, frame_type: u8, visual: Option<u8>, parent: u16, transform: FrameTransform, name: &str, props: &str) {
		w.u8(frame_type);
		if let Some(visual_type) = visual {
			w.u8(visual_type).u16(0);
		}
		w.u16(parent).vec3(transform.position).vec3(transform.scale).quat(transform.rotation).u8(0).string8(name).string8(props);
	}

	/// Add a dummy frame with unit bounds.
	pub fn dummy(&mut self, name: &str, parent: u16, transform: FrameTransform) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, frame_type::DUMMY, None, parent, transform, name, "");
		w.vec3([-1.0; 3]).vec3([1.0; 3]);
		self.frames.push(w.into_bytes());
		self
	}

	/// Add a target frame linking to the given frame ids.
	pub fn target(&mut self, name: &str, parent: u16, links: &[u16]) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, frame_type::TARGET, None, parent, FrameTransform::default(), name, "");
		w.u16(0).u8(links.len() as u8);
		for link in links {
			w.u16(*link);
		}
		self.frames.push(w.into_bytes());
		self
	}

	/// Add a visual object frame with inline geometry.
	pub fn mesh(&mut self, name: &str, parent: u16, transform: FrameTransform, lods: &[LodSpec]) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, frame_type::VISUAL, Some(0), parent, transform, name, "");
		Self::write_object(&mut w, lods);
		self.frames.push(w.into_bytes());
		self
	}

	/// Add a visual object frame that reuses the geometry of frame `instance_of`.
	pub fn instance(&mut self, name: &str, parent: u16, transform: FrameTransform, instance_of: u16) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, frame_type::VISUAL, Some(0), parent, transform, name, "");
		w.u16(instance_of);
		self.frames.push(w.into_bytes());
		self
	}

	/// Add a single-mesh (skinned) visual with one bone per LOD bound to `bone_id`.
	pub fn single_mesh(&mut self, name: &str, parent: u16, lods: &[LodSpec], bone_id: u32) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, frame_type::VISUAL, Some(2), parent, FrameTransform::default(), name, "");
		Self::write_object(&mut w, lods);
		for lod in lods {
			w.u8(1).u32(0).vec3([-1.0; 3]).vec3([1.0; 3]);
			for value in [1.0_f32, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0] {
				w.f32(value);
			}
			let weighted = lod.positions.len().min(2) as u32;
			w.u32(lod.positions.len() as u32 - weighted).u32(weighted).u32(bone_id);
			w.vec3([-1.0; 3]).vec3([1.0; 3]);
			for _ in 0..weighted {
				w.f32(0.5);
			}
		}
		self.frames.push(w.into_bytes());
		self
	}

	/// Add a morph visual whose single channel moves every vertex of each LOD by `offset`.
	pub fn morph(&mut self, name: &str, parent: u16, lods: &[LodSpec], offset: [f32; 3]) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, frame_type::VISUAL, Some(5), parent, FrameTransform::default(), name, "");
		Self::write_object(&mut w, lods);
		w.u8(1).u8(1).u8(lods.len() as u8);
		for lod in lods {
			w.u16(lod.positions.len() as u16);
			for position in &lod.positions {
				w.vec3([position[0] + offset[0], position[1] + offset[1], position[2] + offset[2]]).vec3([0.0, 1.0, 0.0]);
			}
			w.u8(0);
			w.vec3([-1.0; 3]).vec3([1.0; 3]).vec3([0.0; 3]).f32(1.0);
		}
		self.frames.push(w.into_bytes());
		self
	}

	/// Add a joint frame.
	pub fn joint(&mut self, name: &str, parent: u16, transform: FrameTransform, bone_id: u32) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, frame_type::JOINT, None, parent, transform, name, "");
		for value in [1.0_f32, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0] {
			w.f32(value);
		}
		w.u32(bone_id);
		self.frames.push(w.into_bytes());
		self
	}

	/// Add an occluder frame from a vertex and face list.
	pub fn occluder(&mut self, name: &str, parent: u16, positions: &[[f32; 3]], faces: &[[u16; 3]]) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, frame_type::OCCLUDER, None, parent, FrameTransform::default(), name, "");
		w.u32(positions.len() as u32).u32(faces.len() as u32);
		for position in positions {
			w.vec3(*position);
		}
		for face in faces {
			w.u16(face[0]).u16(face[1]).u16(face[2]);
		}
		self.frames.push(w.into_bytes());
		self
	}

	/// Add a sector frame with one triangular portal.
	pub fn sector(&mut self, name: &str, parent: u16, positions: &[[f32; 3]], faces: &[[u16; 3]]) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, 5, None, parent, FrameTransform::default(), name, "");
		w.u32(0).u32(0).u32(positions.len() as u32).u32(faces.len() as u32);
		for position in positions {
			w.vec3(*position);
		}
		for face in faces {
			w.u16(face[0]).u16(face[1]).u16(face[2]);
		}
		w.vec3([-1.0; 3]).vec3([1.0; 3]);
		w.u8(1).u8(3).vec3([0.0, 0.0, 1.0]).f32(0.0).u32(4).f32(0.0).f32(100.0);
		w.vec3([0.0, 0.0, 0.0]).vec3([1.0, 0.0, 0.0]).vec3([0.0, 1.0, 0.0]);
		self.frames.push(w.into_bytes());
		self
	}

	/// Add a frame header of the given type with no payload (for layouts the decoder does not know).
	pub fn bare_frame(&mut self, frame_type: u8, name: &str, parent: u16) -> &mut Self {
		let mut w = ByteWriter::new();
		Self::frame_header(&mut w, frame_type, None, parent, FrameTransform::default(), name, "");
		self.frames.push(w.into_bytes());
		self
	}

	fn write_object(w: &mut ByteWriter, lods: &[LodSpec]) {
		w.u16(0).u8(lods.len() as u8);
		for (idx, lod) in lods.iter().enumerate() {
			w.f32(100.0 * (idx + 1) as f32).u16(lod.positions.len() as u16);
			for position in &lod.positions {
				let normal = normalized(*position);
				w.vec3(*position).vec3(normal).f32(position[0] * 0.5 + 0.5).f32(position[1] * 0.5 + 0.5);
			}
			w.u8(1).u16(lod.faces.len() as u16);
			for face in &lod.faces {
				w.u16(face[0]).u16(face[1]).u16(face[2]);
			}
			w.u16(lod.material);
		}
	}

	/// Serialise the file.
	pub fn build(&self) -> Vec<u8> {
		let mut w = ByteWriter::new();
		w.raw(b"4DS\0").u16(29).u64(0x01D0_0000_0000_0000);
		w.u16(self.materials.len() as u16);
		for material in &self.materials {
			w.raw(material);
		}
		w.u16(self.frames.len() as u16);
		for frame in &self.frames {
			w.raw(frame);
		}
		w.u8(u8::from(self.animated));
		w.into_bytes()
	}
}

fn normalized(value: [f32; 3]) -> [f32; 3] {
	let len = (value[0] * value[0] + value[1] * value[1] + value[2] * value[2]).sqrt();
	if len == 0.0 {
		return [0.0, 1.0, 0.0];
	}
	[value[0] / len, value[1] / len, value[2] / len]
}

/// One element for [`Scene2Builder`].
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
	/// Element name.
	pub name: String,
	/// Object type code.
	pub object_type: Option<u32>,
	/// Special type code (written into a definition chunk).
	pub special_type: Option<u32>,
	/// Model file name as stored (may end in `.i3d`).
	pub model: Option<String>,
	/// Parent element name.
	pub parent: Option<String>,
	/// Position.
	pub position: Option<[f32; 3]>,
	/// Rotation `[w, x, y, z]`.
	pub rotation: Option<[f32; 4]>,
	/// Scale.
	pub scale: Option<[f32; 3]>,
	/// Hidden flag.
	pub hidden: bool,
	/// Light `(type, colour, power, far range)`.
	pub light: Option<(u32, [f32; 3], f32, f32)>,
	/// Extra property chunks `(tag, payload)`.
	pub extra: Vec<(u16, Vec<u8>)>,
}

impl ElementSpec {
	/// Named element with nothing else set.
	pub fn named(name: &str) -> Self {
		Self {
			name: name.to_owned(),
			..Self::default()
		}
	}

	/// Model placement.
	pub fn model(name: &str, model: &str, parent: Option<&str>, position: [f32; 3]) -> Self {
		Self {
			name: name.to_owned(),
			object_type: Some(0x09),
			model: Some(model.to_owned()),
			parent: parent.map(str::to_owned),
			position: Some(position),
			rotation: Some(QUAT_IDENTITY),
			scale: Some([1.0; 3]),
			..Self::default()
		}
	}

	/// Point light placement.
	pub fn light(name: &str, parent: Option<&str>, position: [f32; 3]) -> Self {
		Self {
			name: name.to_owned(),
			object_type: Some(0x02),
			parent: parent.map(str::to_owned),
			position: Some(position),
			light: Some((0x01, [1.0, 0.9, 0.8], 2.0, 25.0)),
			..Self::default()
		}
	}

	fn write(&self) -> Vec<u8> {
		let mut w = ByteWriter::new();
		w.chunk(0x0010, &cstr(&self.name));
		if let Some(code) = self.object_type {
			w.chunk(0x4011, &code.to_le_bytes());
		}
		if let Some(code) = self.special_type {
			w.chunk(0xAE22, &code.to_le_bytes());
		}
		if let Some(model) = &self.model {
			w.chunk(0x2012, &cstr(model));
		}
		if let Some(position) = self.position {
			w.chunk(0x0020, &ByteWriter::new().vec3(position).clone().into_bytes());
		}
		if let Some(rotation) = self.rotation {
			w.chunk(0x0022, &ByteWriter::new().quat(rotation).clone().into_bytes());
		}
		if let Some(scale) = self.scale {
			w.chunk(0x002D, &ByteWriter::new().vec3(scale).clone().into_bytes());
		}
		if self.hidden {
			w.chunk(0x4033, &[]);
		}
		if let Some(parent) = &self.parent {
			let mut inner = ByteWriter::new();
			inner.chunk(0x4011, &0x09_u32.to_le_bytes()).chunk(0x0010, &cstr(parent));
			w.chunk(0x4020, &inner.into_bytes());
		}
		if let Some((kind, color, power, range)) = self.light {
			let mut inner = ByteWriter::new();
			inner.chunk(0x4041, &kind.to_le_bytes());
			inner.chunk(0x0026, &ByteWriter::new().vec3(color).clone().into_bytes());
			inner.chunk(0x4042, &power.to_le_bytes());
			inner.chunk(0x4044, &ByteWriter::new().f32(0.0).f32(range).clone().into_bytes());
			inner.chunk(0x4043, &ByteWriter::new().f32(0.0).f32(0.75).clone().into_bytes());
			w.chunk(0x4040, &inner.into_bytes());
		}
		for (tag, payload) in &self.extra {
			w.chunk(*tag, payload);
		}
		w.into_bytes()
	}
}

fn cstr(value: &str) -> Vec<u8> {
	ByteWriter::new().cstring(value).clone().into_bytes()
}

/// Builder for synthetic `scene2.bin` files.
#[derive(Debug, Clone, Default)]
pub struct Scene2Builder {
	objects: Vec<ElementSpec>,
	definitions: Vec<ElementSpec>,
	extra_chunks: Vec<(u16, Vec<u8>)>,
}

impl Scene2Builder {
	/// Create an empty world.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an element to the objects section (`0x4000`/`0x4010`).
	pub fn object(&mut self, element: ElementSpec) -> &mut Self {
		self.objects.push(element);
		self
	}

	/// Add an element to the definitions section (`0xAE20`/`0xAE21`).
	pub fn definition(&mut self, element: ElementSpec) -> &mut Self {
		self.definitions.push(element);
		self
	}

	/// Add a top-level chunk the decoder does not know.
	pub fn extra_chunk(&mut self, tag: u16, payload: &[u8]) -> &mut Self {
		self.extra_chunks.push((tag, payload.to_vec()));
		self
	}

	/// Serialise the file.
	pub fn build(&self) -> Vec<u8> {
		let mut body = ByteWriter::new();
		for (tag, payload) in &self.extra_chunks {
			body.chunk(*tag, payload);
		}

		let mut objects = ByteWriter::new();
		for element in &self.objects {
			objects.chunk(0x4010, &element.write());
		}
		body.chunk(0x4000, &objects.into_bytes());

		if !self.definitions.is_empty() {
			let mut definitions = ByteWriter::new();
			for element in &self.definitions {
				definitions.chunk(0xAE21, &element.write());
			}
			body.chunk(0xAE20, &definitions.into_bytes());
		}

		let mut w = ByteWriter::new();
		w.chunk(0x4C53, &body.into_bytes());
		w.into_bytes()
	}
}

/// One instance for [`CacheBuilder`].
#[derive(Debug, Clone)]
pub struct CacheInstance {
	/// Model file name as stored.
	pub model: String,
	/// Position.
	pub position: [f32; 3],
	/// Rotation `[w, x, y, z]`.
	pub rotation: [f32; 4],
	/// Scale.
	pub scale: [f32; 3],
}

impl CacheInstance {
	/// Translation-only instance.
	pub fn at(model: &str, position: [f32; 3]) -> Self {
		Self {
			model: model.to_owned(),
			position,
			rotation: QUAT_IDENTITY,
			scale: [1.0; 3],
		}
	}
}

/// Builder for synthetic `cache.bin` files.
#[derive(Debug, Clone, Default)]
pub struct CacheBuilder {
	groups: Vec<(String, Vec<CacheInstance>)>,
	tags: Option<(u16, u16)>,
}

impl CacheBuilder {
	/// Create an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a named group of instances.
	pub fn group(&mut self, name: &str, instances: Vec<CacheInstance>) -> &mut Self {
		self.groups.push((name.to_owned(), instances));
		self
	}

	/// Override the group and instance chunk tags (default `0x03E8` / `0x07D1`).
	pub fn with_tags(&mut self, group: u16, instance: u16) -> &mut Self {
		self.tags = Some((group, instance));
		self
	}

	/// Serialise the file.
	pub fn build(&self) -> Vec<u8> {
		let (group_tag, instance_tag) = self.tags.unwrap_or((0x03E8, 0x07D1));
		let mut body = ByteWriter::new();
		body.u32(1);
		for (name, instances) in &self.groups {
			let mut group = ByteWriter::new();
			group.string32(name).raw(&[0_u8; 0x4C]);
			for instance in instances {
				let mut inner = ByteWriter::new();
				inner
					.string32(&instance.model)
					.vec3(instance.position)
					.quat(instance.rotation)
					.vec3(instance.scale)
					.u32(0)
					.vec3(instance.scale);
				group.chunk(instance_tag, &inner.into_bytes());
			}
			body.chunk(group_tag, &group.into_bytes());
		}
		body.u32(0);

		let mut w = ByteWriter::new();
		w.u16(0x03E8).u32(6 + body.len() as u32).raw(&body.into_bytes());
		w.into_bytes()
	}
}
