use glam::Vec3;

use crate::mafia::Result;
use crate::mafia::bytes::Cursor;

/// Raw material flag word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialFlags(pub u32);

impl MaterialFlags {
	/// Normal texture blending.
	pub const NORMTEXBLEND: u32 = 0x0000_0100;
	/// Multiplicative texture blending.
	pub const MULTIPLYTEXBLEND: u32 = 0x0000_0200;
	/// Additive texture blending.
	pub const ADDTEXBLEND: u32 = 0x0000_0400;
	/// Reflection texture coordinates are computed.
	pub const CALCREFLECTTEXY: u32 = 0x0000_1000;
	/// Reflection projected on Y.
	pub const PROJECTREFLECTTEXY: u32 = 0x0000_2000;
	/// Reflection projected on Z.
	pub const PROJECTREFLECTTEXZ: u32 = 0x0000_4000;
	/// Additional effect block present.
	pub const ADDEFFECT: u32 = 0x0000_8000;
	/// Diffuse texture present.
	pub const DIFFUSETEX: u32 = 0x0004_0000;
	/// Environment map present.
	pub const ENVMAP: u32 = 0x0008_0000;
	/// Mipmapping enabled.
	pub const MIPMAP: u32 = 0x0080_0000;
	/// Animated alpha texture.
	pub const ANIMTEXALPHA: u32 = 0x0200_0000;
	/// Animated diffuse texture.
	pub const ANIMTEXDIFF: u32 = 0x0400_0000;
	/// Vertex colours used.
	pub const COLORED: u32 = 0x0800_0000;
	/// Faces render from both sides.
	pub const DOUBLESIDED: u32 = 0x1000_0000;
	/// Palette index 0 of the diffuse texture is transparent.
	pub const COLORKEY: u32 = 0x2000_0000;
	/// Separate alpha texture present.
	pub const ALPHATEX: u32 = 0x4000_0000;
	/// Additive blending.
	pub const ADDITIVEMIX: u32 = 0x8000_0000;

	/// Return `true` when every bit of `mask` is set.
	pub fn contains(self, mask: u32) -> bool {
		self.0 & mask == mask
	}
}

/// Texture animation parameters for animated diffuse materials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureAnimation {
	/// Number of animation frames.
	pub frames: u32,
	/// Frame period in milliseconds.
	pub period: u32,
	/// Remaining undocumented words.
	pub unknown: [u32; 2],
	/// Undocumented halfword between frame count and period.
	pub unknown_short: u16,
}

/// One entry of a model's material table.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
	/// Zero-based index in the material table.
	pub id: usize,
	/// Display name: lower-cased diffuse texture, or `material_<id>` when untextured.
	pub name: String,
	/// Raw flags.
	pub flags: MaterialFlags,
	/// Ambient colour.
	pub ambient: Vec3,
	/// Diffuse colour.
	pub diffuse: Vec3,
	/// Emission colour.
	pub emission: Vec3,
	/// Opacity in `0..=1`.
	pub alpha: f32,
	/// Environment map texture and blend ratio.
	pub env_map: Option<(String, f32)>,
	/// Diffuse texture file name.
	pub diffuse_texture: Option<String>,
	/// Alpha texture file name.
	pub alpha_texture: Option<String>,
	/// Texture animation block.
	pub animation: Option<TextureAnimation>,
}

impl Material {
	/// Decode one material at the cursor position.
	pub fn parse(cursor: &mut Cursor<'_>, id: usize) -> Result<Self> {
		let flags = MaterialFlags(cursor.read_u32()?);
		let ambient = cursor.read_vec3()?;
		let diffuse = cursor.read_vec3()?;
		let emission = cursor.read_vec3()?;
		let alpha = cursor.read_f32()?;

		let env_map = if flags.contains(MaterialFlags::ENVMAP) {
			let ratio = cursor.read_f32()?;
			let texture = cursor.read_string8()?.to_lowercase();
			Some((texture, ratio))
		} else {
			None
		};

		let diffuse_texture = non_empty(cursor.read_string8()?.to_lowercase());

		let alpha_texture = if flags.contains(MaterialFlags::ADDEFFECT | MaterialFlags::ALPHATEX) {
			non_empty(cursor.read_string8()?.to_lowercase())
		} else {
			None
		};

		let animation = if flags.contains(MaterialFlags::ANIMTEXDIFF) {
			let frames = cursor.read_u32()?;
			let unknown_short = cursor.read_u16()?;
			let period = cursor.read_u32()?;
			let first = cursor.read_u32()?;
			let second = cursor.read_u32()?;
			Some(TextureAnimation {
				frames,
				period,
				unknown: [first, second],
				unknown_short,
			})
		} else {
			None
		};

		let name = diffuse_texture.clone().unwrap_or_else(|| format!("material_{id}"));

		Ok(Self {
			id,
			name,
			flags,
			ambient,
			diffuse,
			emission,
			alpha,
			env_map,
			diffuse_texture,
			alpha_texture,
			animation,
		})
	}

	/// Faces render from both sides.
	pub fn two_sided(&self) -> bool {
		self.flags.contains(MaterialFlags::DOUBLESIDED)
	}

	/// Material needs alpha blending or alpha testing.
	pub fn transparent(&self) -> bool {
		self.alpha_texture.is_some() || self.flags.contains(MaterialFlags::COLORKEY) || self.alpha < 1.0
	}
}

fn non_empty(value: String) -> Option<String> {
	if value.is_empty() { None } else { Some(value) }
}
