use glam::{Mat4, Quat, Vec2, Vec3};

use crate::mafia::{MafiaError, Result};

/// Bounded little-endian cursor over an immutable byte slice.
///
/// Every read advances the cursor by exactly the decoded width and fails with
/// [`MafiaError::TruncatedData`] when fewer bytes remain.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return total buffer length.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Return `true` when the underlying buffer is empty.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Move the cursor to an absolute offset.
	pub fn seek(&mut self, offset: usize) -> Result<()> {
		if offset > self.bytes.len() {
			return Err(MafiaError::TruncatedData {
				at: self.pos,
				need: offset - self.pos,
				rem: self.remaining(),
			});
		}
		self.pos = offset;
		Ok(())
	}

	/// Advance the cursor by `n` bytes without decoding them.
	pub fn skip(&mut self, n: usize) -> Result<()> {
		let _ = self.read_exact(n)?;
		Ok(())
	}

	/// Fail with [`MafiaError::TruncatedData`] unless at least `n` bytes remain.
	///
	/// Used before sizing allocations from counts read out of the file.
	pub fn ensure(&self, n: usize) -> Result<()> {
		if n > self.remaining() {
			return Err(MafiaError::TruncatedData {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}
		Ok(())
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(MafiaError::TruncatedData {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let raw = self.read_exact(N)?;
		let mut out = [0_u8; N];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read a four-byte code.
	pub fn read_code4(&mut self) -> Result<[u8; 4]> {
		self.read_array::<4>()
	}

	/// Read a `u8`.
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.read_array::<1>()?[0])
	}

	/// Read a little-endian `u16`.
	pub fn read_u16(&mut self) -> Result<u16> {
		Ok(u16::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `u32`.
	pub fn read_u32(&mut self) -> Result<u32> {
		Ok(u32::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `i32`.
	pub fn read_i32(&mut self) -> Result<i32> {
		Ok(i32::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `u64`.
	pub fn read_u64(&mut self) -> Result<u64> {
		Ok(u64::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian IEEE-754 `f32`.
	pub fn read_f32(&mut self) -> Result<f32> {
		Ok(f32::from_le_bytes(self.read_array()?))
	}

	/// Read two consecutive `f32` values.
	pub fn read_vec2(&mut self) -> Result<Vec2> {
		Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
	}

	/// Read three consecutive `f32` values.
	pub fn read_vec3(&mut self) -> Result<Vec3> {
		Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
	}

	/// Read a quaternion stored as `w, x, y, z`.
	pub fn read_quat(&mut self) -> Result<Quat> {
		let w = self.read_f32()?;
		let x = self.read_f32()?;
		let y = self.read_f32()?;
		let z = self.read_f32()?;
		Ok(Quat::from_xyzw(x, y, z, w))
	}

	/// Read sixteen `f32` values as a column-major 4x4 matrix.
	pub fn read_mat4(&mut self) -> Result<Mat4> {
		let mut cols = [0.0_f32; 16];
		for value in &mut cols {
			*value = self.read_f32()?;
		}
		Ok(Mat4::from_cols_array(&cols))
	}

	/// Read `n` bytes as text, dropping anything after the first NUL.
	pub fn read_fixed_string(&mut self, n: usize) -> Result<String> {
		let raw = self.read_exact(n)?;
		let end = raw.iter().position(|byte| *byte == 0).unwrap_or(raw.len());
		Ok(decode_text(&raw[..end]))
	}

	/// Read a string prefixed by a `u8` length.
	pub fn read_string8(&mut self) -> Result<String> {
		let len = usize::from(self.read_u8()?);
		self.read_fixed_string(len)
	}

	/// Read a string prefixed by a little-endian `u32` length.
	pub fn read_string32(&mut self) -> Result<String> {
		let len = self.read_u32()? as usize;
		self.read_fixed_string(len)
	}

	/// Read a zero-terminated string without the terminator.
	pub fn read_cstring(&mut self) -> Result<String> {
		let start = self.pos;
		let rem = &self.bytes[self.pos..];
		let Some(rel_end) = rem.iter().position(|byte| *byte == 0) else {
			return Err(MafiaError::TruncatedData {
				at: self.pos,
				need: rem.len() + 1,
				rem: self.remaining(),
			});
		};

		let end = start + rel_end;
		self.pos = end + 1;
		Ok(decode_text(&self.bytes[start..end]))
	}
}

/// Decode single-byte game text; bytes above ASCII map to their Latin-1 code points.
fn decode_text(raw: &[u8]) -> String {
	raw.iter().map(|byte| char::from(*byte)).collect()
}

#[cfg(test)]
mod tests;
