use crate::mafia::bytes::Cursor;
use crate::mafia::{MafiaError, Result};

/// Tagged chunk header shared by `scene2.bin` and `cache.bin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
	/// Chunk tag.
	pub tag: u16,
	/// Declared size including this header.
	pub size: u32,
}

impl ChunkHeader {
	/// Encoded header size in bytes.
	pub const SIZE: usize = 6;

	/// Parse a chunk header.
	pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
		let tag = cursor.read_u16()?;
		let size = cursor.read_u32()?;
		Ok(Self { tag, size })
	}
}

/// One chunk with its payload borrowed from the input.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
	/// Parsed header.
	pub head: ChunkHeader,
	/// Bytes after the header, up to the declared size.
	pub payload: &'a [u8],
	/// Absolute offset of the header.
	pub offset: usize,
}

impl<'a> Chunk<'a> {
	/// Iterate the chunks nested in this chunk's payload.
	pub fn children(&self) -> ChunkIter<'a> {
		ChunkIter::new(self.payload, self.payload_offset())
	}

	/// Cursor over the payload; offsets in its errors are payload-relative.
	pub fn cursor(&self) -> Cursor<'a> {
		Cursor::new(self.payload)
	}

	/// Absolute offset of the first payload byte.
	pub fn payload_offset(&self) -> usize {
		self.offset + ChunkHeader::SIZE
	}
}

/// Sequential chunk iterator; stops after the first error.
pub struct ChunkIter<'a> {
	cursor: Cursor<'a>,
	offset_base: usize,
	done: bool,
}

impl<'a> ChunkIter<'a> {
	/// Iterate chunks in `bytes`, reporting offsets relative to `offset_base`.
	pub fn new(bytes: &'a [u8], offset_base: usize) -> Self {
		Self {
			cursor: Cursor::new(bytes),
			offset_base,
			done: false,
		}
	}
}

impl<'a> Iterator for ChunkIter<'a> {
	type Item = Result<Chunk<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		if self.cursor.remaining() == 0 {
			self.done = true;
			return None;
		}

		let local = self.cursor.pos();
		let offset = self.offset_base + local;
		let head = match ChunkHeader::parse(&mut self.cursor) {
			Ok(value) => value,
			Err(err) => {
				self.done = true;
				return Some(Err(rebase(err, self.offset_base)));
			}
		};

		let Some(payload_len) = (head.size as usize).checked_sub(ChunkHeader::SIZE) else {
			self.done = true;
			return Some(Err(MafiaError::BadChunkSize { at: offset, size: head.size }));
		};

		let rem = self.cursor.remaining();
		if payload_len > rem {
			self.done = true;
			return Some(Err(MafiaError::TruncatedData {
				at: offset + ChunkHeader::SIZE,
				need: payload_len,
				rem,
			}));
		}

		let payload = match self.cursor.read_exact(payload_len) {
			Ok(value) => value,
			Err(err) => {
				self.done = true;
				return Some(Err(rebase(err, self.offset_base)));
			}
		};

		Some(Ok(Chunk { head, payload, offset }))
	}
}

/// Rebase a cursor-relative truncation offset onto the file.
pub(crate) fn rebase(err: MafiaError, base: usize) -> MafiaError {
	match err {
		MafiaError::TruncatedData { at, need, rem } => MafiaError::TruncatedData { at: at + base, need, rem },
		other => other,
	}
}
