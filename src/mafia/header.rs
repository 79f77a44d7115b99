use crate::mafia::bytes::Cursor;
use crate::mafia::{MafiaError, Result};

/// Parsed `.4ds` file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourDsHeader {
	/// Format version (29 for Mafia).
	pub version: u16,
	/// Windows FILETIME written by the exporter.
	pub timestamp: u64,
}

impl FourDsHeader {
	/// File magic.
	pub const MAGIC: [u8; 4] = *b"4DS\0";
	/// The one supported layout version.
	pub const VERSION_MAFIA: u16 = 29;
	/// Encoded header size in bytes.
	pub const SIZE: usize = 14;

	/// Parse and validate the header at the cursor position.
	pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
		let magic = match cursor.read_code4() {
			Ok(value) => value,
			Err(err) => {
				let seen = first4(cursor);
				let len = cursor.remaining().min(4);
				if seen[..len] == Self::MAGIC[..len] {
					return Err(err);
				}
				return Err(MafiaError::InvalidSignature { magic: seen });
			}
		};
		if magic != Self::MAGIC {
			return Err(MafiaError::InvalidSignature { magic });
		}

		let version = cursor.read_u16()?;
		if version != Self::VERSION_MAFIA {
			return Err(MafiaError::UnsupportedVersion { version });
		}

		let timestamp = cursor.read_u64()?;
		Ok(Self { version, timestamp })
	}
}

fn first4(cursor: &Cursor<'_>) -> [u8; 4] {
	let mut probe = cursor.clone();
	let mut magic = [0_u8; 4];
	for slot in &mut magic {
		match probe.read_u8() {
			Ok(byte) => *slot = byte,
			Err(_) => break,
		}
	}
	magic
}

#[cfg(test)]
mod tests {
	use super::FourDsHeader;
	use crate::mafia::{Cursor, MafiaError};

	fn header_bytes(version: u16) -> Vec<u8> {
		let mut bytes = b"4DS\0".to_vec();
		bytes.extend_from_slice(&version.to_le_bytes());
		bytes.extend_from_slice(&0x01D0_0000_0000_0000_u64.to_le_bytes());
		bytes
	}

	#[test]
	fn parses_version_29() {
		let bytes = header_bytes(29);
		let mut cursor = Cursor::new(&bytes);
		let header = FourDsHeader::parse(&mut cursor).expect("header parses");
		assert_eq!(header.version, FourDsHeader::VERSION_MAFIA);
		assert_eq!(cursor.pos(), FourDsHeader::SIZE);
	}

	#[test]
	fn short_magic_prefix_is_truncation() {
		let err = FourDsHeader::parse(&mut Cursor::new(b"4D")).expect_err("short");
		assert!(matches!(err, MafiaError::TruncatedData { .. }));
	}

	#[test]
	fn foreign_magic_is_invalid_signature() {
		let err = FourDsHeader::parse(&mut Cursor::new(b"BLENDER")).expect_err("foreign");
		assert!(matches!(err, MafiaError::InvalidSignature { magic } if &magic == b"BLEN"));

		let err = FourDsHeader::parse(&mut Cursor::new(b"XY")).expect_err("short foreign");
		assert!(matches!(err, MafiaError::InvalidSignature { .. }));
	}

	#[test]
	fn other_versions_are_unsupported() {
		let bytes = header_bytes(41);
		let err = FourDsHeader::parse(&mut Cursor::new(&bytes)).expect_err("hd2 layout");
		assert!(matches!(err, MafiaError::UnsupportedVersion { version: 41 }));
	}
}
