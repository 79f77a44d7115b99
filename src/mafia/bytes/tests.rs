use glam::{Quat, Vec3};

use crate::mafia::{Cursor, MafiaError};

#[test]
fn reads_advance_by_decoded_width() {
	let mut bytes = Vec::new();
	bytes.push(7_u8);
	bytes.extend_from_slice(&0x1234_u16.to_le_bytes());
	bytes.extend_from_slice(&0xDEAD_BEEF_u32.to_le_bytes());
	bytes.extend_from_slice(&(-5_i32).to_le_bytes());
	bytes.extend_from_slice(&1.5_f32.to_le_bytes());

	let mut cursor = Cursor::new(&bytes);
	assert_eq!(cursor.read_u8().expect("u8"), 7);
	assert_eq!(cursor.pos(), 1);
	assert_eq!(cursor.read_u16().expect("u16"), 0x1234);
	assert_eq!(cursor.pos(), 3);
	assert_eq!(cursor.read_u32().expect("u32"), 0xDEAD_BEEF);
	assert_eq!(cursor.read_i32().expect("i32"), -5);
	assert_eq!(cursor.read_f32().expect("f32"), 1.5);
	assert_eq!(cursor.remaining(), 0);
}

#[test]
fn short_read_fails_without_moving() {
	let bytes = [1_u8, 2, 3];
	let mut cursor = Cursor::new(&bytes);
	cursor.read_u8().expect("first byte");

	let err = cursor.read_u32().expect_err("read past end should fail");
	assert!(matches!(err, MafiaError::TruncatedData { at: 1, need: 4, rem: 2 }));
	assert_eq!(cursor.pos(), 1);
}

#[test]
fn quaternion_is_read_w_first() {
	let mut bytes = Vec::new();
	for value in [1.0_f32, 0.0, 0.0, 0.0] {
		bytes.extend_from_slice(&value.to_le_bytes());
	}

	let quat = Cursor::new(&bytes).read_quat().expect("quat");
	assert_eq!(quat, Quat::IDENTITY);
}

#[test]
fn vec3_and_strings_decode() {
	let mut bytes = Vec::new();
	for value in [1.0_f32, 2.0, 3.0] {
		bytes.extend_from_slice(&value.to_le_bytes());
	}
	bytes.push(3);
	bytes.extend_from_slice(b"abc");
	bytes.extend_from_slice(&4_u32.to_le_bytes());
	bytes.extend_from_slice(b"door");
	bytes.extend_from_slice(b"lamp\0");
	bytes.extend_from_slice(b"ab\0\0");

	let mut cursor = Cursor::new(&bytes);
	assert_eq!(cursor.read_vec3().expect("vec3"), Vec3::new(1.0, 2.0, 3.0));
	assert_eq!(cursor.read_string8().expect("string8"), "abc");
	assert_eq!(cursor.read_string32().expect("string32"), "door");
	assert_eq!(cursor.read_cstring().expect("cstring"), "lamp");
	assert_eq!(cursor.read_fixed_string(4).expect("fixed"), "ab");
	assert_eq!(cursor.remaining(), 0);
}

#[test]
fn unterminated_cstring_is_truncated() {
	let mut cursor = Cursor::new(b"open");
	let err = cursor.read_cstring().expect_err("missing terminator should fail");
	assert!(matches!(err, MafiaError::TruncatedData { .. }));
}

#[test]
fn seek_is_bounded_by_length() {
	let bytes = [0_u8; 8];
	let mut cursor = Cursor::new(&bytes);
	cursor.seek(8).expect("seek to end");
	assert_eq!(cursor.remaining(), 0);
	assert!(cursor.seek(9).is_err());
}
