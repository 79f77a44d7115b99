use mafiadoc_testkit::ByteWriter;

use super::{ObjectGeometry, parse_morph, parse_object, parse_skin};
use crate::mafia::{Cursor, DiagnosticKind, Diagnostics, MafiaError};

fn triangle_lod(w: &mut ByteWriter, faces: &[[u16; 3]], material: u16) {
	w.f32(50.0).u16(3);
	for position in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
		w.vec3(position).vec3([0.0, 0.0, 1.0]).f32(position[0]).f32(position[1]);
	}
	w.u8(1).u16(faces.len() as u16);
	for face in faces {
		w.u16(face[0]).u16(face[1]).u16(face[2]);
	}
	w.u16(material);
}

#[test]
fn inline_geometry_keeps_vertex_attributes_in_step() {
	let mut w = ByteWriter::new();
	w.u16(0).u8(1);
	triangle_lod(&mut w, &[[0, 1, 2]], 1);
	let bytes = w.into_bytes();

	let mut diags = Diagnostics::new();
	let geometry = parse_object(&mut Cursor::new(&bytes), 1, "tri", &mut diags).expect("object parses");
	let ObjectGeometry::Inline(lods) = geometry else {
		panic!("expected inline geometry");
	};

	assert_eq!(lods.len(), 1);
	let lod = &lods[0];
	assert_eq!(lod.clipping_range, 50.0);
	assert_eq!(lod.positions.len(), 3);
	assert_eq!(lod.normals.len(), 3);
	assert_eq!(lod.uvs.len(), 3);
	assert_eq!(lod.face_groups[0].material, Some(0));
	assert_eq!(lod.indices(), vec![0, 1, 2]);
	assert!(diags.is_empty());
}

#[test]
fn nonzero_instance_id_short_circuits() {
	let bytes = 4_u16.to_le_bytes();
	let mut diags = Diagnostics::new();
	let mut cursor = Cursor::new(&bytes);
	let geometry = parse_object(&mut cursor, 0, "inst", &mut diags).expect("instance parses");

	assert_eq!(geometry, ObjectGeometry::Instance(4));
	assert_eq!(cursor.remaining(), 0);
}

#[test]
fn out_of_range_material_and_vertex_are_dropped_with_diagnostics() {
	let mut w = ByteWriter::new();
	w.u16(0).u8(1);
	triangle_lod(&mut w, &[[0, 1, 2], [0, 1, 9]], 3);
	let bytes = w.into_bytes();

	let mut diags = Diagnostics::new();
	let geometry = parse_object(&mut Cursor::new(&bytes), 1, "broken", &mut diags).expect("object parses");
	let ObjectGeometry::Inline(lods) = geometry else {
		panic!("expected inline geometry");
	};

	assert_eq!(lods[0].triangle_count(), 1);
	assert_eq!(lods[0].face_groups[0].material, None);

	let kinds: Vec<_> = diags.items().iter().map(|diag| diag.kind.clone()).collect();
	assert_eq!(
		kinds,
		vec![
			DiagnosticKind::DanglingReference { what: "vertex", index: 9 },
			DiagnosticKind::DanglingReference { what: "material", index: 3 },
		]
	);
	assert!(diags.items().iter().all(|diag| diag.subject == "broken"));
}

#[test]
fn zero_material_id_means_untextured() {
	let mut w = ByteWriter::new();
	w.u16(0).u8(1);
	triangle_lod(&mut w, &[[0, 1, 2]], 0);
	let bytes = w.into_bytes();

	let mut diags = Diagnostics::new();
	let ObjectGeometry::Inline(lods) = parse_object(&mut Cursor::new(&bytes), 0, "plain", &mut diags).expect("object parses") else {
		panic!("expected inline geometry");
	};
	assert_eq!(lods[0].face_groups[0].material, None);
	assert!(diags.is_empty());
}

#[test]
fn skin_weight_count_past_end_is_truncation() {
	let mut w = ByteWriter::new();
	w.u8(1).u32(0).vec3([0.0; 3]).vec3([1.0; 3]);
	for _ in 0..16 {
		w.f32(0.0);
	}
	w.u32(0).u32(1_000_000).u32(7).vec3([0.0; 3]).vec3([1.0; 3]);
	let bytes = w.into_bytes();

	let err = parse_skin(&mut Cursor::new(&bytes), 1).expect_err("weights do not fit");
	assert!(matches!(err, MafiaError::TruncatedData { need: 4_000_000, .. }));
}

#[test]
fn morph_without_targets_is_absent() {
	let bytes = [0_u8];
	let mut cursor = Cursor::new(&bytes);
	assert_eq!(parse_morph(&mut cursor).expect("morph parses"), None);
	assert_eq!(cursor.remaining(), 0);
}

#[test]
fn morph_reads_indices_when_flagged() {
	let mut w = ByteWriter::new();
	w.u8(1).u8(1).u8(1);
	w.u16(2);
	w.vec3([1.0, 0.0, 0.0]).vec3([0.0, 1.0, 0.0]);
	w.vec3([2.0, 0.0, 0.0]).vec3([0.0, 1.0, 0.0]);
	w.u8(1).u16(5).u16(6);
	w.vec3([0.0; 3]).vec3([2.0; 3]).vec3([1.0; 3]).f32(3.0);
	let bytes = w.into_bytes();

	let morph = parse_morph(&mut Cursor::new(&bytes)).expect("morph parses").expect("morph present");
	assert_eq!(morph.targets, 1);
	let lod = &morph.lods[0];
	assert_eq!(lod.channels[0].vertices.len(), 2);
	assert_eq!(lod.channels[0].indices.as_deref(), Some(&[5_u16, 6][..]));
	assert_eq!(lod.radius, 3.0);
}
