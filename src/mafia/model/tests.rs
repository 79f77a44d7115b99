use glam::Vec3;
use mafiadoc_testkit::{FourDsBuilder, FrameTransform, LodSpec, frame_type};

use super::decode_model;
use crate::mafia::{DiagnosticKind, MafiaError, NodeData, NodeKind, Severity, VisualType};

fn cube_model() -> Vec<u8> {
	let mut builder = FourDsBuilder::new();
	builder.material("CRATE.BMP").mesh("crate", 0, FrameTransform::default(), &[LodSpec::cube(1)]);
	builder.build()
}

#[test]
fn cube_decodes_to_single_mesh_node() {
	let decoded = decode_model(&cube_model()).expect("cube decodes");
	let model = &decoded.model;

	assert_eq!(model.header.version, 29);
	assert_eq!(model.materials.len(), 1);
	assert_eq!(model.materials[0].diffuse_texture.as_deref(), Some("crate.bmp"));
	assert_eq!(model.nodes.len(), 1);
	assert_eq!(model.roots, vec![0]);

	let node = &model.nodes[0];
	assert_eq!(node.kind, NodeKind::Mesh(VisualType::Object));
	assert_eq!(node.materials, vec![0]);
	let mesh = model.mesh_of(node).expect("mesh attached");
	let lod = mesh.base_lod().expect("base lod");
	assert_eq!(lod.positions.len(), 8);
	assert_eq!(lod.triangle_count(), 12);
	assert!(decoded.diagnostics.is_empty());
	assert!(!model.animated);
}

#[test]
fn decoding_is_deterministic() {
	let bytes = cube_model();
	let first = decode_model(&bytes).expect("first decode");
	let second = decode_model(&bytes).expect("second decode");
	assert_eq!(first.model, second.model);
	assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn parent_ids_build_children_in_file_order() {
	let mut builder = FourDsBuilder::new();
	builder
		.dummy("root", 0, FrameTransform::at([0.0, 1.0, 0.0]))
		.dummy("left", 1, FrameTransform::at([-1.0, 0.0, 0.0]))
		.dummy("right", 1, FrameTransform::at([1.0, 0.0, 0.0]))
		.dummy("tip", 3, FrameTransform::at([0.0, 0.0, 2.0]))
		.animated(true);
	let model = decode_model(&builder.build()).expect("tree decodes").model;

	assert_eq!(model.roots, vec![0]);
	assert_eq!(model.nodes[0].children, vec![1, 2]);
	assert_eq!(model.nodes[2].children, vec![3]);
	assert_eq!(model.nodes[3].parent, Some(2));
	assert_eq!(model.walk(), vec![0, 1, 2, 3]);
	assert!(model.animated);

	let tip = model.model_transform(3);
	assert!(tip.position.abs_diff_eq(Vec3::new(1.0, 1.0, 2.0), 1e-6));
	assert!(matches!(model.nodes[0].data, NodeData::Dummy(_)));
}

#[test]
fn mutual_parents_cut_the_later_edge() {
	let mut builder = FourDsBuilder::new();
	builder.dummy("A", 2, FrameTransform::default()).dummy("B", 1, FrameTransform::default());
	let decoded = decode_model(&builder.build()).expect("cyclic model decodes");
	let model = &decoded.model;

	assert_eq!(model.nodes[0].parent, Some(1));
	assert_eq!(model.nodes[1].parent, None);
	assert_eq!(model.roots, vec![1]);

	let cyclic: Vec<_> = decoded
		.diagnostics
		.matching(|kind| matches!(kind, DiagnosticKind::CyclicHierarchy { .. }))
		.collect();
	assert_eq!(cyclic.len(), 1);
	assert_eq!(cyclic[0].subject, "B");
	assert_eq!(cyclic[0].kind, DiagnosticKind::CyclicHierarchy { parent: 1 });
}

#[test]
fn self_parent_becomes_root() {
	let mut builder = FourDsBuilder::new();
	builder.dummy("loop", 1, FrameTransform::default());
	let decoded = decode_model(&builder.build()).expect("self parent decodes");

	assert_eq!(decoded.model.roots, vec![0]);
	assert_eq!(decoded.diagnostics.count(Severity::Warning), 1);
}

#[test]
fn parent_past_frame_table_is_dangling() {
	let mut builder = FourDsBuilder::new();
	builder.dummy("orphan", 9, FrameTransform::default());
	let decoded = decode_model(&builder.build()).expect("dangling parent decodes");

	assert_eq!(decoded.model.roots, vec![0]);
	assert_eq!(
		decoded.diagnostics.items()[0].kind,
		DiagnosticKind::DanglingReference { what: "frame", index: 9 }
	);
}

#[test]
fn instance_frames_share_mesh_table_entry() {
	let mut builder = FourDsBuilder::new();
	builder
		.material("WOOD.BMP")
		.mesh("box", 0, FrameTransform::default(), &[LodSpec::cube(1)])
		.instance("box_copy", 0, FrameTransform::at([4.0, 0.0, 0.0]), 1)
		.instance("ghost", 0, FrameTransform::default(), 7);
	let decoded = decode_model(&builder.build()).expect("instances decode");
	let model = &decoded.model;

	assert_eq!(model.meshes.len(), 1);
	assert_eq!(model.nodes[0].mesh, Some(0));
	assert_eq!(model.nodes[1].mesh, Some(0));
	assert_eq!(model.nodes[1].materials, vec![0]);
	assert_eq!(model.nodes[2].mesh, None);
	assert_eq!(
		decoded.diagnostics.items()[0].kind,
		DiagnosticKind::DanglingReference { what: "instance", index: 7 }
	);
}

#[test]
fn unknown_frame_type_stops_decoding_but_keeps_prefix() {
	let mut builder = FourDsBuilder::new();
	builder
		.dummy("kept", 0, FrameTransform::default())
		.bare_frame(frame_type::LIGHT, "lamp", 1)
		.dummy("lost", 0, FrameTransform::default());
	let decoded = decode_model(&builder.build()).expect("partial decode");
	let model = &decoded.model;

	assert_eq!(model.nodes.len(), 2);
	assert_eq!(model.nodes[1].name, "lamp");
	assert_eq!(
		model.nodes[1].kind,
		NodeKind::Unsupported {
			frame_type: frame_type::LIGHT,
			visual_type: None,
		}
	);
	assert_eq!(model.nodes[1].parent, Some(0));
	assert_eq!(
		decoded.diagnostics.items()[0].kind,
		DiagnosticKind::UnsupportedFrame {
			frame_type: frame_type::LIGHT,
			visual_type: None,
			skipped: 1,
		}
	);
}

#[test]
fn special_frames_carry_their_payloads() {
	let mut builder = FourDsBuilder::new();
	builder
		.material("SKIN.BMP")
		.joint("spine", 0, FrameTransform::default(), 3)
		.single_mesh("body", 1, &[LodSpec::cube(1)], 3)
		.morph("face", 1, &[LodSpec::cube(0)], [0.0, 0.5, 0.0])
		.target("aim", 0, &[2, 3])
		.occluder("wall", 0, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[[0, 1, 2]])
		.sector("room", 0, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[[0, 1, 2]]);
	let decoded = decode_model(&builder.build()).expect("special frames decode");
	let model = &decoded.model;
	assert!(decoded.diagnostics.is_empty(), "{:?}", decoded.diagnostics);

	assert!(matches!(model.nodes[0].data, NodeData::Joint { bone_id: 3, .. }));

	let body = model.mesh_of(&model.nodes[1]).expect("skinned mesh");
	assert_eq!(body.skin.len(), 1);
	assert_eq!(body.skin[0].bones[0].bone_id, 3);
	assert_eq!(body.skin[0].bones[0].weights, vec![0.5, 0.5]);

	let face = model.mesh_of(&model.nodes[2]).expect("morph mesh");
	let morph = face.morph.as_ref().expect("morph data");
	let moved = morph.lods[0].channels[0].vertices[0][0].0;
	assert!(moved.abs_diff_eq(Vec3::new(-1.0, -0.5, -1.0), 1e-6));
	assert!(model.nodes[2].materials.is_empty());

	let NodeData::Target { links, .. } = &model.nodes[3].data else {
		panic!("target data");
	};
	assert_eq!(links, &vec![2, 3]);

	let NodeData::Occluder(hull) = &model.nodes[4].data else {
		panic!("occluder data");
	};
	assert_eq!(hull.faces, vec![[0, 1, 2]]);

	let NodeData::Sector(sector) = &model.nodes[5].data else {
		panic!("sector data");
	};
	assert_eq!(sector.portals.len(), 1);
	assert_eq!(sector.portals[0].positions.len(), 3);
	assert_eq!(model.roots, vec![0, 3, 4, 5]);
}

#[test]
fn every_truncation_is_reported_as_truncated_data() {
	let bytes = cube_model();
	for len in 0..bytes.len() {
		let err = decode_model(&bytes[..len]).expect_err("truncated model must fail");
		assert!(matches!(err, MafiaError::TruncatedData { .. }), "len {len}: {err:?}");
	}
}

#[test]
fn wrong_magic_and_version_are_rejected() {
	let mut bytes = cube_model();
	bytes[0] = b'X';
	assert!(matches!(decode_model(&bytes), Err(MafiaError::InvalidSignature { .. })));

	let mut bytes = cube_model();
	bytes[4] = 28;
	assert!(matches!(decode_model(&bytes), Err(MafiaError::UnsupportedVersion { version: 28 })));
}
