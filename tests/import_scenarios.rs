#![allow(missing_docs)]

use std::fs;
use std::sync::Arc;

use mafiadoc::mafia::{
	DiagnosticKind, ImportConfig, MafiaError, ModelFile, ModelLibrary, ObjectType, PlacementRecord, Severity, SpecialType, Transform, WorldImport, WorldKind,
	build_scene_graph, decode_model, decode_world,
};
use mafiadoc_testkit::{CacheBuilder, CacheInstance, ElementSpec, FourDsBuilder, FrameTransform, LodSpec, Scene2Builder, scratch_dir};

fn crate_model() -> Vec<u8> {
	let mut builder = FourDsBuilder::new();
	builder
		.material("CRATE.BMP")
		.dummy("root", 0, FrameTransform::default())
		.mesh("crate", 1, FrameTransform::at([0.0, 0.5, 0.0]), &[LodSpec::cube(1)]);
	builder.build()
}

#[test]
fn cube_model_decodes_identically_twice() {
	let bytes = crate_model();
	let first = decode_model(&bytes).expect("first decode").model;
	let second = decode_model(&bytes).expect("second decode").model;

	assert_eq!(first.materials.len(), 1);
	assert_eq!(first.nodes.len(), 2);
	let node = first.node_by_name("crate").expect("mesh node");
	let lod = first.mesh_of(node).and_then(|mesh| mesh.base_lod()).expect("mesh lod");
	assert_eq!(lod.positions.len(), 8);
	assert_eq!(lod.triangle_count(), 12);

	assert_eq!(first.meshes, second.meshes);
	for (a, b) in first.nodes.iter().zip(&second.nodes) {
		assert_eq!(a.parent, b.parent);
		assert_eq!(a.local, b.local);
	}
}

#[test]
fn truncated_model_is_rejected_at_every_cut() {
	let bytes = crate_model();
	for cut in 0..bytes.len() {
		let err = decode_model(&bytes[..cut]).expect_err("truncated model must fail");
		assert!(matches!(err, MafiaError::TruncatedData { .. }), "cut {cut}: unexpected error {err}");
	}
}

#[test]
fn lamp_with_missing_glass_asset_builds_two_node_forest() {
	let dir = scratch_dir("lamp");
	let mut world = Scene2Builder::new();
	world
		.object(ElementSpec::light("Lamp01", None, [0.0, 0.0, 3.0]))
		.object(ElementSpec::model("Lamp01_glass", "glass.4ds", Some("Lamp01"), [0.0, 0.0, -0.2]));
	let path = dir.join("scene2.bin");
	fs::write(&path, world.build()).expect("world writes");

	let output = WorldImport::new(ImportConfig::default()).run(&path, None).expect("import succeeds");
	let graph = &output.scene.graph;

	assert_eq!(output.kind, WorldKind::Scene2);
	assert_eq!(graph.len(), 2);
	assert_eq!(graph.synthetic_root, None);
	let lamp = graph.find("Lamp01").expect("lamp node");
	let glass = graph.find("Lamp01_glass").expect("glass node");
	assert_eq!(graph.roots, vec![lamp]);
	assert_eq!(graph.nodes[glass].parent, Some(lamp));
	assert!(graph.nodes[glass].is_unresolved());
	assert_eq!(graph.nodes[lamp].object_type, ObjectType::Light);

	let unresolved: Vec<_> = output
		.diagnostics
		.matching(|kind| matches!(kind, DiagnosticKind::UnresolvedAsset { .. }))
		.collect();
	assert_eq!(unresolved.len(), 1);
	assert_eq!(unresolved[0].subject, "Lamp01_glass");
	assert_eq!(unresolved[0].severity(), Severity::Warning);
}

#[test]
fn cache_instances_share_one_decoded_model() {
	let dir = scratch_dir("cache");
	fs::create_dir_all(dir.join("models")).expect("models dir");
	fs::write(dir.join("models").join("crate.4ds"), crate_model()).expect("model writes");

	let mut cache = CacheBuilder::new();
	cache.group(
		"dock",
		vec![
			CacheInstance::at("CRATE.I3D", [1.0, 0.0, 0.0]),
			CacheInstance::at("crate.4ds", [2.0, 0.0, 0.0]),
			CacheInstance::at("barrel.4ds", [3.0, 0.0, 0.0]),
		],
	);
	let world = decode_world(&cache.build(), WorldKind::Cache).expect("cache decodes");
	assert_eq!(world.records.len(), 3);

	let library = ModelLibrary::new(&dir);
	let build = build_scene_graph(&world.records, &library, &ImportConfig::default().build_options());
	let graph = &build.graph;

	let first = graph.nodes[0].model.as_ref().expect("first crate resolves");
	let second = graph.nodes[1].model.as_ref().expect("second crate resolves");
	assert!(Arc::ptr_eq(first, second));
	assert!(graph.nodes[2].is_unresolved());
	assert_eq!(library.decode_count(), 1);
	assert_eq!(graph.nodes[1].group.as_deref(), Some("dock"));
}

#[test]
fn cyclic_world_parents_still_form_a_forest() {
	let mut records: Vec<PlacementRecord> = ["A", "B", "C"]
		.iter()
		.zip(["B", "A", ""])
		.map(|(name, parent)| PlacementRecord {
			name: (*name).to_owned(),
			object_type: ObjectType::Unset,
			special_type: SpecialType::Unset,
			transform: Transform::IDENTITY,
			parent: Some(parent.to_owned()).filter(|parent| !parent.is_empty()),
			asset: None,
			light: None,
			hidden: false,
			group: None,
			offset: 0,
		})
		.collect();
	records[2].parent = Some("Primary sector".to_owned());

	let library = ModelLibrary::new(scratch_dir("cycle"));
	let build = build_scene_graph(&records, &library, &ImportConfig::default().build_options());
	let graph = &build.graph;

	assert!(graph.len() <= records.len() + 1);
	assert_eq!(graph.walk().len(), graph.len(), "every node reachable exactly once");
	assert_eq!(build.diagnostics.matching(|kind| matches!(kind, DiagnosticKind::CyclicParent { .. })).count(), 1);
	assert!(graph.synthetic_root.is_some());
}

#[test]
fn model_file_open_reports_missing_files() {
	let dir = scratch_dir("open");
	let err = ModelFile::open(dir.join("absent.4ds")).expect_err("missing file fails");
	assert!(matches!(err, MafiaError::Io(_)));

	let path = dir.join("crate.4ds");
	fs::write(&path, crate_model()).expect("model writes");
	let file = ModelFile::open(&path).expect("model opens");
	assert!(file.diagnostics.is_empty());
	assert_eq!(file.model.roots, vec![0]);
}
