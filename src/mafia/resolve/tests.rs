use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use mafiadoc_testkit::{FourDsBuilder, FrameTransform, LodSpec, scratch_dir};

use super::{AssetResolver, ModelLibrary};
use crate::mafia::{DiagnosticKind, Model, decode_model};

fn model_bytes(name: &str) -> Vec<u8> {
	let mut builder = FourDsBuilder::new();
	builder.material("TEX.BMP").mesh(name, 0, FrameTransform::default(), &[LodSpec::cube(1)]);
	builder.build()
}

#[test]
fn lookup_prefers_root_then_models_then_walk() {
	let root = scratch_dir("resolve-order");
	fs::create_dir_all(root.join("models")).expect("models dir");
	fs::create_dir_all(root.join("deep/nested")).expect("nested dir");
	fs::write(root.join("crate.4ds"), model_bytes("at_root")).expect("write root model");
	fs::write(root.join("models/crate.4ds"), model_bytes("in_models")).expect("write models model");
	fs::write(root.join("models/barrel.4ds"), model_bytes("barrel")).expect("write barrel");
	fs::write(root.join("deep/nested/Fence.4DS"), model_bytes("fence")).expect("write fence");

	let library = ModelLibrary::new(&root);
	assert_eq!(library.locate("crate.4ds"), Some(root.join("crate.4ds")));
	assert_eq!(library.locate("barrel.4ds"), Some(root.join("models/barrel.4ds")));

	let fence = library.resolve("fence.4ds").expect("walk finds fence");
	assert_eq!(fence.nodes[0].name, "fence");
	let crate_model = library.resolve("crate.4ds").expect("root model");
	assert_eq!(crate_model.nodes[0].name, "at_root");
	assert!(library.resolve("missing.4ds").is_none());
}

#[test]
fn cache_decodes_each_name_once() {
	let root = scratch_dir("resolve-cache");
	fs::write(root.join("lamp.4ds"), model_bytes("lamp")).expect("write lamp");
	fs::write(root.join("bench.4ds"), model_bytes("bench")).expect("write bench");

	let library = ModelLibrary::new(&root);
	library.preload(["lamp.4ds", "LAMP.4ds", "bench.4ds", "lamp.4ds", "gone.4ds"]);
	assert_eq!(library.decode_count(), 2);

	let first = library.resolve("lamp.4ds").expect("lamp resolves");
	let second = library.resolve("Lamp.4DS").expect("lamp resolves again");
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(library.decode_count(), 2);
}

#[test]
fn corrupt_model_is_cached_as_missing() {
	let root = scratch_dir("resolve-corrupt");
	let bytes = model_bytes("broken");
	fs::write(root.join("broken.4ds"), &bytes[..bytes.len() / 2]).expect("write broken");

	let library = ModelLibrary::new(&root);
	assert!(library.resolve("broken.4ds").is_none());
	assert!(library.resolve("broken.4ds").is_none());
	assert_eq!(library.decode_count(), 1);

	let diagnostics = library.diagnostics();
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics.items()[0].subject, "broken.4ds");
	assert!(matches!(
		&diagnostics.items()[0].kind,
		DiagnosticKind::ModelDecodeFailed { error } if error.starts_with("truncated data")
	));
}

#[test]
fn concurrent_requests_for_one_name_decode_once() {
	let root = scratch_dir("resolve-single-flight");
	fs::write(root.join("lamp.4ds"), model_bytes("lamp")).expect("write lamp");

	let library = ModelLibrary::new(&root);
	let models: Vec<Arc<Model>> = std::thread::scope(|scope| {
		let handles: Vec<_> = (0..16)
			.map(|idx| {
				let library = &library;
				scope.spawn(move || {
					let name = if idx % 2 == 0 { "lamp.4ds" } else { "LAMP.4DS" };
					library.resolve(name).expect("lamp resolves")
				})
			})
			.collect();
		handles.into_iter().map(|handle| handle.join().expect("resolver thread")).collect()
	});

	assert_eq!(library.decode_count(), 1);
	assert!(models.iter().all(|model| Arc::ptr_eq(model, &models[0])));
}

#[test]
fn decode_diagnostics_are_prefixed_with_asset() {
	let root = scratch_dir("resolve-diags");
	let mut builder = FourDsBuilder::new();
	builder.dummy("orphan", 4, FrameTransform::default());
	fs::write(root.join("odd.4ds"), builder.build()).expect("write odd");

	let library = ModelLibrary::new(&root);
	library.resolve("odd.4ds").expect("odd resolves");
	let diagnostics = library.diagnostics();
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics.items()[0].subject, "odd.4ds:orphan");
}

#[test]
fn in_memory_map_resolves_case_insensitively() {
	let model = Arc::new(decode_model(&model_bytes("box")).expect("box decodes").model);
	let mut map = HashMap::new();
	map.insert("box.4ds".to_owned(), model.clone());

	assert!(Arc::ptr_eq(&map.resolve("BOX.4ds").expect("resolves"), &model));
	assert!(map.resolve("other.4ds").is_none());
}
