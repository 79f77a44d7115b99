#![allow(missing_docs)]

use std::fs;
use std::path::Path;
use std::process::Command;

use mafiadoc_testkit::{CacheBuilder, CacheInstance, ElementSpec, FourDsBuilder, FrameTransform, LodSpec, Scene2Builder, scratch_dir};
use serde_json::Value;

fn write_crate_model(path: &Path) {
	let mut builder = FourDsBuilder::new();
	builder
		.material("CRATE.BMP")
		.dummy("root", 0, FrameTransform::default())
		.mesh("crate", 1, FrameTransform::at([0.0, 1.0, 0.0]), &[LodSpec::cube(1)]);
	fs::write(path, builder.build()).expect("model writes");
}

#[test]
fn model_json_lists_nodes_and_meshes() {
	let dir = scratch_dir("cli-model");
	let path = dir.join("crate.4ds");
	write_crate_model(&path);

	let json = run_json(&["model", &path.display().to_string(), "--json"]);

	assert_eq!(json["version"], 29);
	assert_eq!(json["materials"][0]["diffuse_texture"], "crate.bmp");
	assert_eq!(json["meshes"][0]["lods"][0]["vertices"], 8);
	assert_eq!(json["meshes"][0]["lods"][0]["triangles"], 12);
	assert_eq!(json["nodes"][1]["name"], "crate");
	assert_eq!(json["nodes"][1]["parent"], 0);
	assert_eq!(json["roots"], serde_json::json!([0]));
	assert_eq!(json["diagnostics"]["warnings"], 0);
}

#[test]
fn world_json_lists_records_and_unrecognized_tags() {
	let dir = scratch_dir("cli-world");
	let mut world = Scene2Builder::new();
	world
		.extra_chunk(0x7777, &[1, 2, 3])
		.object(ElementSpec::light("Lamp01", None, [0.0, 0.0, 3.0]))
		.object(ElementSpec::model("Lamp01_glass", "GLASS.I3D", Some("Lamp01"), [0.0, 0.0, -0.2]));
	let path = dir.join("scene2.bin");
	fs::write(&path, world.build()).expect("world writes");

	let json = run_json(&["world", &path.display().to_string(), "--json"]);

	assert_eq!(json["kind"], "scene2");
	assert_eq!(json["records"][0]["name"], "Lamp01");
	assert_eq!(json["records"][0]["object_type"], "light");
	assert_eq!(json["records"][0]["light"]["kind"], "point");
	assert_eq!(json["records"][1]["asset"], "glass.4ds");
	assert_eq!(json["records"][1]["parent"], "Lamp01");
	assert_eq!(json["unrecognized"], serde_json::json!(["0x7777"]));
	assert_eq!(json["diagnostics"]["notes"], 1);
}

#[test]
fn scene_json_reports_resolution_and_roots() {
	let dir = scratch_dir("cli-scene");
	write_crate_model(&dir.join("crate.4ds"));
	let mut cache = CacheBuilder::new();
	cache.group("dock", vec![CacheInstance::at("crate.4ds", [1.0, 0.0, 0.0]), CacheInstance::at("barrel.4ds", [2.0, 0.0, 0.0])]);
	let path = dir.join("cache.bin");
	fs::write(&path, cache.build()).expect("cache writes");

	let json = run_json(&["scene", &path.display().to_string(), "--space", "world_absolute", "--json"]);

	assert_eq!(json["kind"], "cache");
	assert_eq!(json["space"], "world_absolute");
	assert_eq!(json["records"], 2);
	assert_eq!(json["resolved"], 1);
	assert_eq!(json["unresolved"], serde_json::json!(["barrel"]));
	assert_eq!(json["roots"], serde_json::json!([0, 1]));
	assert_eq!(json["nodes"][0]["model_nodes"], 2);
	assert_eq!(json["nodes"][1]["world"]["position"], serde_json::json!([2.0, 0.0, 0.0]));
	assert_eq!(json["diagnostics"]["warnings"], 1);
}

#[test]
fn scene_rejects_unknown_space_and_world_name() {
	let dir = scratch_dir("cli-errors");
	let path = dir.join("world.dat");
	fs::write(&path, [0_u8; 8]).expect("file writes");

	let output = run(&["scene", &path.display().to_string()]);
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("unknown world file"));

	let output = run(&["scene", &path.display().to_string(), "--kind", "cache", "--space", "sideways"]);
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("space"));
}

fn run(args: &[&str]) -> std::process::Output {
	Command::new(env!("CARGO_BIN_EXE_mafiadoc")).args(args).output().expect("command executes")
}

fn run_json(args: &[&str]) -> Value {
	let output = run(args);
	assert!(output.status.success(), "command should succeed: {}", String::from_utf8_lossy(&output.stderr));
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

#[test]
fn model_text_prints_deep_frame_chain() {
	let dir = scratch_dir("cli-chain");
	let mut builder = FourDsBuilder::new();
	let depth = 2000_u16;
	for idx in 0..depth {
		builder.dummy(&format!("link_{idx}"), idx, FrameTransform::default());
	}
	let path = dir.join("chain.4ds");
	fs::write(&path, builder.build()).expect("model writes");

	let output = run(&["model", &path.display().to_string()]);
	assert!(output.status.success(), "command should succeed: {}", String::from_utf8_lossy(&output.stderr));
	let stdout = String::from_utf8_lossy(&output.stdout);
	let last = stdout.lines().find(|line| line.trim_start().starts_with("link_1999 ")).expect("deepest frame printed");
	assert_eq!(last.len() - last.trim_start().len(), 2 * usize::from(depth));
}
