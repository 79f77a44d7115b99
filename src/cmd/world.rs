use std::fs;
use std::path::PathBuf;

use mafiadoc::mafia::{Light, PlacementRecord, Result, WorldKind, decode_world};

use crate::cmd::util::{DiagnosticSummaryJson, TransformJson, diagnostics_json, emit_json, parse_kind, print_diagnostics, tag_hex, transform_label, vec3};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Grammar override (`scene2` or `cache`); defaults to the file name.
	#[arg(long)]
	pub kind: Option<String>,
	#[arg(long)]
	pub json: bool,
}

/// Decode a world file and print its placement records.
pub fn run(args: Args) -> Result<()> {
	let Args { path, kind, json } = args;
	let kind = match kind {
		Some(value) => parse_kind(&value)?,
		None => WorldKind::from_file_name(&path)?,
	};

	let bytes = fs::read(&path)?;
	let world = decode_world(&bytes, kind)?;

	if json {
		let payload = WorldJson {
			path: path.display().to_string(),
			kind: kind.as_str(),
			records: world.records.iter().map(RecordJson::from).collect(),
			unrecognized: world.unrecognized.iter().map(|tag| tag_hex(*tag)).collect(),
			diagnostics: diagnostics_json(&world.diagnostics),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("kind: {}", kind.as_str());
	println!("records: {}", world.records.len());
	println!("name\ttype\tparent\tasset\ttransform");
	for record in &world.records {
		println!(
			"{}\t{}\t{}\t{}\t{}",
			record.name,
			record.object_type.as_str(),
			record.parent.as_deref().unwrap_or("-"),
			record.asset.as_deref().unwrap_or("-"),
			transform_label(&record.transform)
		);
	}
	if !world.unrecognized.is_empty() {
		let tags: Vec<String> = world.unrecognized.iter().map(|tag| tag_hex(*tag)).collect();
		println!("unrecognized: {}", tags.join(" "));
	}
	print_diagnostics(&world.diagnostics);

	Ok(())
}

#[derive(serde::Serialize)]
pub(crate) struct LightJson {
	kind: &'static str,
	color: [f32; 3],
	power: f32,
	near: f32,
	far: f32,
	cone: f32,
}

impl From<&Light> for LightJson {
	fn from(value: &Light) -> Self {
		Self {
			kind: value.kind.as_str(),
			color: vec3(value.color),
			power: value.power,
			near: value.near,
			far: value.far,
			cone: value.cone,
		}
	}
}

#[derive(serde::Serialize)]
struct RecordJson {
	name: String,
	object_type: &'static str,
	special_type: &'static str,
	parent: Option<String>,
	asset: Option<String>,
	group: Option<String>,
	hidden: bool,
	offset: usize,
	transform: TransformJson,
	light: Option<LightJson>,
}

impl From<&PlacementRecord> for RecordJson {
	fn from(value: &PlacementRecord) -> Self {
		Self {
			name: value.name.clone(),
			object_type: value.object_type.as_str(),
			special_type: value.special_type.as_str(),
			parent: value.parent.clone(),
			asset: value.asset.clone(),
			group: value.group.clone(),
			hidden: value.hidden,
			offset: value.offset,
			transform: TransformJson::from(&value.transform),
			light: value.light.as_ref().map(LightJson::from),
		}
	}
}

#[derive(serde::Serialize)]
struct WorldJson {
	path: String,
	kind: &'static str,
	records: Vec<RecordJson>,
	unrecognized: Vec<String>,
	diagnostics: DiagnosticSummaryJson,
}
