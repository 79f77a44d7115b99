use std::path::PathBuf;

use mafiadoc::mafia::{ImportConfig, Result, SceneGraph, SceneNode, WorldImport};

use crate::cmd::util::{DiagnosticSummaryJson, TransformJson, diagnostics_json, emit_json, parse_kind, parse_space, print_diagnostics, transform_label, with_depths};
use crate::cmd::world::LightJson;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Grammar override (`scene2` or `cache`); defaults to the file name.
	#[arg(long)]
	pub kind: Option<String>,
	/// Directory searched for `.4ds` files.
	#[arg(long)]
	pub asset_root: Option<PathBuf>,
	/// JSON import config; flags override its values.
	#[arg(long)]
	pub config: Option<PathBuf>,
	/// `parent_relative` or `world_absolute`.
	#[arg(long)]
	pub space: Option<String>,
	#[arg(long)]
	pub json: bool,
}

/// Import a world with its models and print the resulting scene forest.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		kind,
		asset_root,
		config,
		space,
		json,
	} = args;

	let mut import_config = match config {
		Some(config_path) => ImportConfig::load(config_path)?,
		None => ImportConfig::default(),
	};
	if asset_root.is_some() {
		import_config.asset_root = asset_root;
	}
	if let Some(value) = space {
		import_config.transform_space = parse_space(&value)?;
	}
	import_config.validate()?;
	let kind = kind.as_deref().map(parse_kind).transpose()?;

	let asset_root = import_config.asset_root_for(&path);
	let space = import_config.transform_space;
	let output = WorldImport::new(import_config).run(&path, kind)?;
	let graph = &output.scene.graph;

	if json {
		let payload = SceneJson {
			path: path.display().to_string(),
			kind: output.kind.as_str(),
			asset_root: asset_root.display().to_string(),
			space: space.as_str(),
			records: output.records.len(),
			skipped: output.scene.skipped,
			resolved: graph.nodes.iter().filter(|node| node.model.is_some()).count(),
			unresolved: graph.nodes.iter().filter(|node| node.is_unresolved()).map(|node| node.name.clone()).collect(),
			roots: graph.roots.clone(),
			synthetic_root: graph.synthetic_root,
			nodes: graph.nodes.iter().enumerate().map(|(id, node)| SceneNodeJson::new(id, node)).collect(),
			diagnostics: diagnostics_json(&output.diagnostics),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("kind: {}", output.kind.as_str());
	println!("asset_root: {}", asset_root.display());
	println!("space: {}", space.as_str());
	println!("records: {} (skipped {})", output.records.len(), output.scene.skipped);
	println!("nodes: {}", graph.len());
	print_tree(graph);
	print_diagnostics(&output.diagnostics);

	Ok(())
}

fn print_tree(graph: &SceneGraph) {
	for (id, depth) in with_depths(graph.walk(), graph.len(), |id| graph.nodes[id].parent) {
		let node = &graph.nodes[id];
		let asset = match (&node.asset, &node.model) {
			(Some(asset), Some(_)) => format!(" asset={asset}"),
			(Some(asset), None) => format!(" asset={asset} (unresolved)"),
			_ => String::new(),
		};
		let label = if node.is_synthetic() { "synthetic" } else { node.object_type.as_str() };
		println!("{}{} [{}]{} {}", "  ".repeat(depth + 1), node.name, label, asset, transform_label(&node.world));
	}
}

#[derive(serde::Serialize)]
struct SceneNodeJson {
	id: usize,
	name: String,
	object_type: &'static str,
	synthetic: bool,
	parent: Option<usize>,
	children: Vec<usize>,
	asset: Option<String>,
	resolved: bool,
	model_nodes: Option<usize>,
	hidden: bool,
	local: TransformJson,
	world: TransformJson,
	light: Option<LightJson>,
}

impl SceneNodeJson {
	fn new(id: usize, node: &SceneNode) -> Self {
		Self {
			id,
			name: node.name.clone(),
			object_type: node.object_type.as_str(),
			synthetic: node.is_synthetic(),
			parent: node.parent,
			children: node.children.clone(),
			asset: node.asset.clone(),
			resolved: node.model.is_some(),
			model_nodes: node.model.as_ref().map(|model| model.nodes.len()),
			hidden: node.hidden,
			local: TransformJson::from(&node.local),
			world: TransformJson::from(&node.world),
			light: node.light.as_ref().map(LightJson::from),
		}
	}
}

#[derive(serde::Serialize)]
struct SceneJson {
	path: String,
	kind: &'static str,
	asset_root: String,
	space: &'static str,
	records: usize,
	skipped: usize,
	resolved: usize,
	unresolved: Vec<String>,
	roots: Vec<usize>,
	synthetic_root: Option<usize>,
	nodes: Vec<SceneNodeJson>,
	diagnostics: DiagnosticSummaryJson,
}
