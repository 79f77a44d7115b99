use std::path::PathBuf;

use mafiadoc::mafia::{Material, MeshData, Model, ModelFile, ModelNode, NodeKind, Result};

use crate::cmd::util::{DiagnosticSummaryJson, TransformJson, diagnostics_json, emit_json, print_diagnostics, transform_label, with_depths};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Decode a `.4ds` file and print its tables and node tree.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;
	let ModelFile { model, diagnostics } = ModelFile::open(&path)?;

	if json {
		let payload = ModelJson {
			path: path.display().to_string(),
			version: model.header.version,
			timestamp: model.header.timestamp,
			animated: model.animated,
			materials: model.materials.iter().map(MaterialJson::from).collect(),
			meshes: model.meshes.iter().map(MeshJson::from).collect(),
			nodes: model.nodes.iter().enumerate().map(|(id, node)| NodeJson::new(id, node)).collect(),
			roots: model.roots.clone(),
			diagnostics: diagnostics_json(&diagnostics),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("version: {}", model.header.version);
	println!("animated: {}", model.animated);
	println!("materials: {}", model.materials.len());
	for material in &model.materials {
		println!(
			"  [{}] {} flags=0x{:08x}{}{}",
			material.id,
			material.name,
			material.flags.0,
			if material.two_sided() { " two_sided" } else { "" },
			if material.transparent() { " transparent" } else { "" }
		);
	}
	println!("meshes: {}", model.meshes.len());
	for mesh in &model.meshes {
		let lods: Vec<String> = mesh
			.lods
			.iter()
			.map(|lod| format!("{}v/{}t", lod.positions.len(), lod.triangle_count()))
			.collect();
		println!("  [{}] lods={}", mesh.id, lods.join(" "));
	}
	println!("nodes: {}", model.nodes.len());
	print_tree(&model);
	print_diagnostics(&diagnostics);

	Ok(())
}

fn print_tree(model: &Model) {
	for (id, depth) in with_depths(model.walk(), model.nodes.len(), |id| model.nodes[id].parent) {
		let node = &model.nodes[id];
		let mesh = node.mesh.map(|mesh| format!(" mesh={mesh}")).unwrap_or_default();
		println!("{}{} [{}]{} {}", "  ".repeat(depth + 1), node.name, kind_label(node.kind), mesh, transform_label(&node.local));
	}
}

fn kind_label(kind: NodeKind) -> String {
	match kind {
		NodeKind::Mesh(visual) => format!("mesh/{}", visual.as_str()),
		NodeKind::Unsupported {
			frame_type,
			visual_type: Some(visual),
		} => format!("unsupported/{frame_type}:{visual}"),
		NodeKind::Unsupported { frame_type, visual_type: None } => format!("unsupported/{frame_type}"),
		other => other.as_str().to_owned(),
	}
}

#[derive(serde::Serialize)]
struct MaterialJson {
	id: usize,
	name: String,
	flags: u32,
	diffuse_texture: Option<String>,
	alpha_texture: Option<String>,
	two_sided: bool,
	transparent: bool,
}

impl From<&Material> for MaterialJson {
	fn from(value: &Material) -> Self {
		Self {
			id: value.id,
			name: value.name.clone(),
			flags: value.flags.0,
			diffuse_texture: value.diffuse_texture.clone(),
			alpha_texture: value.alpha_texture.clone(),
			two_sided: value.two_sided(),
			transparent: value.transparent(),
		}
	}
}

#[derive(serde::Serialize)]
struct LodJson {
	clipping_range: f32,
	vertices: usize,
	triangles: usize,
}

#[derive(serde::Serialize)]
struct MeshJson {
	id: usize,
	lods: Vec<LodJson>,
	skinned: bool,
	morphed: bool,
}

impl From<&MeshData> for MeshJson {
	fn from(value: &MeshData) -> Self {
		Self {
			id: value.id,
			lods: value
				.lods
				.iter()
				.map(|lod| LodJson {
					clipping_range: lod.clipping_range,
					vertices: lod.positions.len(),
					triangles: lod.triangle_count(),
				})
				.collect(),
			skinned: !value.skin.is_empty(),
			morphed: value.morph.is_some(),
		}
	}
}

#[derive(serde::Serialize)]
struct NodeJson {
	id: usize,
	frame_id: u16,
	name: String,
	kind: String,
	parent: Option<usize>,
	children: Vec<usize>,
	mesh: Option<usize>,
	materials: Vec<usize>,
	transform: TransformJson,
	user_props: String,
}

impl NodeJson {
	fn new(id: usize, node: &ModelNode) -> Self {
		Self {
			id,
			frame_id: node.frame_id,
			name: node.name.clone(),
			kind: kind_label(node.kind),
			parent: node.parent,
			children: node.children.clone(),
			mesh: node.mesh,
			materials: node.materials.clone(),
			transform: TransformJson::from(&node.local),
			user_props: node.user_props.clone(),
		}
	}
}

#[derive(serde::Serialize)]
struct ModelJson {
	path: String,
	version: u16,
	timestamp: u64,
	animated: bool,
	materials: Vec<MaterialJson>,
	meshes: Vec<MeshJson>,
	nodes: Vec<NodeJson>,
	roots: Vec<usize>,
	diagnostics: DiagnosticSummaryJson,
}
