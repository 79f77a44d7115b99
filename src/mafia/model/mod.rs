use std::fs;
use std::path::Path;

use crate::mafia::bytes::Cursor;
use crate::mafia::frame::{RawFrame, parse_frame};
use crate::mafia::{DiagnosticKind, Diagnostics, FourDsHeader, Material, MeshData, NodeData, NodeKind, Result, Transform};

/// Index of a node inside [`Model::nodes`].
pub type NodeId = usize;

/// One node of a model hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
	/// Frame name.
	pub name: String,
	/// 1-based frame id as used by parent references in the file.
	pub frame_id: u16,
	/// Node-type tag.
	pub kind: NodeKind,
	/// Transform relative to the parent node.
	pub local: Transform,
	/// Parent node, `None` for roots.
	pub parent: Option<NodeId>,
	/// Children in file order.
	pub children: Vec<NodeId>,
	/// Mesh table entry rendered by this node.
	pub mesh: Option<usize>,
	/// Distinct materials used by the mesh, in first-use order.
	pub materials: Vec<usize>,
	/// Raw culling flags.
	pub culling_flags: u8,
	/// Raw render flags of visual frames.
	pub render_flags: [u8; 2],
	/// Free-form user property string.
	pub user_props: String,
	/// Type-specific data.
	pub data: NodeData,
}

/// Decoded `.4ds` model: material table, mesh table, and node forest.
///
/// Immutable after decoding; shared read-only between scene nodes through `Arc<Model>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
	/// File header.
	pub header: FourDsHeader,
	/// Material table.
	pub materials: Vec<Material>,
	/// Mesh table.
	pub meshes: Vec<MeshData>,
	/// Node arena in file order.
	pub nodes: Vec<ModelNode>,
	/// Top-level nodes in file order.
	pub roots: Vec<NodeId>,
	/// Trailing animation flag.
	pub animated: bool,
}

impl Model {
	/// Look up a node by exact name.
	pub fn node_by_name(&self, name: &str) -> Option<&ModelNode> {
		self.nodes.iter().find(|node| node.name == name)
	}

	/// Mesh attached to `node`, if any.
	pub fn mesh_of(&self, node: &ModelNode) -> Option<&MeshData> {
		node.mesh.and_then(|id| self.meshes.get(id))
	}

	/// Node ids in depth-first pre-order, roots first.
	pub fn walk(&self) -> Vec<NodeId> {
		let mut out = Vec::with_capacity(self.nodes.len());
		let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
		while let Some(id) = stack.pop() {
			out.push(id);
			stack.extend(self.nodes[id].children.iter().rev().copied());
		}
		out
	}

	/// Model-space transform of `id`, composing the parent chain root-first.
	pub fn model_transform(&self, id: NodeId) -> Transform {
		let mut chain = Vec::new();
		let mut current = Some(id);
		while let Some(node) = current {
			chain.push(node);
			current = self.nodes[node].parent;
		}
		chain
			.iter()
			.rev()
			.fold(Transform::IDENTITY, |acc, node| acc.compose(&self.nodes[*node].local))
	}
}

/// Successful model decode with its diagnostics.
#[derive(Debug, Clone)]
pub struct ModelDecode {
	/// Decoded model.
	pub model: Model,
	/// Recoverable problems encountered while decoding.
	pub diagnostics: Diagnostics,
}

/// Decode a `.4ds` file from memory.
pub fn decode_model(bytes: &[u8]) -> Result<ModelDecode> {
	let mut cursor = Cursor::new(bytes);
	let mut diagnostics = Diagnostics::new();

	let header = FourDsHeader::parse(&mut cursor)?;

	let material_count = usize::from(cursor.read_u16()?);
	let mut materials = Vec::with_capacity(material_count);
	for id in 0..material_count {
		materials.push(Material::parse(&mut cursor, id)?);
	}

	let frame_count = usize::from(cursor.read_u16()?);
	let mut meshes = Vec::new();
	let mut frames = Vec::with_capacity(frame_count);
	let mut stopped = false;
	for idx in 0..frame_count {
		let frame = parse_frame(&mut cursor, materials.len(), &mut meshes, &mut diagnostics)?;
		if let NodeKind::Unsupported { frame_type, visual_type } = frame.kind {
			diagnostics.push(
				frame.name.clone(),
				DiagnosticKind::UnsupportedFrame {
					frame_type,
					visual_type,
					skipped: frame_count - idx - 1,
				},
			);
			frames.push(frame);
			stopped = true;
			break;
		}
		frames.push(frame);
	}

	// The trailing flag is only reachable when every frame was understood.
	let animated = if stopped { false } else { cursor.read_u8()? != 0 };

	resolve_instances(&mut frames, &mut diagnostics);
	let (nodes, roots) = assemble_tree(frames, &materials_of(&meshes), &mut diagnostics);

	log::debug!(
		"decoded 4ds: {} materials, {} meshes, {} nodes, {} diagnostics",
		materials.len(),
		meshes.len(),
		nodes.len(),
		diagnostics.len()
	);

	Ok(ModelDecode {
		model: Model {
			header,
			materials,
			meshes,
			nodes,
			roots,
			animated,
		},
		diagnostics,
	})
}

/// Point instance frames at the mesh of the frame they reuse.
fn resolve_instances(frames: &mut [RawFrame], diags: &mut Diagnostics) {
	for idx in 0..frames.len() {
		let Some(instance_of) = frames[idx].instance_of else {
			continue;
		};
		let target = usize::from(instance_of).checked_sub(1).and_then(|target| frames.get(target)).and_then(|frame| frame.mesh);
		match target {
			Some(mesh) => frames[idx].mesh = Some(mesh),
			None => diags.push(
				frames[idx].name.clone(),
				DiagnosticKind::DanglingReference {
					what: "instance",
					index: u32::from(instance_of),
				},
			),
		}
	}
}

fn materials_of(meshes: &[MeshData]) -> Vec<Vec<usize>> {
	meshes
		.iter()
		.map(|mesh| {
			let mut used = Vec::new();
			for group in mesh.lods.iter().flat_map(|lod| lod.face_groups.iter()) {
				if let Some(material) = group.material
					&& !used.contains(&material)
				{
					used.push(material);
				}
			}
			used
		})
		.collect()
}

/// Turn 1-based parent frame ids into tree links.
///
/// Links are accepted in file order; a link whose parent chain (over links accepted so far)
/// reaches the child would close a cycle and is cut, leaving the child as a root.
fn assemble_tree(frames: Vec<RawFrame>, mesh_materials: &[Vec<usize>], diags: &mut Diagnostics) -> (Vec<ModelNode>, Vec<NodeId>) {
	let count = frames.len();
	let mut nodes: Vec<ModelNode> = frames
		.into_iter()
		.enumerate()
		.map(|(idx, frame)| ModelNode {
			materials: frame.mesh.and_then(|mesh| mesh_materials.get(mesh)).cloned().unwrap_or_default(),
			name: frame.name,
			frame_id: (idx + 1) as u16,
			kind: frame.kind,
			local: frame.transform,
			parent: declared_parent(frame.parent_id),
			children: Vec::new(),
			mesh: frame.mesh,
			culling_flags: frame.culling_flags,
			render_flags: frame.render_flags,
			user_props: frame.user_props,
			data: frame.data,
		})
		.collect();

	let mut accepted: Vec<Option<NodeId>> = vec![None; count];
	for idx in 0..count {
		let Some(parent) = nodes[idx].parent else {
			continue;
		};

		let declared = (parent + 1) as u32;
		if parent >= count {
			diags.push(
				nodes[idx].name.clone(),
				DiagnosticKind::DanglingReference {
					what: "frame",
					index: declared,
				},
			);
			continue;
		}

		if reaches(&accepted, parent, idx) {
			diags.push(nodes[idx].name.clone(), DiagnosticKind::CyclicHierarchy { parent: declared });
			continue;
		}

		accepted[idx] = Some(parent);
	}

	let mut roots = Vec::new();
	for idx in 0..count {
		nodes[idx].parent = accepted[idx];
		match accepted[idx] {
			Some(parent) => nodes[parent].children.push(idx),
			None => roots.push(idx),
		}
	}

	(nodes, roots)
}

fn declared_parent(parent_id: u16) -> Option<NodeId> {
	usize::from(parent_id).checked_sub(1)
}

/// Walk accepted parent links from `start`; `true` when `target` is on the chain.
fn reaches(accepted: &[Option<NodeId>], start: NodeId, target: NodeId) -> bool {
	let mut current = Some(start);
	while let Some(node) = current {
		if node == target {
			return true;
		}
		current = accepted[node];
	}
	false
}

/// Model-only import from disk.
#[derive(Debug)]
pub struct ModelFile {
	/// Decoded model.
	pub model: Model,
	/// Decode diagnostics.
	pub diagnostics: Diagnostics,
}

impl ModelFile {
	/// Read and decode a `.4ds` file.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let bytes = fs::read(path)?;
		let ModelDecode { model, diagnostics } = decode_model(&bytes)?;
		Ok(Self { model, diagnostics })
	}
}

#[cfg(test)]
mod tests;
