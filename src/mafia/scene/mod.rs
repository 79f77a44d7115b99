use std::collections::HashMap;
use std::sync::Arc;

use crate::mafia::{
	AssetResolver, DiagnosticKind, Diagnostics, Light, Model, ObjectType, PlacementRecord, Severity, SpecialType, Transform, TransformSpace,
};

/// Index of a node inside [`SceneGraph::nodes`].
pub type SceneNodeId = usize;

/// One positioned entity of the resolved scene.
#[derive(Debug, Clone)]
pub struct SceneNode {
	/// Entity name.
	pub name: String,
	/// Entity category.
	pub object_type: ObjectType,
	/// Gameplay category.
	pub special_type: SpecialType,
	/// Transform relative to the parent node.
	pub local: Transform,
	/// Transform in world space.
	pub world: Transform,
	/// Parent node, `None` for roots.
	pub parent: Option<SceneNodeId>,
	/// Children in record order.
	pub children: Vec<SceneNodeId>,
	/// Requested asset name; kept even when it did not resolve.
	pub asset: Option<String>,
	/// Resolved model, shared with every other node placing the same asset.
	pub model: Option<Arc<Model>>,
	/// Light parameters.
	pub light: Option<Light>,
	/// Hidden flag.
	pub hidden: bool,
	/// `cache.bin` group.
	pub group: Option<String>,
	/// Index of the source record in the builder input, `None` for the synthetic root.
	pub record: Option<usize>,
}

impl SceneNode {
	/// `true` when an asset was requested but no model could be resolved.
	pub fn is_unresolved(&self) -> bool {
		self.asset.is_some() && self.model.is_none()
	}

	/// `true` for the builder-created anchor of orphaned nodes.
	pub fn is_synthetic(&self) -> bool {
		self.record.is_none()
	}
}

/// Forest of scene nodes.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
	/// Node arena; record nodes first in input order, the synthetic root (if any) last.
	pub nodes: Vec<SceneNode>,
	/// Top-level nodes.
	pub roots: Vec<SceneNodeId>,
	/// Synthetic root, when any node needed one.
	pub synthetic_root: Option<SceneNodeId>,
}

impl SceneGraph {
	/// Number of nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Return `true` when the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// First node carrying `name`.
	pub fn find(&self, name: &str) -> Option<SceneNodeId> {
		self.nodes.iter().position(|node| node.name == name)
	}

	/// Node ids in depth-first pre-order, roots first.
	pub fn walk(&self) -> Vec<SceneNodeId> {
		let mut out = Vec::with_capacity(self.nodes.len());
		let mut stack: Vec<SceneNodeId> = self.roots.iter().rev().copied().collect();
		while let Some(id) = stack.pop() {
			out.push(id);
			stack.extend(self.nodes[id].children.iter().rev().copied());
		}
		out
	}
}

/// Builder behaviour switches.
#[derive(Debug, Clone)]
pub struct BuildOptions {
	/// How record transforms relate to their parent.
	pub space: TransformSpace,
	/// Parent names that denote the world itself.
	pub implicit_roots: Vec<String>,
	/// Name of the synthetic root created for orphaned nodes.
	pub synthetic_root_name: String,
	/// Keep only records of these object types; `None` keeps everything.
	pub object_types: Option<Vec<ObjectType>>,
	/// Also keep records of these special types when their object type is filtered out.
	pub special_types: Option<Vec<SpecialType>>,
}

impl Default for BuildOptions {
	fn default() -> Self {
		Self {
			space: TransformSpace::default(),
			implicit_roots: vec!["Primary sector".to_owned()],
			synthetic_root_name: "scene_root".to_owned(),
			object_types: None,
			special_types: None,
		}
	}
}

impl BuildOptions {
	fn keeps(&self, record: &PlacementRecord) -> bool {
		let Some(object_types) = &self.object_types else {
			return true;
		};
		object_types.contains(&record.object_type)
			|| self.special_types.as_ref().is_some_and(|types| types.contains(&record.special_type))
	}

	fn is_implicit_root(&self, parent: &str) -> bool {
		self.implicit_roots.iter().any(|name| name == parent)
	}
}

/// Progress event emitted once per processed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
	/// Records processed so far.
	pub processed: usize,
	/// Records to process.
	pub total: usize,
}

/// Builder output.
#[derive(Debug, Clone)]
pub struct SceneBuild {
	/// Resolved forest.
	pub graph: SceneGraph,
	/// Warnings and notes, each attributed to a record name.
	pub diagnostics: Diagnostics,
	/// Records dropped by the object-type filter.
	pub skipped: usize,
}

/// Merge placement records with resolved models into a scene forest.
pub fn build_scene_graph(records: &[PlacementRecord], resolver: &dyn AssetResolver, options: &BuildOptions) -> SceneBuild {
	build_scene_graph_with_progress(records, resolver, options, |_| {})
}

/// [`build_scene_graph`] reporting a [`BuildProgress`] after every record.
pub fn build_scene_graph_with_progress(
	records: &[PlacementRecord],
	resolver: &dyn AssetResolver,
	options: &BuildOptions,
	mut progress: impl FnMut(BuildProgress),
) -> SceneBuild {
	let mut diagnostics = Diagnostics::new();

	let kept: Vec<(usize, &PlacementRecord)> = records.iter().enumerate().filter(|(_, record)| options.keeps(record)).collect();
	let skipped = records.len() - kept.len();
	if skipped > 0 {
		log::info!("type filter skipped {skipped} records");
	}

	let mut by_name: HashMap<&str, SceneNodeId> = HashMap::with_capacity(kept.len());
	let mut nodes = Vec::with_capacity(kept.len() + 1);
	let total = kept.len();

	for (id, (record_idx, record)) in kept.iter().enumerate() {
		if by_name.contains_key(record.name.as_str()) {
			diagnostics.push(record.name.clone(), DiagnosticKind::DuplicateName);
		} else {
			by_name.insert(record.name.as_str(), id);
		}

		let model = record.asset.as_deref().and_then(|asset| {
			let model = resolver.resolve(asset);
			if model.is_none() {
				diagnostics.push(record.name.clone(), DiagnosticKind::UnresolvedAsset { asset: asset.to_owned() });
			}
			model
		});

		nodes.push(SceneNode {
			name: record.name.clone(),
			object_type: record.object_type,
			special_type: record.special_type,
			local: record.transform,
			world: record.transform,
			parent: None,
			children: Vec::new(),
			asset: record.asset.clone(),
			model,
			light: record.light,
			hidden: record.hidden,
			group: record.group.clone(),
			record: Some(*record_idx),
		});

		progress(BuildProgress { processed: id + 1, total });
	}

	let links = link_parents(&kept, &by_name, options, &mut diagnostics);

	let mut roots = Vec::new();
	let mut synthetic_root = None;
	for (id, link) in links.iter().enumerate() {
		match link {
			Link::Root => roots.push(id),
			Link::Node(parent) => {
				nodes[id].parent = Some(*parent);
				nodes[*parent].children.push(id);
			}
			Link::Synthetic => {
				let anchor = *synthetic_root.get_or_insert_with(|| {
					nodes.push(synthetic_node(&options.synthetic_root_name));
					nodes.len() - 1
				});
				nodes[id].parent = Some(anchor);
				nodes[anchor].children.push(id);
			}
		}
	}
	roots.extend(synthetic_root);

	let mut graph = SceneGraph {
		nodes,
		roots,
		synthetic_root,
	};
	place(&mut graph, options.space);

	log::info!(
		"built scene graph: {} nodes, {} roots, {} warnings",
		graph.len(),
		graph.roots.len(),
		diagnostics.count(Severity::Warning)
	);

	SceneBuild {
		graph,
		diagnostics,
		skipped,
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
	Root,
	Node(SceneNodeId),
	Synthetic,
}

/// Resolve parent names into links, cutting any edge that would close a cycle.
fn link_parents(
	kept: &[(usize, &PlacementRecord)],
	by_name: &HashMap<&str, SceneNodeId>,
	options: &BuildOptions,
	diagnostics: &mut Diagnostics,
) -> Vec<Link> {
	let mut links = vec![Link::Root; kept.len()];

	for (id, (_, record)) in kept.iter().enumerate() {
		let Some(parent_name) = record.parent.as_deref().filter(|name| !name.is_empty()) else {
			continue;
		};
		if options.is_implicit_root(parent_name) {
			continue;
		}

		let Some(&parent) = by_name.get(parent_name) else {
			diagnostics.push(
				record.name.clone(),
				DiagnosticKind::UnresolvedParent {
					parent: parent_name.to_owned(),
				},
			);
			links[id] = Link::Synthetic;
			continue;
		};

		if reaches(&links, parent, id) {
			diagnostics.push(
				record.name.clone(),
				DiagnosticKind::CyclicParent {
					parent: parent_name.to_owned(),
				},
			);
			links[id] = Link::Synthetic;
			continue;
		}

		links[id] = Link::Node(parent);
	}

	links
}

/// Follow accepted node links from `start`; `true` when `target` is on the chain.
fn reaches(links: &[Link], start: SceneNodeId, target: SceneNodeId) -> bool {
	let mut current = start;
	loop {
		if current == target {
			return true;
		}
		match links[current] {
			Link::Node(parent) => current = parent,
			Link::Root | Link::Synthetic => return false,
		}
	}
}

fn synthetic_node(name: &str) -> SceneNode {
	SceneNode {
		name: name.to_owned(),
		object_type: ObjectType::Unset,
		special_type: SpecialType::Unset,
		local: Transform::IDENTITY,
		world: Transform::IDENTITY,
		parent: None,
		children: Vec::new(),
		asset: None,
		model: None,
		light: None,
		hidden: false,
		group: None,
		record: None,
	}
}

/// Fill `local`/`world` top-down according to `space`.
///
/// The stored record transform is taken as local for [`TransformSpace::ParentRelative`] and as
/// world for [`TransformSpace::WorldAbsolute`]; the other one is derived from the parent.
fn place(graph: &mut SceneGraph, space: TransformSpace) {
	for id in graph.walk() {
		let parent_world = graph.nodes[id].parent.map(|parent| graph.nodes[parent].world);
		let node = &mut graph.nodes[id];
		match (space, parent_world) {
			(_, None) => node.world = node.local,
			(TransformSpace::ParentRelative, Some(parent)) => node.world = parent.compose(&node.local),
			(TransformSpace::WorldAbsolute, Some(parent)) => node.local = parent.relative(&node.world),
		}
	}
}
