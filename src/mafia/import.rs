use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::mafia::{
	BuildOptions, BuildProgress, Diagnostics, MafiaError, ModelLibrary, ObjectType, PlacementRecord, Result, SceneBuild, SpecialType, TransformSpace,
	WorldKind, build_scene_graph_with_progress, decode_world,
};

/// Import settings, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
	/// Directory searched for `.4ds` files; defaults to the world file's directory.
	pub asset_root: Option<PathBuf>,
	/// How world transforms relate to their parent.
	pub transform_space: TransformSpace,
	/// Object types to import; `None` imports everything.
	pub object_types: Option<Vec<ObjectType>>,
	/// Special types imported even when their object type is filtered out.
	pub special_types: Option<Vec<SpecialType>>,
	/// Parent names that denote the world itself.
	pub implicit_roots: Vec<String>,
	/// Name of the anchor created for orphaned nodes.
	pub synthetic_root_name: String,
}

impl Default for ImportConfig {
	fn default() -> Self {
		let options = BuildOptions::default();
		Self {
			asset_root: None,
			transform_space: options.space,
			object_types: options.object_types,
			special_types: options.special_types,
			implicit_roots: options.implicit_roots,
			synthetic_root_name: options.synthetic_root_name,
		}
	}
}

impl ImportConfig {
	/// Read and validate a JSON config file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let text = fs::read_to_string(path)?;
		Self::from_json(&text)
	}

	/// Parse and validate JSON config text.
	pub fn from_json(text: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Reject values the builder cannot work with.
	pub fn validate(&self) -> Result<()> {
		if self.synthetic_root_name.trim().is_empty() {
			return Err(MafiaError::InvalidConfig {
				field: "synthetic_root_name",
				value: self.synthetic_root_name.clone(),
			});
		}
		if self.object_types.as_ref().is_some_and(Vec::is_empty) {
			return Err(MafiaError::InvalidConfig {
				field: "object_types",
				value: "[]".to_owned(),
			});
		}
		if self.special_types.as_ref().is_some_and(Vec::is_empty) {
			return Err(MafiaError::InvalidConfig {
				field: "special_types",
				value: "[]".to_owned(),
			});
		}
		Ok(())
	}

	/// Builder options derived from this config.
	pub fn build_options(&self) -> BuildOptions {
		BuildOptions {
			space: self.transform_space,
			implicit_roots: self.implicit_roots.clone(),
			synthetic_root_name: self.synthetic_root_name.clone(),
			object_types: self.object_types.clone(),
			special_types: self.special_types.clone(),
		}
	}

	/// Asset root for a world file: the configured root, else the world file's directory.
	pub fn asset_root_for(&self, world_path: &Path) -> PathBuf {
		match &self.asset_root {
			Some(root) => root.clone(),
			None => world_path.parent().map(Path::to_path_buf).unwrap_or_default(),
		}
	}
}

/// Shared abort flag checked between import steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	/// Create an unset token.
	pub fn new() -> Self {
		Self::default()
	}

	/// Request cancellation; steps already running finish, the next one does not start.
	pub fn cancel(&self) {
		self.0.store(true, Ordering::Release);
	}

	/// Return `true` once [`CancelToken::cancel`] was called.
	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}

	/// Fail with [`MafiaError::Cancelled`] when cancellation was requested.
	pub fn check(&self, step: &'static str) -> Result<()> {
		if self.is_cancelled() {
			log::info!("import cancelled before {step}");
			return Err(MafiaError::Cancelled { step });
		}
		Ok(())
	}
}

/// Result of a full world import.
#[derive(Debug, Clone)]
pub struct WorldImportOutput {
	/// Grammar used.
	pub kind: WorldKind,
	/// Decoded placement records.
	pub records: Vec<PlacementRecord>,
	/// Tags skipped by the world decoder.
	pub unrecognized: Vec<u16>,
	/// Built scene.
	pub scene: SceneBuild,
	/// World, model, and builder diagnostics in that order.
	pub diagnostics: Diagnostics,
}

/// World import pipeline: world decode, model preload, graph build.
pub struct WorldImport {
	config: ImportConfig,
	cancel: CancelToken,
}

impl WorldImport {
	/// Create a pipeline with its own cancel token.
	pub fn new(config: ImportConfig) -> Self {
		Self {
			config,
			cancel: CancelToken::new(),
		}
	}

	/// Use an externally owned cancel token.
	pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
		self.cancel = cancel;
		self
	}

	/// Token that aborts this pipeline.
	pub fn cancel_token(&self) -> CancelToken {
		self.cancel.clone()
	}

	/// Settings in effect.
	pub fn config(&self) -> &ImportConfig {
		&self.config
	}

	/// Import a world file; the grammar comes from `kind` or the file name.
	pub fn run(&self, path: &Path, kind: Option<WorldKind>) -> Result<WorldImportOutput> {
		self.run_with_progress(path, kind, |_| {})
	}

	/// [`WorldImport::run`] with a builder progress callback.
	pub fn run_with_progress(&self, path: &Path, kind: Option<WorldKind>, progress: impl FnMut(BuildProgress)) -> Result<WorldImportOutput> {
		let kind = match kind {
			Some(kind) => kind,
			None => WorldKind::from_file_name(path)?,
		};
		let library = ModelLibrary::new(self.config.asset_root_for(path));

		self.cancel.check("world decode")?;
		let bytes = fs::read(path)?;
		self.import_bytes(&bytes, kind, &library, progress)
	}

	/// Run the pipeline on in-memory world bytes against `library`.
	pub fn import_bytes(&self, bytes: &[u8], kind: WorldKind, library: &ModelLibrary, progress: impl FnMut(BuildProgress)) -> Result<WorldImportOutput> {
		self.cancel.check("world decode")?;
		let world = decode_world(bytes, kind)?;
		log::info!("world decode: {} records", world.records.len());

		self.cancel.check("model preload")?;
		library.preload(world.records.iter().filter_map(|record| record.asset.as_deref()));

		self.cancel.check("graph build")?;
		let options = self.config.build_options();
		let scene = build_scene_graph_with_progress(&world.records, library, &options, progress);

		let mut diagnostics = world.diagnostics;
		diagnostics.extend(library.diagnostics());
		diagnostics.extend(scene.diagnostics.clone());

		Ok(WorldImportOutput {
			kind,
			records: world.records,
			unrecognized: world.unrecognized,
			scene,
			diagnostics,
		})
	}
}
