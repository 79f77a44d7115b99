use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::mafia::{DiagnosticKind, Diagnostics, Model, ModelFile};

/// Source of decoded models for the scene builder.
pub trait AssetResolver: Sync {
	/// Return the model for a normalised asset name, or `None` when it cannot be found.
	fn resolve(&self, asset: &str) -> Option<Arc<Model>>;
}

impl AssetResolver for HashMap<String, Arc<Model>> {
	fn resolve(&self, asset: &str) -> Option<Arc<Model>> {
		self.get(asset).or_else(|| self.get(&asset.to_ascii_lowercase())).cloned()
	}
}

type Slot = Arc<OnceLock<Option<Arc<Model>>>>;

/// Filesystem-backed model resolver with a read-through, single-flight cache.
///
/// Lookup order for an asset name: `<root>/<name>`, `<root>/models/<name>`, then a
/// case-insensitive file-name match anywhere under `<root>`.
pub struct ModelLibrary {
	root: PathBuf,
	slots: Mutex<HashMap<String, Slot>>,
	index: OnceLock<HashMap<String, PathBuf>>,
	decode_diagnostics: Mutex<BTreeMap<String, Diagnostics>>,
	decodes: AtomicUsize,
}

impl ModelLibrary {
	/// Create a library rooted at `root`.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			slots: Mutex::new(HashMap::new()),
			index: OnceLock::new(),
			decode_diagnostics: Mutex::new(BTreeMap::new()),
			decodes: AtomicUsize::new(0),
		}
	}

	/// Asset root directory.
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Locate the `.4ds` file for `asset` without decoding it.
	pub fn locate(&self, asset: &str) -> Option<PathBuf> {
		let relative = asset.replace('\\', "/");
		let direct = [self.root.join(&relative), self.root.join("models").join(&relative)];
		if let Some(path) = direct.into_iter().find(|path| path.is_file()) {
			return Some(path);
		}

		let file_name = relative.rsplit('/').next()?.to_ascii_lowercase();
		self.index().get(&file_name).cloned()
	}

	/// Decode every distinct asset in `assets` in parallel, filling the cache.
	pub fn preload<'a>(&self, assets: impl IntoIterator<Item = &'a str>) {
		let mut seen = HashSet::new();
		let distinct: Vec<String> = assets
			.into_iter()
			.map(str::to_ascii_lowercase)
			.filter(|asset| seen.insert(asset.clone()))
			.collect();

		log::info!("preloading {} models from {}", distinct.len(), self.root.display());
		distinct.par_iter().for_each(|asset| {
			self.resolve(asset);
		});
	}

	/// Number of decode attempts performed so far.
	pub fn decode_count(&self) -> usize {
		self.decodes.load(Ordering::Relaxed)
	}

	/// Diagnostics of every decoded model, subjects prefixed with the asset name.
	pub fn diagnostics(&self) -> Diagnostics {
		let per_asset = self.decode_diagnostics.lock().unwrap_or_else(PoisonError::into_inner);
		let mut out = Diagnostics::new();
		for (asset, diagnostics) in per_asset.iter() {
			out.extend(diagnostics.clone().with_subject_prefix(asset));
		}
		out
	}

	fn slot(&self, key: &str) -> Slot {
		let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
		slots.entry(key.to_owned()).or_default().clone()
	}

	fn load(&self, asset: &str) -> Option<Arc<Model>> {
		let Some(path) = self.locate(asset) else {
			log::debug!("model {asset} not found under {}", self.root.display());
			return None;
		};

		self.decodes.fetch_add(1, Ordering::Relaxed);
		let (model, diagnostics) = match ModelFile::open(&path) {
			Ok(file) => {
				log::debug!("decoded {} ({} nodes)", path.display(), file.model.nodes.len());
				(Some(Arc::new(file.model)), file.diagnostics)
			}
			Err(err) => {
				let mut diagnostics = Diagnostics::new();
				diagnostics.push("", DiagnosticKind::ModelDecodeFailed { error: err.to_string() });
				(None, diagnostics)
			}
		};
		if !diagnostics.is_empty() {
			let mut per_asset = self.decode_diagnostics.lock().unwrap_or_else(PoisonError::into_inner);
			per_asset.insert(asset.to_owned(), diagnostics);
		}
		model
	}

	fn index(&self) -> &HashMap<String, PathBuf> {
		self.index.get_or_init(|| {
			let mut index = HashMap::new();
			let files = WalkDir::new(&self.root)
				.sort_by_file_name()
				.into_iter()
				.filter_map(|entry| entry.ok())
				.filter(|entry| entry.file_type().is_file());
			for entry in files {
				let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
				index.entry(name).or_insert_with(|| entry.into_path());
			}
			log::debug!("indexed {} files under {}", index.len(), self.root.display());
			index
		})
	}
}

impl AssetResolver for ModelLibrary {
	fn resolve(&self, asset: &str) -> Option<Arc<Model>> {
		let key = asset.to_ascii_lowercase();
		self.slot(&key).get_or_init(|| self.load(&key)).clone()
	}
}

#[cfg(test)]
mod tests;
