use std::fmt;

/// How much attention a diagnostic deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
	/// Informational; nothing was lost.
	Note,
	/// Something was dropped or re-attached to keep the result consistent.
	Warning,
}

impl Severity {
	/// Render severity as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Note => "note",
			Self::Warning => "warning",
		}
	}
}

/// Recoverable condition encountered while decoding or building.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
	/// Index reference outside the decoded table; the attachment was omitted.
	DanglingReference {
		/// Referenced table (`material`, `vertex`, `frame`, `instance`).
		what: &'static str,
		/// Offending index as stored in the file.
		index: u32,
	},
	/// Node declared itself or a descendant as parent; the edge was cut.
	CyclicHierarchy {
		/// Declared parent frame id.
		parent: u32,
	},
	/// Frame layout is unknown; the node is kept opaque and frame decoding stopped.
	UnsupportedFrame {
		/// Raw frame type.
		frame_type: u8,
		/// Raw visual type for visual frames.
		visual_type: Option<u8>,
		/// Frames that were not decoded after this one.
		skipped: usize,
	},
	/// Referenced `.4ds` asset could not be resolved; the node has no geometry.
	UnresolvedAsset {
		/// Requested asset name.
		asset: String,
	},
	/// Parent name did not match any record; the node hangs off the synthetic root.
	UnresolvedParent {
		/// Requested parent name.
		parent: String,
	},
	/// Parent chain looped back; the edge was cut and the node moved to the synthetic root.
	CyclicParent {
		/// Parent name that closed the loop.
		parent: String,
	},
	/// Chunk or property tag without a known layout; skipped by its declared size.
	UnrecognizedRecord {
		/// Raw tag value.
		tag: u16,
		/// Chunk header offset.
		at: usize,
	},
	/// Record lacked a field its grammar requires; the record was dropped.
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// A previous record already used this name.
	DuplicateName,
	/// Asset file was found but could not be decoded; nodes placing it have no geometry.
	ModelDecodeFailed {
		/// Fatal decode error, rendered.
		error: String,
	},
}

impl DiagnosticKind {
	/// Severity assigned to this kind.
	pub fn severity(&self) -> Severity {
		match self {
			Self::UnrecognizedRecord { .. } | Self::DuplicateName => Severity::Note,
			_ => Severity::Warning,
		}
	}

	/// Stable snake-case label for machine-readable output.
	pub fn label(&self) -> &'static str {
		match self {
			Self::DanglingReference { .. } => "dangling_reference",
			Self::CyclicHierarchy { .. } => "cyclic_hierarchy",
			Self::UnsupportedFrame { .. } => "unsupported_frame",
			Self::UnresolvedAsset { .. } => "unresolved_asset",
			Self::UnresolvedParent { .. } => "unresolved_parent",
			Self::CyclicParent { .. } => "cyclic_parent",
			Self::UnrecognizedRecord { .. } => "unrecognized_record",
			Self::MissingField { .. } => "missing_field",
			Self::DuplicateName => "duplicate_name",
			Self::ModelDecodeFailed { .. } => "model_decode_failed",
		}
	}
}

impl fmt::Display for DiagnosticKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::DanglingReference { what, index } => write!(f, "dangling {what} reference {index}"),
			Self::CyclicHierarchy { parent } => write!(f, "parent frame {parent} would create a cycle"),
			Self::UnsupportedFrame {
				frame_type,
				visual_type: Some(visual),
				skipped,
			} => write!(f, "unsupported visual type {visual} (frame type {frame_type}), {skipped} frames not decoded"),
			Self::UnsupportedFrame {
				frame_type,
				visual_type: None,
				skipped,
			} => write!(f, "unsupported frame type {frame_type}, {skipped} frames not decoded"),
			Self::UnresolvedAsset { asset } => write!(f, "asset not found: {asset}"),
			Self::UnresolvedParent { parent } => write!(f, "parent not found: {parent}"),
			Self::CyclicParent { parent } => write!(f, "parent {parent} would create a cycle"),
			Self::UnrecognizedRecord { tag, at } => write!(f, "unrecognized tag 0x{tag:04x} at offset {at}"),
			Self::MissingField { field } => write!(f, "missing required field {field}"),
			Self::DuplicateName => f.write_str("duplicate name"),
			Self::ModelDecodeFailed { error } => write!(f, "model decode failed: {error}"),
		}
	}
}

/// One diagnostic attributed to a named node or record.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
	/// Node, frame, or record name the diagnostic belongs to.
	pub subject: String,
	/// What happened.
	pub kind: DiagnosticKind,
}

impl Diagnostic {
	/// Severity of the underlying kind.
	pub fn severity(&self) -> Severity {
		self.kind.severity()
	}
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}: {}", self.severity().as_str(), self.subject, self.kind)
	}
}

/// Ordered diagnostics collected during one decode or build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
	items: Vec<Diagnostic>,
}

impl Diagnostics {
	/// Create an empty collection.
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a diagnostic and forward it to the log facade.
	pub fn push(&mut self, subject: impl Into<String>, kind: DiagnosticKind) {
		let item = Diagnostic {
			subject: subject.into(),
			kind,
		};
		match item.severity() {
			Severity::Note => log::debug!("{item}"),
			Severity::Warning => log::warn!("{item}"),
		}
		self.items.push(item);
	}

	/// Append every diagnostic from `other`.
	pub fn extend(&mut self, other: Diagnostics) {
		self.items.extend(other.items);
	}

	/// Prefix every subject with `prefix:` without logging again; empty subjects become `prefix`.
	pub fn with_subject_prefix(mut self, prefix: &str) -> Diagnostics {
		for item in &mut self.items {
			item.subject = if item.subject.is_empty() {
				prefix.to_owned()
			} else {
				format!("{prefix}:{}", item.subject)
			};
		}
		self
	}

	/// Borrow all diagnostics in emission order.
	pub fn items(&self) -> &[Diagnostic] {
		&self.items
	}

	/// Number of recorded diagnostics.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Return `true` when nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Count diagnostics at `severity`.
	pub fn count(&self, severity: Severity) -> usize {
		self.items.iter().filter(|item| item.severity() == severity).count()
	}

	/// Iterate diagnostics whose kind matches `predicate`.
	pub fn matching<'a>(&'a self, predicate: impl Fn(&DiagnosticKind) -> bool + 'a) -> impl Iterator<Item = &'a Diagnostic> + 'a {
		self.items.iter().filter(move |item| predicate(&item.kind))
	}
}

impl<'a> IntoIterator for &'a Diagnostics {
	type Item = &'a Diagnostic;
	type IntoIter = std::slice::Iter<'a, Diagnostic>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}
