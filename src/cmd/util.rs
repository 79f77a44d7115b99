use glam::{Quat, Vec3};
use mafiadoc::mafia::{Diagnostics, MafiaError, Result, Severity, Transform, TransformSpace, WorldKind};

/// Print `value` as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(value: &T) {
	match serde_json::to_string_pretty(value) {
		Ok(text) => println!("{text}"),
		Err(err) => eprintln!("error: json encode: {err}"),
	}
}

/// Parse a `--space` value.
pub(crate) fn parse_space(value: &str) -> Result<TransformSpace> {
	TransformSpace::parse(value).ok_or_else(|| MafiaError::InvalidConfig {
		field: "space",
		value: value.to_owned(),
	})
}

/// Parse a `--kind` value.
pub(crate) fn parse_kind(value: &str) -> Result<WorldKind> {
	WorldKind::parse(value).ok_or_else(|| MafiaError::InvalidConfig {
		field: "kind",
		value: value.to_owned(),
	})
}

pub(crate) fn vec3(value: Vec3) -> [f32; 3] {
	value.to_array()
}

/// Quaternion in file order `[w, x, y, z]`.
pub(crate) fn quat(value: Quat) -> [f32; 4] {
	[value.w, value.x, value.y, value.z]
}

/// Compact single-line transform label.
pub(crate) fn transform_label(transform: &Transform) -> String {
	let [x, y, z] = vec3(transform.position);
	format!("pos=({x:.3}, {y:.3}, {z:.3})")
}

#[derive(serde::Serialize)]
pub(crate) struct TransformJson {
	position: [f32; 3],
	rotation: [f32; 4],
	scale: [f32; 3],
}

impl From<&Transform> for TransformJson {
	fn from(value: &Transform) -> Self {
		Self {
			position: vec3(value.position),
			rotation: quat(value.rotation),
			scale: vec3(value.scale),
		}
	}
}

#[derive(serde::Serialize)]
pub(crate) struct DiagnosticJson {
	severity: &'static str,
	kind: &'static str,
	subject: String,
	message: String,
}

#[derive(serde::Serialize)]
pub(crate) struct DiagnosticSummaryJson {
	notes: usize,
	warnings: usize,
	items: Vec<DiagnosticJson>,
}

pub(crate) fn diagnostics_json(diagnostics: &Diagnostics) -> DiagnosticSummaryJson {
	DiagnosticSummaryJson {
		notes: diagnostics.count(Severity::Note),
		warnings: diagnostics.count(Severity::Warning),
		items: diagnostics
			.items()
			.iter()
			.map(|item| DiagnosticJson {
				severity: item.severity().as_str(),
				kind: item.kind.label(),
				subject: item.subject.clone(),
				message: item.kind.to_string(),
			})
			.collect(),
	}
}

/// Print the diagnostic block of text output.
pub(crate) fn print_diagnostics(diagnostics: &Diagnostics) {
	println!(
		"diagnostics: {} ({} warnings, {} notes)",
		diagnostics.len(),
		diagnostics.count(Severity::Warning),
		diagnostics.count(Severity::Note)
	);
	for item in diagnostics {
		println!("  {item}");
	}
}

/// Render a chunk tag as `0x` hex.
pub(crate) fn tag_hex(tag: u16) -> String {
	format!("0x{tag:04x}")
}

/// Pair each id of a pre-order walk with its depth below the roots.
pub(crate) fn with_depths(order: Vec<usize>, len: usize, parent_of: impl Fn(usize) -> Option<usize>) -> Vec<(usize, usize)> {
	let mut depths = vec![0_usize; len];
	order
		.into_iter()
		.map(|id| {
			let depth = parent_of(id).map_or(0, |parent| depths[parent] + 1);
			depths[id] = depth;
			(id, depth)
		})
		.collect()
}
