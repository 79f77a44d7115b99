use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation, and scale of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
	/// Translation.
	pub position: Vec3,
	/// Rotation.
	pub rotation: Quat,
	/// Per-axis scale.
	pub scale: Vec3,
}

impl Default for Transform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl Transform {
	/// No translation, no rotation, unit scale.
	pub const IDENTITY: Self = Self {
		position: Vec3::ZERO,
		rotation: Quat::IDENTITY,
		scale: Vec3::ONE,
	};

	/// Build a transform from its parts.
	pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
		Self { position, rotation, scale }
	}

	/// Affine matrix applying scale, then rotation, then translation.
	pub fn to_matrix(&self) -> Mat4 {
		Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
	}

	/// Decompose an affine matrix.
	pub fn from_matrix(matrix: Mat4) -> Self {
		let (scale, rotation, position) = matrix.to_scale_rotation_translation();
		Self { position, rotation, scale }
	}

	/// Apply `self` as parent to `child`, giving the child's transform in the parent's space.
	pub fn compose(&self, child: &Transform) -> Transform {
		Self::from_matrix(self.to_matrix() * child.to_matrix())
	}

	/// Express a transform given in the same space as `self` relative to `self`.
	pub fn relative(&self, absolute: &Transform) -> Transform {
		Self::from_matrix(self.to_matrix().inverse() * absolute.to_matrix())
	}

	/// Approximate equality with an absolute tolerance per component.
	pub fn abs_diff_eq(&self, other: &Transform, max_abs_diff: f32) -> bool {
		self.position.abs_diff_eq(other.position, max_abs_diff)
			&& self.scale.abs_diff_eq(other.scale, max_abs_diff)
			&& (self.rotation.abs_diff_eq(other.rotation, max_abs_diff) || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
	}
}

/// How placement transforms in a world file relate to their parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformSpace {
	/// Stored relative to the parent; world transform is the parent chain composed with it.
	#[default]
	ParentRelative,
	/// Stored in world space; the local transform is derived from the parent's world transform.
	WorldAbsolute,
}

impl TransformSpace {
	/// Render space as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::ParentRelative => "parent_relative",
			Self::WorldAbsolute => "world_absolute",
		}
	}

	/// Parse a label produced by [`TransformSpace::as_str`] or its short form.
	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"parent_relative" | "relative" => Some(Self::ParentRelative),
			"world_absolute" | "absolute" => Some(Self::WorldAbsolute),
			_ => None,
		}
	}
}
