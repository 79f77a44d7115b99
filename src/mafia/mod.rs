mod bytes;
mod chunk;
mod diag;
mod error;
mod frame;
mod header;
mod import;
mod material;
mod mesh;
mod model;
mod resolve;
mod scene;
mod transform;
mod world;

/// Bounds-checked little-endian reader.
pub use bytes::Cursor;
/// World chunk header and iterator.
pub use chunk::{Chunk, ChunkHeader, ChunkIter};
/// Recoverable-condition reporting.
pub use diag::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
/// Error and result aliases.
pub use error::{MafiaError, Result};
/// Model node kinds and type-specific payloads.
pub use frame::{Hull, NodeData, NodeKind, Portal, Sector, VisualType, frame_type};
/// `.4ds` file header.
pub use header::FourDsHeader;
/// Import configuration, cancellation, and the world import pipeline.
pub use import::{CancelToken, ImportConfig, WorldImport, WorldImportOutput};
/// Material table entries.
pub use material::{Material, MaterialFlags, TextureAnimation};
/// Mesh table entries.
pub use mesh::{Bounds, FaceGroup, MeshData, MeshLod, Morph, MorphChannel, MorphLod, SkinBone, SkinLod};
/// Model decoding entry points.
pub use model::{Model, ModelDecode, ModelFile, ModelNode, NodeId, decode_model};
/// Asset resolution.
pub use resolve::{AssetResolver, ModelLibrary};
/// Scene graph construction.
pub use scene::{BuildOptions, BuildProgress, SceneBuild, SceneGraph, SceneNode, SceneNodeId, build_scene_graph, build_scene_graph_with_progress};
/// Node transforms and the world transform convention.
pub use transform::{Transform, TransformSpace};
/// World container decoding.
pub use world::{Light, LightKind, ObjectType, PlacementRecord, SpecialType, WorldDecode, WorldKind, decode_world, normalize_asset};
