use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, MafiaError>;

/// Fatal errors produced while reading or decoding Mafia asset files.
///
/// Recoverable conditions (dangling references, unresolved assets, cycles) are not errors;
/// they are reported as [`crate::mafia::Diagnostic`] values alongside a successful result.
#[derive(Debug, Error)]
pub enum MafiaError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Not enough bytes remained for a requested read.
	#[error("truncated data at offset {at}, need {need} bytes, remaining {rem}")]
	TruncatedData {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Leading file magic did not match `4DS\0`.
	#[error("invalid signature (magic={magic:?}, expected \"4DS\\0\")")]
	InvalidSignature {
		/// First up-to-4 bytes of the stream.
		magic: [u8; 4],
	},
	/// Unsupported `.4ds` format version.
	#[error("unsupported 4ds version {version} (expected 29)")]
	UnsupportedVersion {
		/// Parsed format version.
		version: u16,
	},
	/// Chunk size field is smaller than its own header.
	#[error("bad chunk size {size} at offset {at}")]
	BadChunkSize {
		/// Chunk header offset.
		at: usize,
		/// Declared chunk size.
		size: u32,
	},
	/// World file name did not identify a known grammar.
	#[error("unknown world file: {name} (expected scene2.bin or cache.bin)")]
	UnknownWorldFile {
		/// Offending file name.
		name: String,
	},
	/// Import configuration file could not be parsed.
	#[error("config: {0}")]
	Config(#[from] serde_json::Error),
	/// Import configuration value was rejected.
	#[error("invalid config value for {field}: {value}")]
	InvalidConfig {
		/// Field name.
		field: &'static str,
		/// Rejected value.
		value: String,
	},
	/// Import was aborted between two steps.
	#[error("import cancelled before {step}")]
	Cancelled {
		/// Step that did not start.
		step: &'static str,
	},
}
