//! Public library API for decoding Mafia `.4ds` models and `scene2.bin`/`cache.bin` worlds.

/// Binary decoding, model/world parsing, asset resolution, and scene graph building.
pub mod mafia;
