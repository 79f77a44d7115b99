/// Model decode command.
pub mod model;
/// Scene import command.
pub mod scene;
/// Shared CLI helpers.
pub mod util;
/// World decode command.
pub mod world;
