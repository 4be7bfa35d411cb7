pub mod loader;
pub mod types;

pub use loader::load_world;
pub use types::{Event, EventKind, Facing, Level, World};
