mod project;
mod state;
mod tombstone;

pub use project::LocalBackend;
pub use state::LocalDevice;
pub use tombstone::TombstoneStore;
