// Entity model and the current-snapshot store

mod entity;
mod store;

pub use entity::{default_name, EntityState, RawEntity};
pub use store::SnapshotStore;
