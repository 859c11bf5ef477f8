pub mod backend;
pub mod db;
pub mod observer;
pub mod remote;
pub mod seed;
pub mod store;

pub use backend::{AnyBackend, ProjectBackend};
pub use observer::{ObserverRegistry, SubscriptionId};
pub use store::ProjectStore;
