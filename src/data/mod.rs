pub mod repository;
pub mod store;

pub use repository::{JsonFileRepository, MemoryRepository, SignalRepository};
pub use store::SignalStore;
