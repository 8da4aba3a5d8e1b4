pub mod factory;
pub mod json_file;
pub mod memory;
pub mod state_store;

pub use factory::{StoreConfig, StoreFactory, StoreRegistry};
pub use json_file::{JsonFileStore, JsonFileStoreFactory};
pub use memory::{MemoryStore, MemoryStoreFactory};
pub use state_store::{StateStore, StoreError, load_or_default, save_value};
