pub mod builders;
pub mod harness;
pub mod memory_store;

pub use builders::ConfigFileBuilder;
pub use harness::BuildHarness;
pub use memory_store::MemoryStore;
