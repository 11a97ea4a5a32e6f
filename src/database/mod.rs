pub mod directory;
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod store;

pub use memory::MemoryPipelineStore;
pub use postgres::PgPipelineStore;
pub use store::PipelineStore;
