//! Storage module for the API.
//!
//! Provides storage backends for PostgreSQL and an in-memory fallback.

pub mod error;
pub mod rows;
pub mod traits;

// Storage backend implementations
pub mod memory;
pub mod postgres;

pub use error::StorageError;
pub use memory::InMemoryStorageBackend;
pub use postgres::PostgresStorageBackend;
pub use rows::{
    FlowDetailFields, FlowDetailRow, FlowFields, FlowRecord, FlowRow, NewFlow, UseCaseFields,
    UseCaseRecord, UseCaseRow, WritePlan,
};
pub use traits::{StorageBackend, StorageTransaction, UserContext};
