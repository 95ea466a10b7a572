// API module for the use case backend
pub mod api;

// Form engine driving an editing session over the document schema
pub mod form;

// Re-export api modules at crate root (so routes can use crate::services, crate::models)
pub use api::config;
pub use api::middleware;
pub use api::models;
pub use api::routes;
pub use api::services;
pub use api::storage;
