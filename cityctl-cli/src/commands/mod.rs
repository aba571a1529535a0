//! Command implementations for cityctl CLI

pub mod schema;
pub mod serve;

// Re-export main dispatcher functions for flat access from main.rs
pub use schema::run_schema;
pub use serve::run_serve;
