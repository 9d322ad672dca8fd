// GlobeTrotter - travel planning backend

// HTTP router and handlers
pub mod api;

// Shared state handed to every handler
pub mod app_state;
pub mod config;

// Row types and their queries
pub mod entities;

// Database, security, email and request context
pub mod infrastructure;

// Business rules
pub mod services;

// Strong ids and pagination
pub mod types;

pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
