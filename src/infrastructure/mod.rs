//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`mail`] - Mail delivery backends
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`predictor`] - Late-return prediction models

pub mod mail;
pub mod persistence;
pub mod predictor;
