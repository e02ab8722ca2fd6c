//! coupon-herald domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Caption rendering and the dispatch cycle
//! - `markup`: Plain-text cleanup for HTML descriptions

pub mod markup;
pub mod model;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use ports::*;
