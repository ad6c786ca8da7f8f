//! Shared types for PanelBridge.
//!
//! This crate contains pure data structures with no business logic -
//! just data that can be passed between layers.
//!
//! ## Architecture
//!
//! - **common** (this crate): Pure shared types
//! - **bridge-core**: Bridge logic operating on these types
//! - **demo**: Application wiring everything together
//!
//! This layered architecture keeps concerns separated and makes testing easier.

pub mod error;

pub use error::error_location::ErrorLocation;

#[cfg(test)]
mod tests;
