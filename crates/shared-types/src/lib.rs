//! # Shared Types Crate
//!
//! The resource model for App Transport Framework (ATF) messages, shared by
//! every crate of the workspace.
//!
//! ## Design Principles
//!
//! - **Structural parsing only**: documents are decoded into typed resources;
//!   FHIR schema validation is out of scope.
//! - **Lossless envelopes**: unknown resource types are retained as raw JSON.
//! - **Wire constants in one place**: every profile, code system and extension
//!   URI lives in [`constants`].

pub mod communication;
pub mod constants;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod header;
pub mod outcome;

pub use communication::*;
pub use constants::*;
pub use entities::*;
pub use envelope::{Bundle, BundleEntry, BundleType, Resource};
pub use errors::*;
pub use header::*;
pub use outcome::*;
