//! Level catalogs for the CodeQuest tutorial tracks.
//!
//! The four builtin tracks are embedded YAML files validated at startup.
//! A directory of replacement files can be loaded instead, which is how
//! fixture catalogs are supplied to tests.
//!
//! # Modules
//!
//! - [`catalog`] -- The registry of tracks keyed by technology
//! - [`track`] -- A single validated track
//! - [`error`] -- Catalog error types

pub mod catalog;
pub mod error;
pub mod track;

pub use catalog::Catalog;
pub use error::CatalogError;
pub use track::Track;
