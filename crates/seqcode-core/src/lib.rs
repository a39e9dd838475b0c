//! Core types and traits for sequential entity-code generation.
//!
//! This crate provides the shared vocabulary used by the generator, the
//! storage backends and the CLI: validated sequence names, per-entity code
//! specs, the entity catalog and the storage seams.

pub mod code;
pub mod entity;
pub mod error;
pub mod repository;
pub mod sequence;

pub use code::{CodeSpec, EntityCode, MAX_PREFIX_LENGTH, MAX_WIDTH};
pub use entity::EntityKind;
pub use error::{GenerateError, StorageError};
pub use repository::{CodeLookup, CounterRecord, CounterStore};
pub use sequence::SequenceName;
