//! Sequential entity-code generation.
//!
//! The generator draws numbers from a persistent [`CounterStore`] and checks
//! each candidate against the collection the caller is about to insert into.

pub mod seq;

pub use seq::{GeneratorSettings, SequentialCodeGenerator, DEFAULT_MAX_ATTEMPTS};

use async_trait::async_trait;
use seqcode_core::{CodeLookup, CodeSpec, EntityCode, GenerateError};

/// Trait for producing entity codes.
///
/// Entity services depend on this trait rather than on a concrete generator
/// so that the storage backend stays a deployment choice.
#[async_trait]
pub trait CodeGenerator: Send + Sync + 'static {
    /// Allocates the next code described by `spec` that is not yet present
    /// in `target`.
    async fn next_code(
        &self,
        target: &dyn CodeLookup,
        spec: &CodeSpec,
    ) -> Result<EntityCode, GenerateError>;
}
