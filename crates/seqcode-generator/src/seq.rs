use crate::CodeGenerator;
use async_trait::async_trait;
use seqcode_core::{CodeLookup, CodeSpec, CounterStore, EntityCode, GenerateError};
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Attempts made before giving up on a sequence whose candidates keep
/// colliding with existing codes.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Configures a [`SequentialCodeGenerator`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct GeneratorSettings {
    /// Upper bound on counter increments per call. Must be at least 1.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Generates codes like `CTA-0000000001` from a persistent counter.
///
/// Each attempt performs one atomic increment on the counter store, renders
/// the value and probes the target collection. A candidate that is already
/// taken (a legacy or manually entered code) is skipped and never reused;
/// the next attempt draws a fresh value, so collisions leave gaps in the
/// numbering.
///
/// The probe does not reserve the code. Two writers racing between the
/// probe and their insert must be stopped by a unique index on the code
/// field of the target collection.
#[derive(Debug, Clone)]
pub struct SequentialCodeGenerator<C> {
    counters: C,
    max_attempts: u32,
}

impl<C: CounterStore> SequentialCodeGenerator<C> {
    /// Creates a generator backed by `counters`.
    pub fn new(counters: C, settings: GeneratorSettings) -> Result<Self, GenerateError> {
        if settings.max_attempts == 0 {
            return Err(GenerateError::InvalidArgument(
                "max attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            counters,
            max_attempts: settings.max_attempts,
        })
    }

    /// Creates a generator with [`DEFAULT_MAX_ATTEMPTS`].
    pub fn with_defaults(counters: C) -> Self {
        Self {
            counters,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Returns the counter store.
    pub fn counters(&self) -> &C {
        &self.counters
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Allocates the next free code of `spec`.
    ///
    /// # Errors
    ///
    /// - [`GenerateError::InvalidArgument`] if `spec` is malformed (checked
    ///   before touching storage) or the next value needs more digits than
    ///   `spec.width()` (checked against the stored counter before it is
    ///   incremented).
    /// - [`GenerateError::Exhausted`] if every attempt hit a taken code.
    /// - [`GenerateError::Storage`] if the counter store or the target
    ///   cannot be reached. These are not retried.
    pub async fn generate<T>(&self, target: &T, spec: &CodeSpec) -> Result<EntityCode, GenerateError>
    where
        T: CodeLookup + ?Sized,
    {
        let sequence = spec.validate()?;
        let mut last_code = None;

        // Refuse before incrementing so an overflowing sequence keeps its value.
        let mut last_value = self
            .counters
            .current(&sequence)
            .await
            .map_err(|e| {
                warn!(sequence = %sequence, error = %e, "Failed to read counter");
                e
            })?
            .map_or(0, |record| record.value);

        for attempt in 1..=self.max_attempts {
            let next = last_value.checked_add(1).ok_or_else(|| {
                GenerateError::InvalidArgument(format!(
                    "sequence '{sequence}' has reached u64::MAX"
                ))
            })?;
            spec.check_fits(next)?;

            let value = self
                .counters
                .increment(&sequence, spec.prefix())
                .await
                .map_err(|e| {
                    warn!(sequence = %sequence, error = %e, "Failed to increment counter");
                    e
                })?;

            last_value = value;
            // Another writer may have advanced the counter since the check.
            let candidate = spec.render(value)?;
            trace!(sequence = %sequence, code = %candidate, attempt, "Probing candidate code");

            let taken = target
                .code_exists(spec.field(), candidate.as_str())
                .await
                .map_err(|e| {
                    warn!(code = %candidate, field = spec.field(), error = %e, "Failed to probe target collection");
                    e
                })?;

            if !taken {
                debug!(sequence = %sequence, code = %candidate, attempt, "Allocated code");
                return Ok(candidate);
            }

            warn!(
                sequence = %sequence,
                code = %candidate,
                attempt,
                "Code already present in target collection, skipping"
            );
            last_code = Some(candidate);
        }

        Err(GenerateError::Exhausted {
            sequence: sequence.to_string(),
            attempts: self.max_attempts,
            last_code: last_code.map(EntityCode::into_string).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl<C: CounterStore> CodeGenerator for SequentialCodeGenerator<C> {
    async fn next_code(
        &self,
        target: &dyn CodeLookup,
        spec: &CodeSpec,
    ) -> Result<EntityCode, GenerateError> {
        self.generate(target, spec).await
    }
}
