use crate::error::GenerateError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Maximum length of a sequence name, matching the key column of the
/// MySQL counter table.
pub const MAX_LENGTH: usize = 64;

/// A validated name of a logical counter, usually one per entity type.
///
/// Names must be non-blank and at most 64 bytes long.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SequenceName(String);

impl SequenceName {
    /// Creates a new `SequenceName` after validating the input.
    pub fn new(name: impl Into<String>) -> Result<Self, GenerateError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Returns the sequence name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), GenerateError> {
        if name.trim().is_empty() {
            return Err(GenerateError::InvalidArgument(
                "sequence name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_LENGTH {
            return Err(GenerateError::InvalidArgument(format!(
                "sequence name must be at most {} bytes, got {}",
                MAX_LENGTH,
                name.len()
            )));
        }

        Ok(())
    }
}

impl Display for SequenceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SequenceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SequenceName {
    type Error = GenerateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SequenceName> for String {
    fn from(value: SequenceName) -> Self {
        value.0
    }
}
