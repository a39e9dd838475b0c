use crate::error::GenerateError;
use crate::sequence::SequenceName;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Display;

/// Widest numeric portion a code can have: the digit count of `u64::MAX`.
pub const MAX_WIDTH: usize = 20;

/// Longest prefix in bytes a counter record can store.
pub const MAX_PREFIX_LENGTH: usize = 64;

/// How codes of one entity type are allocated and rendered.
///
/// A spec names the counter to draw from (`sequence`), the attribute of the
/// target collection that holds the code (`field`), the text prepended to
/// the number (`prefix`) and the zero-padded digit count of the number
/// (`width`). `CTA-` with width 10 renders value 42 as `CTA-0000000042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeSpec {
    sequence: Cow<'static, str>,
    field: Cow<'static, str>,
    prefix: Cow<'static, str>,
    width: usize,
}

impl CodeSpec {
    /// Creates a spec from static strings, usable in `const` contexts.
    pub const fn from_static(
        sequence: &'static str,
        field: &'static str,
        prefix: &'static str,
        width: usize,
    ) -> Self {
        Self {
            sequence: Cow::Borrowed(sequence),
            field: Cow::Borrowed(field),
            prefix: Cow::Borrowed(prefix),
            width,
        }
    }

    /// Creates a spec from owned values. Nothing is validated until
    /// [`CodeSpec::validate`] runs.
    pub fn new(
        sequence: impl Into<String>,
        field: impl Into<String>,
        prefix: impl Into<String>,
        width: usize,
    ) -> Self {
        Self {
            sequence: Cow::Owned(sequence.into()),
            field: Cow::Owned(field.into()),
            prefix: Cow::Owned(prefix.into()),
            width,
        }
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Checks the parts of the code spec that can be checked without storage and
    /// returns the validated sequence name.
    pub fn validate(&self) -> Result<SequenceName, GenerateError> {
        let sequence = SequenceName::new(&*self.sequence)?;

        if self.field.trim().is_empty() {
            return Err(GenerateError::InvalidArgument(
                "field name cannot be empty".to_string(),
            ));
        }

        if self.prefix.len() > MAX_PREFIX_LENGTH {
            return Err(GenerateError::InvalidArgument(format!(
                "prefix must be at most {} bytes, got {}",
                MAX_PREFIX_LENGTH,
                self.prefix.len()
            )));
        }

        if self.width == 0 || self.width > MAX_WIDTH {
            return Err(GenerateError::InvalidArgument(format!(
                "length must be between 1 and {}, got {}",
                MAX_WIDTH, self.width
            )));
        }

        Ok(sequence)
    }

    /// Renders `value` as `prefix` followed by the value left-padded with
    /// zeros to `width` digits.
    ///
    /// Fails when the value needs more than `width` digits; the code is
    /// never silently widened.
    pub fn render(&self, value: u64) -> Result<EntityCode, GenerateError> {
        self.check_fits(value)?;
        let code = format!("{}{:0width$}", self.prefix, value, width = self.width);
        Ok(EntityCode { code, value })
    }

    /// Fails with [`GenerateError::InvalidArgument`] when `value` needs more
    /// than `width` digits.
    pub fn check_fits(&self, value: u64) -> Result<(), GenerateError> {
        let digits = value.checked_ilog10().map_or(1, |log| log as usize + 1);
        if digits > self.width {
            return Err(GenerateError::InvalidArgument(format!(
                "value {} of sequence '{}' needs {} digits but length is {}",
                value, self.sequence, digits, self.width
            )));
        }
        Ok(())
    }

    /// Extracts the numeric portion of a code rendered with this spec.
    ///
    /// Returns `None` when the prefix does not match or the remainder is not
    /// a plain decimal number.
    pub fn parse_number(&self, code: &str) -> Option<u64> {
        let digits = code.strip_prefix(&*self.prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// A code produced by the generator, together with the counter value it was
/// rendered from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityCode {
    code: String,
    value: u64,
}

impl EntityCode {
    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Returns the counter value the code was rendered from.
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn into_string(self) -> String {
        self.code
    }
}

impl Display for EntityCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

impl AsRef<str> for EntityCode {
    fn as_ref(&self) -> &str {
        &self.code
    }
}

impl Serialize for EntityCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.code)
    }
}
