//! Sequence configuration.

use crate::error::{IdError, IdResult};

/// Configuration of one durable sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceConfig {
    /// Schema the sequence lives in. `None` uses the store's default schema.
    pub schema: Option<String>,
    /// Sequence name.
    pub name: String,
    /// First value the sequence returns.
    pub start_with: i64,
    /// Distance between consecutive values; also the Hi-Lo block size.
    pub increment: i64,
}

impl SequenceConfig {
    /// Creates a configuration starting at 1 with an increment of 1.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            start_with: 1,
            increment: 1,
        }
    }

    /// Sets the schema.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the start value.
    #[must_use]
    pub fn with_start(mut self, start_with: i64) -> Self {
        self.start_with = start_with;
        self
    }

    /// Sets the increment.
    #[must_use]
    pub fn with_increment(mut self, increment: i64) -> Self {
        self.increment = increment;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Rejects an increment below 1 and names that are not plain SQL
    /// identifiers.
    pub fn validate(&self) -> IdResult<()> {
        if self.increment < 1 {
            return Err(IdError::invalid_config(format!(
                "increment must be at least 1, got {}",
                self.increment
            )));
        }
        validate_identifier("sequence name", &self.name)?;
        if let Some(schema) = &self.schema {
            validate_identifier("schema", schema)?;
        }
        Ok(())
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`. Names are spliced into SQL text, so
/// nothing else is allowed.
fn validate_identifier(what: &str, value: &str) -> IdResult<()> {
    let mut chars = value.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(IdError::invalid_config(format!(
            "{what} {value:?} is not a valid identifier"
        )))
    }
}
