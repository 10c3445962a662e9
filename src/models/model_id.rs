//! Type-safe model identifier
//!
//! Model ids are what clients put in the `model` field and what
//! `/v1/models` advertises. They are validated once, at registry construction.

use std::fmt;

/// Validated, non-empty model identifier
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ModelId(String);

impl ModelId {
    /// Create a validated ModelId
    ///
    /// # Errors
    /// Returns an error if the id is empty or whitespace-only, or carries
    /// leading/trailing whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("model id cannot be empty or whitespace-only".to_string());
        }
        if id.trim() != id {
            return Err(format!(
                "model id '{}' cannot have leading or trailing whitespace",
                id
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
