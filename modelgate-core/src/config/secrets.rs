//! Secrets handling and redaction
//!
//! This module provides:
//! - A string wrapper that never prints its value
//! - Name-based detection of credential-bearing headers and query parameters
//! - Safe logging utilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed token substituted for every redacted credential
pub const REDACTED: &str = "[REDACTED]";

/// A wrapper type for sensitive strings like API keys
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    /// Check if the secret is empty or whitespace
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", REDACTED)
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A trait for types that can be logged safely
pub trait SafeLogging {
    /// Returns a safe version for logging
    fn safe_for_logging(&self) -> String;
}

/// Name fragments that mark a header or query parameter as credential-bearing.
/// Covers `Authorization`, `x-api-key`, `x-goog-api-key`, `key`,
/// `access_token` and similar.
const SENSITIVE_NAME_FRAGMENTS: &[&str] = &["authorization", "key", "secret", "token", "password", "credential"];

/// Whether a header or query parameter name carries a credential
pub fn is_sensitive_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_NAME_FRAGMENTS
        .iter()
        .any(|fragment| name.contains(fragment))
}

/// Redact a value when its field name marks it as sensitive
pub fn redact_by_field_name(field_name: &str, value: &str) -> String {
    if is_sensitive_name(field_name) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
