//! Secret configuration values
//!
//! Credentials such as the FHIR bearer token are held in `secrecy` wrappers
//! so they are zeroized on drop and redacted from `Debug` output. Reading one
//! requires an explicit `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use hl7bridge::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("s3cr3t".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "s3cr3t");
//! assert!(!format!("{token:?}").contains("s3cr3t"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String newtype that can live inside a [`Secret`]
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Whether the value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Zeroizing, redacted string
pub type SecretString = Secret<SecretValue>;

/// Wrap a string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Wrap an optional string, treating an empty string as absent
#[inline]
pub fn secret_string_opt(value: Option<String>) -> Option<SecretString> {
    value.filter(|s| !s.is_empty()).map(secret_string)
}
