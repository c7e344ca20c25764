//! String wrappers that never render their contents.
//!
//! Both types keep the real value for explicit use (e.g. composing an auth header) while every
//! formatting and serialization path produces a mask instead.

use serde::{Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Token emitted in place of a secret.
pub const MASK: &str = "****";

/// Number of trailing characters exposed by [`MostlyMaskedString`].
const EXPOSED_SUFFIX_CHARS: usize = 4;

/// A secret that is fully masked in `Display`, `Debug` and JSON output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MaskedString(String);

impl MaskedString {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The underlying value. Only use this where the raw secret must leave the process, such as
    /// an outbound request header.
    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MaskedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl fmt::Debug for MaskedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl Serialize for MaskedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(MASK)
    }
}

impl From<String> for MaskedString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MaskedString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for MaskedString {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// A secret that shows only its last few characters, for diagnostics.
///
/// Values of [`EXPOSED_SUFFIX_CHARS`] characters or fewer are masked entirely.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MostlyMaskedString(String);

impl MostlyMaskedString {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }

    fn masked(&self) -> String {
        let len = self.0.chars().count();
        if len <= EXPOSED_SUFFIX_CHARS {
            return MASK.to_string();
        }
        let suffix: String = self.0.chars().skip(len - EXPOSED_SUFFIX_CHARS).collect();
        format!("{MASK}{suffix}")
    }
}

impl fmt::Display for MostlyMaskedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for MostlyMaskedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl Serialize for MostlyMaskedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.masked())
    }
}

impl From<String> for MostlyMaskedString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl FromStr for MostlyMaskedString {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}
