//! Artifact hashes and content identifiers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier a client uses to request a cached artifact.
///
/// The hash is opaque to this node: it is the request path a substituter
/// client would use (e.g. `abc...xyz.narinfo` or `nar/abc...xyz.nar.xz`),
/// and the sole key into the coordinator's registry. The node never parses
/// structure out of it beyond validating its shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactHash(String);

impl ArtifactHash {
    /// Validate and wrap an artifact hash.
    ///
    /// Accepted: non-empty ASCII of `[A-Za-z0-9._/+=:-]` with no leading
    /// slash and no empty or `..` path segments.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidHash("empty".to_string()));
        }
        if s.starts_with('/') {
            return Err(Error::InvalidHash(format!("leading slash: {s}")));
        }
        if !s.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '+' | '=' | ':' | '-')
        }) {
            return Err(Error::InvalidHash(format!("unexpected character in: {s}")));
        }
        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(Error::InvalidHash(format!("empty path segment in: {s}")));
            }
            if segment == ".." {
                return Err(Error::InvalidHash(format!("path traversal in: {s}")));
            }
        }
        Ok(Self(s.to_string()))
    }

    /// The hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Content identifier issued by the content store on ingest.
///
/// Never derived by this node; it is read back verbatim from the store's
/// `add` output and handed to probe/fetch and the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    /// Validate and wrap a content identifier.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidCid("empty".to_string()));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidCid(format!("unexpected character in: {s}")));
        }
        Ok(Self(s.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Cid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
