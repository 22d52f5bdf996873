//! Interface GUID → canonical identifier translation
//!
//! The canonical identifier is the configuration-store lookup key for an
//! interface, so the byte layout produced here must never change.
//!
//! A GUID is held as 16 raw bytes in the OS memory layout: a 4-byte field,
//! two 2-byte fields (each little-endian) and an 8-byte tail. The
//! canonical form reverses the bytes of the first three fields only and
//! keeps the tail verbatim, then renders `{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}`.

use crate::error::Result;
use crate::traits::{GuidResolver, InterfaceIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A 16-byte interface GUID in OS memory layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceGuid {
    raw: [u8; 16],
}

impl InterfaceGuid {
    /// Wrap raw GUID bytes exactly as the OS stores them
    pub fn from_raw_bytes(raw: [u8; 16]) -> Self {
        Self { raw }
    }

    /// Build from the structured fields of a GUID
    pub fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        let mut raw = [0u8; 16];
        raw[0..4].copy_from_slice(&data1.to_le_bytes());
        raw[4..6].copy_from_slice(&data2.to_le_bytes());
        raw[6..8].copy_from_slice(&data3.to_le_bytes());
        raw[8..16].copy_from_slice(&data4);
        Self { raw }
    }

    /// Raw bytes in OS memory layout
    pub fn raw_bytes(&self) -> [u8; 16] {
        self.raw
    }

    /// Bytes in canonical (RFC 4122 display) order
    pub fn canonical_bytes(&self) -> [u8; 16] {
        let r = &self.raw;
        [
            r[3], r[2], r[1], r[0], //
            r[5], r[4], //
            r[7], r[6], //
            r[8], r[9], r[10], r[11], r[12], r[13], r[14], r[15],
        ]
    }

    /// Render the canonical, brace-wrapped identifier
    pub fn to_identifier(&self) -> InterfaceIdentifier {
        let uuid = Uuid::from_bytes(self.canonical_bytes());
        InterfaceIdentifier(format!("{{{}}}", uuid.hyphenated()))
    }
}

/// Canonical string identifier of an interface, e.g.
/// `{4d36e972-e325-11ce-bfc1-08002be10318}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceIdentifier(String);

impl InterfaceIdentifier {
    /// The identifier as a configuration-store key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<InterfaceGuid> for InterfaceIdentifier {
    fn from(guid: InterfaceGuid) -> Self {
        guid.to_identifier()
    }
}

impl AsRef<str> for InterfaceIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Translates OS interface indices into canonical identifiers
#[derive(Clone)]
pub struct IdentifierTranslator {
    resolver: Arc<dyn GuidResolver>,
}

impl IdentifierTranslator {
    /// Create a translator backed by the given GUID resolver
    pub fn new(resolver: Arc<dyn GuidResolver>) -> Self {
        Self { resolver }
    }

    /// Translate an interface index
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Lookup`](crate::Error::Lookup) from the resolver.
    /// Callers treat this as "skip the cycle".
    pub fn translate(&self, index: InterfaceIndex) -> Result<InterfaceIdentifier> {
        let guid = self.resolver.guid_for_index(index)?;
        Ok(guid.to_identifier())
    }
}

impl fmt::Debug for IdentifierTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierTranslator").finish_non_exhaustive()
    }
}
