//! Strongly-typed identifiers.
//!
//! Policy elements are identified by their names; the identifiers here are
//! for runtime artifacts such as transactions and events, which need unique
//! labels for logging and correlation. Each identifier type is a thin wrapper
//! around a UUID with a phantom type parameter so different kinds of
//! identifiers cannot be mixed up.
//!
//! # Examples
//!
//! ```
//! use ngac_core::id::{EventId, TxId};
//! use std::str::FromStr;
//!
//! let tx = TxId::new();
//! let event = EventId::new();
//! assert_ne!(tx.to_string(), event.to_string());
//!
//! let id_str = "550e8400-e29b-41d4-a716-446655440000";
//! let tx = TxId::from_str(id_str).unwrap();
//! assert_eq!(tx.to_string(), id_str);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A type-safe identifier based on UUID.
#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Id<T> {
    uuid: Uuid,
    #[serde(skip)]
    _marker: std::marker::PhantomData<T>,
}

// Manual impls so the marker type does not need to be Clone/Copy itself.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> Id<T> {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an identifier from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: std::marker::PhantomData,
        }
    }

    /// Get the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The nil (all zeros) identifier.
    pub fn nil() -> Self {
        Self::from_uuid(Uuid::nil())
    }

    /// Check if this is the nil identifier.
    pub fn is_nil(&self) -> bool {
        self.uuid.is_nil()
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

impl<T> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_uuid(Uuid::parse_str(s)?))
    }
}

/// Marker type for transactions.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxMarker;
/// Identifier for a store transaction.
pub type TxId = Id<TxMarker>;

/// Marker type for events.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventMarker;
/// Identifier for a policy event.
pub type EventId = Id<EventMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_new() {
        let id1 = TxId::new();
        let id2 = TxId::new();
        assert_ne!(id1, id2, "Generated IDs should be unique");
    }

    #[test]
    fn test_id_nil() {
        let nil_id = EventId::nil();
        assert_eq!(nil_id.to_string(), "00000000-0000-0000-0000-000000000000");
        assert!(nil_id.is_nil());
        assert!(!EventId::new().is_nil());
    }

    #[test]
    fn test_id_serde() {
        let id = TxId::new();
        let serialized = serde_json::to_string(&id).unwrap();
        let deserialized: TxId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(id, deserialized);
    }
}
