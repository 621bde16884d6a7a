//! Typed identifiers for PaperKG entities.
//!
//! Every identifier in the data model is, at the wire boundary, an opaque
//! string. We still want compile-time separation between e.g. a
//! `PaperId` and a `GraphEntityId` so that a caller cannot accidentally pass
//! one where the other is expected. `define_string_id!` generates a newtype
//! around `String` with that separation, transparent (de)serialization, and
//! the small set of constructors every call site needs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a type-safe, string-backed entity ID newtype.
macro_rules! define_string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing string as an id, without reshaping it.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the id, returning the underlying string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(PaperId, "Identifier for a canonical paper record.");
define_string_id!(GraphEntityId, "Identifier for a node in the knowledge graph.");
define_string_id!(GraphRelationId, "Identifier for a directed edge in the knowledge graph.");
define_string_id!(RuleId, "Identifier for a normalization rule.");
define_string_id!(ScheduleId, "Identifier for a registered ingestion schedule.");
