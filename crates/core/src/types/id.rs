//! Newtype IDs for type-safe document keys.
//!
//! Use the `define_id!` macro to create type-safe key wrappers that prevent
//! accidentally mixing keys from different document types.
//!
//! Keys in the store are strings, and the empty string is reserved as a
//! sentinel meaning "no such key": lookups with a sentinel key must resolve
//! to an empty result, never match a real document, and never error.

/// Macro to define a type-safe document key wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Default`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_string()`
/// - `is_sentinel()` for the reserved empty-string key
/// - `From<&str>` and `From<String>` implementations
///
/// # Example
///
/// ```rust
/// # use canopy_core::define_id;
/// define_id!(UserId);
/// define_id!(ItemId);
///
/// let user_id = UserId::new("u1");
/// let item_id = ItemId::new("i1");
///
/// assert!(!user_id.is_sentinel());
/// assert!(UserId::new("").is_sentinel());
///
/// // These are different types, so this won't compile:
/// // let _: UserId = item_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new key from a string value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the key, returning the underlying string.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }

            /// Whether this is the reserved "no such key" sentinel.
            #[must_use]
            pub fn is_sentinel(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

// Define standard document keys
define_id!(UserId);
define_id!(ItemId);
