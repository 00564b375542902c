//! Identifier newtypes shared by the store and its consumers.

/// Macro to define a newtype wrapper around `i64` with standard trait
/// implementations.
///
/// Each generated type:
/// - Is a transparent wrapper around `i64` (zero runtime cost)
/// - Derives `Copy`, `Clone`, `Debug`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Derives `Serialize` and `Deserialize` (transparent)
/// - Implements `From<i64>` and `Into<i64>`
/// - Implements `Display` that outputs the inner value
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a registered user.
    ///
    /// Assigned by the store on creation. Passing an [`AppId`] where a
    /// `UserId` is expected is a compile-time error.
    ///
    /// # Examples
    ///
    /// ```
    /// use sso_storage::UserId;
    ///
    /// let id = UserId::from(42);
    /// assert_eq!(i64::from(id), 42);
    /// assert_eq!(id.to_string(), "42");
    /// ```
    UserId
);

define_id!(
    /// Identifier of a client application.
    ///
    /// Selects the signing secret used for a session token and scopes the
    /// token to that application.
    ///
    /// # Examples
    ///
    /// ```
    /// use sso_storage::AppId;
    ///
    /// let app = AppId::from(1);
    /// assert_eq!(i64::from(app), 1);
    /// ```
    AppId
);
