//! Shared identifiers for persisted windows and displays.
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Identifier of the application's primary window. It is never removed from
/// the registry.
pub const MAIN_WINDOW_ID: &str = "main";

/// Prefix used for generated window identifiers (`win1`, `win2`, ...).
pub const GENERATED_ID_PREFIX: &str = "win";

/// Opaque identifier for a display as reported by the host.
pub type DisplayId = i64;

/// Identifier for a persisted window.
///
/// The same identifier keys both the saved geometry and the registry entry,
/// so a window keeps its identity across restarts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    /// Construct an identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of the main window.
    #[must_use]
    pub fn main() -> Self {
        Self(MAIN_WINDOW_ID.to_string())
    }

    /// Identifier for the `n`th generated window.
    #[must_use]
    pub fn generated(n: u64) -> Self {
        Self(format!("{GENERATED_ID_PREFIX}{n}"))
    }

    /// True for the reserved main window id.
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.0 == MAIN_WINDOW_ID
    }

    /// Borrow the identifier as a store key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WindowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for WindowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for WindowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_id_is_reserved() {
        assert!(WindowId::main().is_main());
        assert!(!WindowId::new("win1").is_main());
    }

    #[test]
    fn generated_ids_use_prefix() {
        assert_eq!(WindowId::generated(7).as_str(), "win7");
    }

    #[test]
    fn display_matches_store_key() {
        let id = WindowId::from("win3");
        assert_eq!(id.to_string(), id.as_str());
    }
}
