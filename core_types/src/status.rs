//! Status codes reported across the external boundary
//!
//! Creation calls hand back either a non-negative handle or one of these
//! negative codes. The name table is for diagnostics only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric operation status
///
/// Zero is success, negative values are failures. Application code may
/// report its own codes through periodic task bodies; those print as
/// `UNKNOWN_ERROR` unless they collide with a code below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const SUCCESS: StatusCode = StatusCode(0);
    pub const ERROR: StatusCode = StatusCode(-1);
    pub const INVALID_PARAMETER: StatusCode = StatusCode(-2);
    pub const RESOURCE_EXHAUSTED: StatusCode = StatusCode(-3);
    pub const INVALID_HANDLE: StatusCode = StatusCode(-4);
    pub const NOT_INITIALIZED: StatusCode = StatusCode(-5);
    pub const NOT_FOUND: StatusCode = StatusCode(-6);
    pub const BACKEND_FAILURE: StatusCode = StatusCode(-7);

    const NAMES: [(StatusCode, &'static str); 8] = [
        (StatusCode::SUCCESS, "SUCCESS"),
        (StatusCode::ERROR, "ERROR"),
        (StatusCode::INVALID_PARAMETER, "INVALID_PARAMETER"),
        (StatusCode::RESOURCE_EXHAUSTED, "RESOURCE_EXHAUSTED"),
        (StatusCode::INVALID_HANDLE, "INVALID_HANDLE"),
        (StatusCode::NOT_INITIALIZED, "NOT_INITIALIZED"),
        (StatusCode::NOT_FOUND, "NOT_FOUND"),
        (StatusCode::BACKEND_FAILURE, "BACKEND_FAILURE"),
    ];

    /// Returns the raw value
    pub fn code(&self) -> i32 {
        self.0
    }

    /// Returns true for the success code
    pub fn is_success(&self) -> bool {
        self.0 == 0
    }

    /// Returns the fixed short name for this code
    pub fn name(&self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(code, _)| code == self)
            .map(|(_, name)| *name)
            .unwrap_or("UNKNOWN_ERROR")
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}
