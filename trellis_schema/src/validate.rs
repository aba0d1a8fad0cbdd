// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Validation outcome types.
//!
//! Validators never raise errors; they produce [`ValidationResult`] values
//! that the tree collects and surfaces to the display layer.

use alloc::string::String;

/// How serious a failing validation result is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Informational notice.
    Info,
    /// Suspicious but usable.
    Warning,
    /// The value is wrong.
    Error,
}

/// The outcome of running one validator against one node.
///
/// # Example
///
/// ```rust
/// use trellis_schema::{Severity, ValidationResult};
///
/// let ok = ValidationResult::valid();
/// assert!(ok.is_valid());
///
/// let bad = ValidationResult::error("health must be positive");
/// assert!(!bad.is_valid());
/// assert_eq!(bad.severity(), Severity::Error);
/// assert_eq!(bad.message(), "health must be positive");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    valid: bool,
    severity: Severity,
    message: String,
}

impl ValidationResult {
    /// A passing result.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            severity: Severity::Info,
            message: String::new(),
        }
    }

    /// A failing result with the given severity and message.
    #[must_use]
    pub fn invalid(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            severity,
            message: message.into(),
        }
    }

    /// A failing result with [`Severity::Info`].
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::invalid(Severity::Info, message)
    }

    /// A failing result with [`Severity::Warning`].
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::invalid(Severity::Warning, message)
    }

    /// A failing result with [`Severity::Error`].
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::invalid(Severity::Error, message)
    }

    /// Returns `true` if the validator passed.
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the severity of a failing result.
    #[must_use]
    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message of a failing result.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}
