//! Structured warnings
//!
//! Some operations succeed with reduced correctness (e.g. non-uniform scale).
//! They return their value wrapped in [`Diagnosed`] so callers can surface or
//! ignore the warnings programmatically. The same warnings are also logged
//! through `tracing`.

use glam::Vec3;
use serde::Serialize;
use std::fmt;

/// What a diagnostic is about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Scale factors differ per axis, so the result is no longer a true
    /// distance field
    NonUniformScale { factors: Vec3 },
}

/// A recoverable warning attached to a successful result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    /// Operations whose results become unreliable downstream
    pub affected: Vec<&'static str>,
    pub message: String,
}

impl Diagnostic {
    pub fn non_uniform_scale(factors: Vec3) -> Self {
        let affected = vec!["offset", "shell", "fillet", "chamfer", "blur", "distance queries"];
        let message = format!(
            "non-uniform scale ({}, {}, {}) distorts distances; {} will be approximate",
            factors.x,
            factors.y,
            factors.z,
            affected.join(", ")
        );
        Self {
            kind: DiagnosticKind::NonUniformScale { factors },
            affected,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A value together with the warnings produced while building it
#[derive(Debug, Clone)]
pub struct Diagnosed<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Diagnosed<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn with(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// True when no warnings were produced
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Drop the warnings and keep the value
    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Diagnosed<U> {
        Diagnosed {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}
