//! Diagnostics and fatal errors raised while processing a model.
//!
//! Recoverable problems are recorded on a [`Diagnostics`] sink and generation
//! continues without the offending declaration. Problems that would produce
//! malformed output abort the run with a [`GenerateError`].

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::loader::LoadError;

/// How serious a recorded diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// A best-effort fallback was applied and output is still complete.
    Warning,
    /// The offending declaration, parameter or field was dropped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A single recorded problem, tagged with the declaration it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Declaring type, method or parameter, e.g. `Texture::getPixels`.
    pub context: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.severity, self.context, self.message)
    }
}

/// Accumulates diagnostics across every pass of a run.
///
/// Each recorded entry is also forwarded to the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn warning(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, context.into(), message.into());
    }

    /// Record an error. The caller is expected to drop the offending item.
    pub fn error(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, context.into(), message.into());
    }

    fn push(&mut self, severity: Severity, context: String, message: String) {
        let diagnostic = Diagnostic {
            severity,
            context,
            message,
        };
        match severity {
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error => log::error!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries recorded with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Whether any entry's message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }
}

/// Errors that stop generation for the whole run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A category/flag combination reached a code path that must be unreachable.
    #[error("{context}: {message}")]
    FatalInvariant { context: String, message: String },

    /// A type name was used that the registry does not know about.
    #[error("{context}: type `{type_name}` is not registered")]
    UnknownType { context: String, type_name: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    pub fn fatal(context: impl Into<String>, message: impl Into<String>) -> Self {
        GenerateError::FatalInvariant {
            context: context.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_severity_and_context() {
        let mut diags = Diagnostics::new();
        diags.warning("Texture", "unresolved @copydoc");
        diags.error("Texture::getPixels", "dropped");

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.count(Severity::Warning), 1);
        assert!(diags.has_errors());
        assert!(diags.mentions("@copydoc"));

        let first = diags.iter().next().unwrap();
        assert_eq!(first.context, "Texture");
        assert_eq!(
            first.to_string(),
            "warning: [Texture] unresolved @copydoc"
        );
    }

    #[test]
    fn test_fatal_error_message_carries_context() {
        let err = GenerateError::fatal("Mesh::setMaterial", "no ownership kind");
        assert_eq!(err.to_string(), "Mesh::setMaterial: no ownership kind");
    }
}
