use serde::{Deserialize, Serialize};

/// Severity level for contract violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks acceptance, triggers the repair loop
    Error,
    /// Reported alongside an accepted message
    Warning,
}

impl Severity {
    /// Get display symbol for severity
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Error => "❌",
            Severity::Warning => "⚠️",
        }
    }

    /// Get display name for severity
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }
}

/// A contract violation found in a commit message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Stable machine-readable code (e.g. `subject-length`)
    pub code: String,
    /// Human readable description
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Line number (1-indexed) where the violating construct starts
    pub line: Option<usize>,
}

impl ValidationError {
    pub fn error(code: impl Into<String>, message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Error,
            line,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Warning,
            line,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Format for display: `<icon> [code] message (line N)`
    pub fn format(&self) -> String {
        match self.line {
            Some(line) => format!(
                "{} [{}] {} (line {})",
                self.severity.symbol(),
                self.code,
                self.message,
                line
            ),
            None => format!("{} [{}] {}", self.severity.symbol(), self.code, self.message),
        }
    }
}

/// Result of validating one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// All violations in check order
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// Check if validation passed (no error-severity violations)
    pub fn is_valid(&self) -> bool {
        !self.errors.iter().any(ValidationError::is_error)
    }

    /// Check if there are any violations at all
    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.errors.iter().filter(|e| e.severity == severity).count()
    }

    /// Error-severity violations (blocking)
    pub fn blocking(&self) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.is_error()).collect()
    }

    pub fn warnings(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .collect()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Format all violations for display, one per line
    pub fn format_errors(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.format())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
