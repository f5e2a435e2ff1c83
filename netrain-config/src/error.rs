//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// One or more fields failed range or format validation.
    #[error("Invalid configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// Values that are valid on their own but contradict each other.
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),

    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] Box<figment::Error>),
}

fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut output = String::new();
    collect_messages(errors, "", &mut output);
    output
}

/// Flattens nested section errors into `section.field: message` lines.
fn collect_messages(errors: &ValidationErrors, prefix: &str, output: &mut String) {
    use std::fmt::Write;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let message = failure
                        .message
                        .as_ref()
                        .map_or_else(|| failure.code.to_string(), |m| m.to_string());
                    let _ = writeln!(output, "  {path}: {message}");
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, &path, output),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(nested, &format!("{path}[{index}]"), output);
                }
            }
        }
    }
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::Parsing(Box::new(error))
    }
}
