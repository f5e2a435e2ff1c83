// netrain-config/src/validation.rs
//! Custom validation functions for configuration.

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static INTERFACE_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.\-]+$").ok());

/// Validate that an interface name follows Linux naming conventions (`IFNAMSIZ` - 1).
/// An empty name means "auto-detect" and is accepted.
pub fn validate_interface(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Ok(());
    }

    let re = INTERFACE_NAME
        .as_ref()
        .ok_or_else(|| ValidationError::new("invalid_regex"))?;

    if name.len() <= 15 && re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_interface"))
    }
}

/// Validate a BPF filter expression is non-empty and free of control characters.
pub fn validate_filter(filter: &str) -> Result<(), ValidationError> {
    if !filter.trim().is_empty() && !filter.chars().any(|c| c.is_control()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_filter"))
    }
}

/// Validate log level names accepted by the default filter.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error", "off"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}
