//! Configuration validation
//!
//! Checks a [`LinkDumpConfig`] before the server starts and reports every
//! problem at once.

use super::linkdump_config::LinkDumpConfig;
use crate::LinkDumpError;

/// Validation error details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a linkdump configuration
pub fn validate_config(config: &LinkDumpConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.host.trim().is_empty() {
        errors.push(ValidationError::new("host", "Host cannot be empty"));
    }

    if !is_valid_email_addr(&config.email_addr) {
        errors.push(ValidationError::new(
            "email_addr",
            format!("Invalid email address: '{}'", config.email_addr),
        ));
    }

    if config.mailer.trim().is_empty() {
        errors.push(ValidationError::new("mailer", "Mailer program cannot be empty"));
    }

    if config.mailer_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "mailer_timeout_secs",
            "Mailer timeout must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Loose check: `local@domain`, no whitespace. The mailer has the final say.
fn is_valid_email_addr(addr: &str) -> bool {
    if addr.chars().any(char::is_whitespace) {
        return false;
    }
    match addr.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &LinkDumpConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        LinkDumpError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> LinkDumpConfig {
        let mut config = LinkDumpConfig::new();
        config.email_addr = "me@localhost".to_string();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_zero_link_min_is_allowed() {
        let mut config = valid_config();
        config.link_min = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_email_addrs() {
        for addr in ["", "me", "@localhost", "me@", "me@@localhost", "me @localhost"] {
            let mut config = valid_config();
            config.email_addr = addr.to_string();
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 1, "{addr:?}");
            assert_eq!(errors[0].field, "email_addr");
        }
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.host = " ".to_string();
        config.mailer = String::new();
        config.mailer_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["host", "mailer", "mailer_timeout_secs"]);
    }

    #[test]
    fn test_validate_config_result_message() {
        let mut config = valid_config();
        config.mailer_timeout_secs = 0;

        let err = validate_config_result(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Configuration validation failed"));
        assert!(message.contains("mailer_timeout_secs: Mailer timeout must be greater than 0"));
    }
}
