//! Configuration system
//!
//! Startup-only settings: bind address, dump threshold, recipient and the
//! mail transport to use. Sources, lowest precedence first:
//! - built-in defaults
//! - ~/.config/linkdump/config.yaml (or `--config <path>`)
//! - `LINKDUMP_*` environment variables and command-line flags

mod linkdump_config;
pub mod validation;

pub use linkdump_config::{default_email_addr, LinkDumpConfig};
pub use validation::{validate_config, validate_config_result, ValidationError};
