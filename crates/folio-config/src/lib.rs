pub mod config;
pub mod error;
pub mod sanitize;
pub mod templates;

pub use config::Config;
pub use error::ConfigError;
pub use sanitize::SanitizeConfig;
