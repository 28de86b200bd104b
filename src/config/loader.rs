//! Configuration loader.
//!
//! Loads a [`Config`] from a TOML file or string. Loading is purely
//! structural — it does not resolve stage types against the registry or
//! check cross-stage invariants; call [`crate::config::validate_config`]
//! (and [`crate::stages::registry::build`]) afterward.
//!
//! # Example Usage
//!
//! ```rust
//! use cascadeflow::config::loader::{load_config, load_config_from_string};
//!
//! let config = load_config("config.toml")?;
//!
//! let toml_content = r#"
//!     name = "demo"
//!
//!     [[stage]]
//!     type = "simulated"
//!     [stage.parameters]
//!     field_out = "value"
//! "#;
//! let config = load_config_from_string(toml_content)?;
//! ```

use crate::config::types::Config;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file.
///
/// # Errors
///
/// Fails on I/O errors (missing file, permissions, non-UTF-8 content) or
/// TOML parse/type errors (malformed syntax, a `stage.type` value that
/// isn't a string, etc).
///
/// # Example
///
/// ```rust
/// use cascadeflow::config::loader::load_config;
///
/// match load_config("config.toml") {
///     Ok(config) => println!("loaded {} stages", config.stages.len()),
///     Err(e) => {
///         eprintln!("failed to load configuration: {e}");
///         std::process::exit(1);
///     }
/// }
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    load_config_from_string(&content)
}

/// Loads configuration from a TOML string. Useful for tests and embedded
/// configuration.
///
/// # Example
///
/// ```rust
/// use cascadeflow::config::loader::load_config_from_string;
///
/// let toml_content = r#"
///     [[stage]]
///     type = "simulated"
///     [stage.parameters]
///     field_out = "value"
///
///     [[stage]]
///     type = "log"
/// "#;
///
/// let config = load_config_from_string(toml_content).unwrap();
/// assert_eq!(config.stages.len(), 2);
/// ```
pub fn load_config_from_string(content: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

/// A minimal, valid default configuration: a simulated source feeding a
/// console sink. Used as a starting point for `--config` examples and in
/// tests that don't care about the specific topology.
///
/// # Equivalent TOML
///
/// ```toml
/// name = "default"
///
/// [[stage]]
/// type = "simulated"
/// name = "source"
/// [stage.parameters]
/// field_out = "value"
/// interval_ms = 1000
///
/// [[stage]]
/// type = "log"
/// name = "sink"
/// ```
pub fn default_config() -> Config {
    use super::types::StageConfig;
    use std::collections::HashMap;

    let source = StageConfig {
        r#type: "simulated".to_string(),
        name: Some("source".to_string()),
        on_error: None,
        capacity: None,
        parameters: Some({
            let mut params = HashMap::new();
            params.insert("field_out".to_string(), serde_json::json!("value"));
            params.insert("interval_ms".to_string(), serde_json::json!(1000));
            params
        }),
    };

    let sink = StageConfig {
        r#type: "log".to_string(),
        name: Some("sink".to_string()),
        on_error: None,
        capacity: None,
        parameters: None,
    };

    Config {
        name: "default".to_string(),
        capacity: 128,
        stages: vec![source, sink],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_stages_in_textual_order() {
        let toml = r#"
            name = "demo"

            [[stage]]
            type = "simulated"
            name = "a"

            [[stage]]
            type = "set_field"
            name = "b"

            [[stage]]
            type = "log"
            name = "c"
        "#;
        let config = load_config_from_string(toml).unwrap();
        let names: Vec<_> = config.stages.iter().map(|s| s.instance_name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn default_config_is_loadable_shape() {
        let config = default_config();
        assert_eq!(config.stages.len(), 2);
    }
}
