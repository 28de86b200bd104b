//! Configuration module: TOML deserialisation, per-stage field-mapping
//! helpers, and structural validation for a config-driven pipeline.

pub mod field;
pub mod loader;
pub mod params;
pub mod traits;
pub mod types;
pub mod validation;

pub use field::FieldConfig;
pub use traits::ProcessorConfig;

pub use loader::{default_config, load_config, load_config_from_string};
pub use params::{extract_field_params, extract_param};
pub use types::{Config, StageConfig};
pub use validation::validate_config;
