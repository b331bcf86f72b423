//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (deep-merged over the defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `COMPDEPS_DEBUG` | `debug` |
//! | `COMPDEPS_LOG_LEVEL` | `log_level` |
//! | `COMPDEPS_URL_PREFIX` | `url_prefix` |
//! | `COMPDEPS_MARKER_PREFIX` | `marker_prefix` |
//! | `COMPDEPS_DEFAULT_STRATEGY` | `default_strategy` |
//! | `COMPDEPS_LOADER_SCRIPT_URL` | `loader_script_url` (empty unsets it) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use compdeps_core::settings_loader;
//!
//! let settings = settings_loader::from_file_with_env("compdeps.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::DepsError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Fields missing from the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, DepsError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| DepsError::Configuration(format!("Failed to parse TOML: {e}")))?;
    from_json_value(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, DepsError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| DepsError::Configuration(format!("Failed to parse JSON: {e}")))?;
    from_json_value(json_value, "JSON")
}

/// Loads settings from a file, picking the format from its extension.
///
/// `.json` files are read as JSON, everything else as TOML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed.
pub fn from_file(path: impl AsRef<Path>) -> Result<Settings, DepsError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        DepsError::Configuration(format!(
            "Failed to read settings file '{}': {e}",
            path.display()
        ))
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        from_json_str(&content)
    } else {
        from_toml_str(&content)
    }
}

/// Loads settings from a file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is malformed, or if an
/// environment override holds an invalid value.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, DepsError> {
    let mut settings = from_file(path)?;
    apply_env_overrides(&mut settings)?;
    settings.validate()?;
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
///
/// # Errors
///
/// Returns an error if an environment override holds an invalid value.
pub fn from_env() -> Result<Settings, DepsError> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings)?;
    settings.validate()?;
    Ok(settings)
}

/// Applies environment variable overrides to a settings struct.
///
/// # Errors
///
/// Returns an error if `COMPDEPS_DEFAULT_STRATEGY` names an unknown strategy.
pub fn apply_env_overrides(settings: &mut Settings) -> Result<(), DepsError> {
    apply_overrides(settings, |name| std::env::var(name).ok())
}

/// Applies overrides from an arbitrary lookup function.
///
/// Split out from [`apply_env_overrides`] so tests do not have to mutate the
/// process environment.
fn apply_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), DepsError> {
    if let Some(val) = lookup("COMPDEPS_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("COMPDEPS_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("COMPDEPS_URL_PREFIX") {
        settings.url_prefix = val;
    }

    if let Some(val) = lookup("COMPDEPS_MARKER_PREFIX") {
        settings.marker_prefix = val;
    }

    if let Some(val) = lookup("COMPDEPS_DEFAULT_STRATEGY") {
        settings.default_strategy = val.parse()?;
    }

    if let Some(val) = lookup("COMPDEPS_LOADER_SCRIPT_URL") {
        settings.loader_script_url = if val.trim().is_empty() {
            None
        } else {
            Some(val)
        };
    }

    Ok(())
}

// ============================================================
// Helpers
// ============================================================

fn from_json_value(value: serde_json::Value, format: &str) -> Result<Settings, DepsError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        DepsError::Configuration(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        DepsError::Configuration(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
