//! Self-documenting TOML configuration files.
//!
//! A config struct derives serde with `#[serde(default)]` and then registers each field
//! with a one-line description through [`documented_config!`]. Saving writes every field
//! with its description as a trailing comment; optional fields that are unset are written
//! commented out so users can discover them without reading the source.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata about one configuration field
#[derive(Debug, Clone)]
pub struct ConfigFieldMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub is_optional: bool,
}

/// Render any serializable value the way it would appear on the right of `key = `.
pub fn toml_literal<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    toml::Value::try_from(value).ok().map(|v| v.to_string())
}

/// Implemented by [`documented_config!`].
pub trait DocumentedConfig: Sized + Default + Serialize + DeserializeOwned {
    fn field_metadata() -> Vec<ConfigFieldMeta>;

    /// TOML literal of the field's current value, or `None` for an unset optional field.
    fn field_literal(&self, field_name: &str) -> Option<String>;

    /// TOML literal used in the commented-out line of an unset optional field.
    fn placeholder_literal(field_name: &str) -> String;

    fn config_path() -> Result<PathBuf>;

    fn render_documented(&self) -> String {
        let mut output = String::new();
        for field in Self::field_metadata() {
            match self.field_literal(field.name) {
                Some(value) => output.push_str(&format!(
                    "{} = {}  # {}\n",
                    field.name, value, field.description
                )),
                None => output.push_str(&format!(
                    "# {} = {}  # {}\n",
                    field.name,
                    Self::placeholder_literal(field.name),
                    field.description
                )),
            }
        }
        output
    }

    fn save_with_documentation(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        fs::write(path, self.render_documented())
            .with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    /// Load from `path`, writing a documented default file first if none exists.
    fn load_from_path_documented(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_with_documentation(path)?;
            return Ok(config);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Register a config struct's fields and storage location.
///
/// ```ignore
/// documented_config!(VideoConfig {
///     fields: [
///         music_volume, "Music bed gain relative to narration (0.0-1.0)",
///     ],
///     optional: [
///         datasets_dir, "Directory containing footage/music dataset folders",
///     ],
///     config_path: paths::config_dir().map(|dir| dir.join("video.toml")),
/// });
/// ```
#[macro_export]
macro_rules! documented_config {
    (
        $config_name:ident {
            fields: [
                $($field:ident, $desc:expr),* $(,)?
            ],
            optional: [
                $($opt_field:ident, $opt_desc:expr),* $(,)?
            ],
            config_path: $path:expr $(,)?
        }
    ) => {
        impl $crate::common::config::DocumentedConfig for $config_name {
            fn field_metadata() -> Vec<$crate::common::config::ConfigFieldMeta> {
                vec![
                    $(
                        $crate::common::config::ConfigFieldMeta {
                            name: stringify!($field),
                            description: $desc,
                            is_optional: false,
                        },
                    )*
                    $(
                        $crate::common::config::ConfigFieldMeta {
                            name: stringify!($opt_field),
                            description: $opt_desc,
                            is_optional: true,
                        },
                    )*
                ]
            }

            fn field_literal(&self, field_name: &str) -> Option<String> {
                match field_name {
                    $(
                        stringify!($field) => $crate::common::config::toml_literal(&self.$field)
                            .or_else(|| Some(format!("{:?}", self.$field))),
                    )*
                    $(
                        stringify!($opt_field) => self
                            .$opt_field
                            .as_ref()
                            .and_then(|value| $crate::common::config::toml_literal(value)),
                    )*
                    _ => None,
                }
            }

            fn placeholder_literal(field_name: &str) -> String {
                let defaults = Self::default();
                match field_name {
                    $(
                        stringify!($opt_field) => {
                            let inner = defaults.$opt_field.clone().unwrap_or_default();
                            $crate::common::config::toml_literal(&inner)
                                .unwrap_or_else(|| "\"\"".to_string())
                        }
                    )*
                    _ => "\"\"".to_string(),
                }
            }

            fn config_path() -> anyhow::Result<std::path::PathBuf> {
                $path
            }
        }
    };
}
