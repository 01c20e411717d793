use serde::Deserialize;
use sqlmap_core::{parsing::DefaultValue, Result};
use sqlmap_sql::PlaceholderStyle;

/// Global switches that change how mappings are compiled.
///
/// Field names follow the camel-cased keys of a settings document:
///
/// ```
/// # use sqlmap::Settings;
/// let settings = Settings::from_json(r#"{ "useGeneratedKeys": true, "placeholder": "dollar" }"#).unwrap();
/// assert!(settings.use_generated_keys);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    /// Default `fetchType` of nested query mappings.
    pub lazy_loading_enabled: bool,

    /// Default `useGeneratedKeys` of insert statements.
    pub use_generated_keys: bool,

    /// Match `first_name` columns against `firstName` properties.
    pub map_underscore_to_camel_case: bool,

    pub shrink_whitespaces_in_sql: bool,
    pub reflector_cache_enabled: bool,

    /// Selects statements and fragments declared for this database.
    pub database_id: Option<String>,

    pub placeholder: PlaceholderStyle,
    pub default_fetch_size: Option<u32>,
    pub default_statement_timeout: Option<u32>,

    /// Allow `${key:default}` in markup.
    pub enable_default_value: bool,
    pub default_value_separator: String,
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Settings> {
        Ok(serde_json::from_str(text)?)
    }

    pub(crate) fn default_value(&self) -> DefaultValue<'_> {
        DefaultValue {
            enabled: self.enable_default_value,
            separator: &self.default_value_separator,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            lazy_loading_enabled: false,
            use_generated_keys: false,
            map_underscore_to_camel_case: false,
            shrink_whitespaces_in_sql: false,
            reflector_cache_enabled: true,
            database_id: None,
            placeholder: PlaceholderStyle::Question,
            default_fetch_size: None,
            default_statement_timeout: None,
            enable_default_value: false,
            default_value_separator: ":".to_string(),
        }
    }
}
