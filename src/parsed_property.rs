use std::{fmt::Display, ops::Deref, path::PathBuf};

/// A configuration property that remembers where its value came from
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ParsedProperty<T> {
    /// Value set in code by the caller (parsed_value, original_string)
    Explicit(T, String),
    /// Value from environment variable (parsed_value, env_var_value)
    Env(T, String),
    /// Value from configuration file (parsed_value, config_path, toml_value_string)
    File(T, PathBuf, String),
    /// Default value when no other source provided
    Default(T),
}

impl<T> ParsedProperty<T> {
    /// Get the parsed value
    pub fn value(&self) -> &T {
        match self {
            ParsedProperty::Explicit(value, _) => value,
            ParsedProperty::Env(value, _) => value,
            ParsedProperty::File(value, _, _) => value,
            ParsedProperty::Default(value) => value,
        }
    }

    /// Consume the property and return the parsed value
    pub fn into_value(self) -> T {
        match self {
            ParsedProperty::Explicit(value, _)
            | ParsedProperty::Env(value, _)
            | ParsedProperty::File(value, _, _)
            | ParsedProperty::Default(value) => value,
        }
    }

    /// Get the source name as a string
    pub fn source_name(&self) -> &'static str {
        match self {
            ParsedProperty::Explicit(_, _) => "explicit",
            ParsedProperty::Env(_, _) => "env",
            ParsedProperty::File(_, _, _) => "file",
            ParsedProperty::Default(_) => "default",
        }
    }

    /// Get the original string value if available
    pub fn original(&self) -> Option<&str> {
        match self {
            ParsedProperty::Explicit(_, original) => Some(original),
            ParsedProperty::Env(_, original) => Some(original),
            ParsedProperty::File(_, _, original) => Some(original),
            ParsedProperty::Default(_) => None,
        }
    }

    /// Check if this property came from a specific source
    pub fn is_from_source(&self, source: &str) -> bool {
        self.source_name() == source
    }
}

impl<T> Deref for ParsedProperty<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value()
    }
}

impl<T: Display> Display for ParsedProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}

impl<T: AsRef<str>> AsRef<str> for ParsedProperty<T> {
    fn as_ref(&self) -> &str {
        self.value().as_ref()
    }
}

impl<T> From<T> for ParsedProperty<T> {
    fn from(value: T) -> Self {
        ParsedProperty::Default(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # ParsedProperty Value Access
    ///
    /// Tests accessing the parsed value from every source variant.
    ///
    /// ## Test Scenario
    /// - Creates ParsedProperty instances from each source
    /// - Reads them via value(), Deref and into_value()
    ///
    /// ## Expected Outcome
    /// - All accessors return the same parsed value
    #[test]
    fn test_parsed_property_value_access() {
        let props = vec![
            ParsedProperty::Explicit(50_usize, "50".to_string()),
            ParsedProperty::Env(50, "50".to_string()),
            ParsedProperty::File(50, PathBuf::from("config.toml"), "50".to_string()),
            ParsedProperty::Default(50),
        ];

        for prop in props {
            assert_eq!(*prop.value(), 50);
            assert_eq!(*prop, 50);
            assert_eq!(prop.into_value(), 50);
        }
    }

    /// # ParsedProperty Source Tracking
    ///
    /// Tests that each variant reports its source and original text.
    #[test]
    fn test_parsed_property_sources() {
        let env_prop = ParsedProperty::Env(true, "true".to_string());
        let file_prop = ParsedProperty::File(
            "6.0".to_string(),
            PathBuf::from("config.toml"),
            "api_version = \"6.0\"".to_string(),
        );
        let default_prop: ParsedProperty<String> = "DefaultCollection".to_string().into();

        assert_eq!(env_prop.source_name(), "env");
        assert!(env_prop.is_from_source("env"));
        assert_eq!(file_prop.original(), Some("api_version = \"6.0\""));
        assert_eq!(default_prop.source_name(), "default");
        assert_eq!(default_prop.original(), None);
        assert_eq!(default_prop.to_string(), "DefaultCollection");
        let api_version: &str = file_prop.as_ref();
        assert_eq!(api_version, "6.0");
    }
}
