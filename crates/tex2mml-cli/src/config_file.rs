use std::{fs, io, path::Path};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    #[serde(flatten)]
    pub tex2mml: tex2mml::Config,
}

/// Error type for configuration loading operations.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error when reading the file.
    Io(io::Error),
    /// TOML parsing error.
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {err}"),
            ConfigError::Parse(err) => write!(f, "TOML parsing error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Loads the converter configuration from a TOML file.
///
/// Keys are the kebab-case names of the fields of [`tex2mml::Config`]; missing keys keep
/// their defaults. Macros go into a `[macros]` table.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok(config)
}

#[inline]
fn parse_config(s: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(s)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use tex2mml::{PrettyPrint, TagMode, TagSide};

    use super::*;

    fn macro_def<'a>(config: &'a Config, name: &str) -> Option<&'a str> {
        config
            .tex2mml
            .macros
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, def)| def.as_str())
    }

    #[test]
    fn full_config() {
        let toml_content = r#"
pretty-print = "always"
xml-namespace = true
tags = "ams"
tag-side = "left"
tag-indent = "1em"
start-number = 10
max-macros = 50

[macros]
R = "\\mathbb{R}"
"é" = "\\acute{e}"
        "#;
        let config = parse_config(toml_content).unwrap();
        let inner = &config.tex2mml;
        assert!(matches!(inner.pretty_print, PrettyPrint::Always));
        assert!(inner.xml_namespace);
        assert_eq!(inner.tags, TagMode::Ams);
        assert_eq!(inner.tag_side, TagSide::Left);
        assert_eq!(inner.tag_indent, "1em");
        assert_eq!(inner.start_number, 10);
        assert_eq!(inner.max_macros, 50);
        assert_eq!(macro_def(&config, "R"), Some("\\mathbb{R}"));
        assert_eq!(macro_def(&config, "é"), Some("\\acute{e}"));
    }

    #[test]
    fn invalid_config() {
        let result = parse_config("invalid_toml");
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        let result = parse_config(r#"tags = "sometimes""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn partial_config() {
        let toml_content = r#"
[macros]
R = "\\mathbb{R}"
        "#;
        let config = parse_config(toml_content).unwrap();
        let inner = &config.tex2mml;
        assert!(matches!(inner.pretty_print, PrettyPrint::Never));
        assert_eq!(inner.tags, TagMode::None);
        assert!(inner.use_label_ids);
        assert_eq!(inner.tag_indent, "0.8em");
        assert_eq!(macro_def(&config, "R"), Some("\\mathbb{R}"));
    }
}
