use folio_engine::lists::{DEFAULT_ITEM_CONTENT, UnknownListStyle};
use folio_engine::{EditorOptions, ListKind, ListStyle, MentionMember, Platform};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid list style in config file at {config_path}: {source}")]
    ListStyleError {
        config_path: PathBuf,
        source: UnknownListStyle,
    },
}

fn default_item_content() -> String {
    DEFAULT_ITEM_CONTENT.to_string()
}

/// Settings for one editor instance. Every field may be left out of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Key convention for `Mod-` bindings. Unset means the build target's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    #[serde(default = "default_item_content")]
    pub list_item_content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ordered_style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bullet_style: Option<String>,

    /// Document opened when none is named on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_document: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<MentionMember>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: None,
            list_item_content: default_item_content(),
            default_ordered_style: None,
            default_bullet_style: None,
            default_document: None,
            mentions: Vec::new(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            debug!("No config file at {}", config_path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Catch bad style names here, where the error can still name the file
        config
            .editor_options()
            .map_err(|source| ConfigError::ListStyleError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.default_document = config
            .default_document
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/folio");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Editor options with unset values taken from the engine defaults.
    pub fn editor_options(&self) -> Result<EditorOptions, UnknownListStyle> {
        let defaults = EditorOptions::default();
        Ok(EditorOptions {
            platform: self.platform.unwrap_or(defaults.platform),
            list_item_content: self.list_item_content.clone(),
            default_ordered_style: style_for(
                ListKind::Ordered,
                self.default_ordered_style.as_deref(),
            )?,
            default_bullet_style: style_for(
                ListKind::Bullet,
                self.default_bullet_style.as_deref(),
            )?,
            mentions: self.mentions.clone(),
        })
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// A bullet style is no use as the ordered default and vice versa.
fn style_for(kind: ListKind, name: Option<&str>) -> Result<ListStyle, UnknownListStyle> {
    let Some(name) = name else {
        return Ok(kind.default_style());
    };
    ListStyle::parse(name)
        .filter(|style| kind.styles().contains(style))
        .ok_or_else(|| UnknownListStyle(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_engine::MemberId;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::env;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, content).unwrap();
        (temp_dir, config_file)
    }

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/folio/config.toml"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let (_dir, config_file) = write_config("");

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config, Config::default());
        let options = config.editor_options().unwrap();
        assert_eq!(options.list_item_content, "paragraph block*");
        assert_eq!(options.default_ordered_style, ListStyle::Decimal);
        assert_eq!(options.default_bullet_style, ListStyle::Disc);
    }

    #[test]
    fn test_full_config() {
        let (_dir, config_file) = write_config(
            r#"
platform = "mac"
list_item_content = "paragraph (ordered_list | bullet_list)*"
default_ordered_style = "upper-roman"
default_bullet_style = "square"

[[mentions]]
name = "Ada"
id = 1
email = "ada@example.com"

[[mentions]]
name = "Grace"
id = "g-7"
email = "grace@example.com"
"#,
        );

        let options = Config::load_from_path(&config_file)
            .unwrap()
            .unwrap()
            .editor_options()
            .unwrap();

        assert_eq!(options.platform, Platform::Mac);
        assert_eq!(options.list_item_content, "paragraph (ordered_list | bullet_list)*");
        assert_eq!(options.default_ordered_style, ListStyle::UpperRoman);
        assert_eq!(options.default_bullet_style, ListStyle::Square);
        assert_eq!(options.mentions[0].id, MemberId::Number(1));
        assert_eq!(options.mentions[1].id, MemberId::Text("g-7".to_string()));
    }

    #[rstest]
    #[case("default_ordered_style = \"zigzag\"")]
    #[case("default_ordered_style = \"disc\"")]
    #[case("default_bullet_style = \"decimal\"")]
    fn test_bad_list_style_names_file(#[case] content: &str) {
        let (_dir, config_file) = write_config(content);

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(
            &err,
            ConfigError::ListStyleError { config_path, .. } if *config_path == config_file
        ));
    }

    #[test]
    fn test_style_codes_are_accepted() {
        let config = Config {
            default_ordered_style: Some("a".to_string()),
            ..Config::default()
        };
        assert_eq!(config.editor_options().unwrap().default_ordered_style, ListStyle::LowerAlpha);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let (_dir, config_file) = write_config("platform = ");

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_unknown_platform_is_parse_error() {
        let (_dir, config_file) = write_config("platform = \"amiga\"");
        assert!(matches!(
            Config::load_from_path(&config_file),
            Err(ConfigError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path(&PathBuf::from("~/docs/today.json")).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().ends_with("docs/today.json"));
    }

    #[test]
    fn test_default_document_with_env_var() {
        unsafe {
            env::set_var("FOLIO_DOCS", "/custom/docs");
        }

        let (_dir, config_file) = write_config("default_document = \"$FOLIO_DOCS/notes.json\"");
        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config.default_document, Some(PathBuf::from("/custom/docs/notes.json")));

        unsafe {
            env::remove_var("FOLIO_DOCS");
        }
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let config = Config {
            platform: Some(Platform::Other),
            default_bullet_style: Some("circle".to_string()),
            mentions: vec![MentionMember::new("Ada", MemberId::Number(1), "ada@example.com")],
            ..Config::default()
        };

        config.save_to_path(&config_file).unwrap();
        let loaded = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded, config);
    }
}
