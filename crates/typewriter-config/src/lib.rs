use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
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

    #[error("{field} is {value}, expected {min} to {max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Ocean,
    Sepia,
    Aurora,
    DarkBlue,
    Midnight,
    DeepBlue,
    Plum,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        matches!(
            self,
            Theme::Dark | Theme::DarkBlue | Theme::Midnight | Theme::DeepBlue | Theme::Plum | Theme::Aurora
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub font_family: String,
    pub font_size: u32,
    pub line_height: f64,
    pub word_wrap: bool,
    /// Per-paragraph direction in the preview.
    pub auto_direction: bool,
    pub show_line_numbers: bool,
    pub show_minimap: bool,
    pub tab_size: u32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            font_family: "JetBrains Mono".to_string(),
            font_size: 16,
            line_height: 1.6,
            word_wrap: true,
            auto_direction: true,
            show_line_numbers: true,
            show_minimap: false,
            tab_size: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Append the char map `<script>` to rendered HTML.
    pub embed_char_map: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub echo_suppression_ms: u64,
}

impl SyncSettings {
    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_suppression_ms)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            echo_suppression_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    /// Default folder for saved documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_path: Option<PathBuf>,
    pub editor: EditorSettings,
    pub render: RenderSettings,
    pub sync: SyncSettings,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            log::debug!("no config at {}", config_path.display());
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

        // Expand shell variables and tilde in the documents folder
        config.documents_path = config
            .documents_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        config.validate()?;
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        self.validate()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, self.to_toml()?)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/typewriter");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Checks numeric settings against the ranges the editor accepts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let editor = &self.editor;
        check_range("editor.font_size", f64::from(editor.font_size), 10.0, 32.0)?;
        check_range("editor.line_height", editor.line_height, 1.0, 3.0)?;
        check_range("editor.tab_size", f64::from(editor.tab_size), 2.0, 8.0)?;
        check_range(
            "sync.echo_suppression_ms",
            self.sync.echo_suppression_ms as f64,
            0.0,
            5000.0,
        )
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
