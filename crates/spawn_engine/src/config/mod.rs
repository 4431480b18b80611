//! Configuration system

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Scene configuration
///
/// Controls how a [`Scene`](crate::ecs::Scene) resolves models and how many
/// entities it will hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Model substituted for names the loader cannot resolve
    ///
    /// When unset, a missing model fails the component that asked for it.
    pub fallback_model: Option<String>,

    /// Maximum number of live entities (None = unbounded)
    pub max_entities: Option<usize>,

    /// Log every entity spawned by `Scene::load_entities` at info level
    pub log_spawned_entities: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fallback_model: None,
            max_entities: None,
            log_spawned_entities: true,
        }
    }
}

impl SceneConfig {
    /// Set the fallback model
    pub fn with_fallback_model(mut self, name: impl Into<String>) -> Self {
        self.fallback_model = Some(name.into());
        self
    }

    /// Set the entity limit
    pub fn with_max_entities(mut self, max_entities: usize) -> Self {
        self.max_entities = Some(max_entities);
        self
    }
}

impl Config for SceneConfig {}
