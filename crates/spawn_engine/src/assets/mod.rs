//! Model resolution for components
//!
//! Components refer to models by name (`"models/barney.mdl"`, `"sprites/glow01.spr"`,
//! `"*12"`). Loading the model data is the job of an external [`ModelLoader`];
//! the [`ModelManager`] caches results per scene and can substitute a fallback
//! model for names that fail to load.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

/// Kind of model, derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Studio (skeletal) model
    Studio,
    /// Sprite
    Sprite,
    /// Brush model (a whole map, or an inline submodel such as `*3`)
    Brush,
    /// Anything else
    Unknown,
}

impl ModelKind {
    /// Derive the kind from a model name
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();

        if lower.starts_with('*') || lower.ends_with(".bsp") {
            Self::Brush
        } else if lower.ends_with(".mdl") {
            Self::Studio
        } else if lower.ends_with(".spr") {
            Self::Sprite
        } else {
            Self::Unknown
        }
    }
}

/// A resolved model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    name: String,
    kind: ModelKind,
}

impl Model {
    /// Create a model record
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ModelKind::from_name(&name);
        Self { name, kind }
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model kind
    pub const fn kind(&self) -> ModelKind {
        self.kind
    }
}

/// Loads models by name
pub trait ModelLoader: Send {
    /// Load a model, or `None` if it cannot be found
    fn load(&self, name: &str) -> Option<Model>;
}

/// Loader backed by a fixed list of known model names
///
/// Useful for tools that know the content list of a map without loading model data.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    names: HashSet<String>,
}

impl ModelCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model name
    pub fn add(&mut self, name: &str) -> &mut Self {
        self.names.insert(name.to_ascii_lowercase());
        self
    }

    /// Number of known models
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ModelCatalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for name in iter {
            catalog.add(name.as_ref());
        }
        catalog
    }
}

impl ModelLoader for ModelCatalog {
    fn load(&self, name: &str) -> Option<Model> {
        self.names
            .contains(&name.to_ascii_lowercase())
            .then(|| Model::new(name))
    }
}

/// Model loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),
}

/// Per-scene model cache
pub struct ModelManager {
    loader: Box<dyn ModelLoader>,
    // Names are case insensitive to account for differences in the filesystem
    models: HashMap<String, Arc<Model>>,
    fallback: Option<Arc<Model>>,
}

impl ModelManager {
    /// Create a manager around a loader
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            models: HashMap::new(),
            fallback: None,
        }
    }

    /// Load the model used in place of models that fail to load
    pub fn load_fallback(&mut self, name: &str) -> Result<(), AssetError> {
        let model = self.load(name).ok_or_else(|| AssetError::NotFound(name.to_string()))?;
        self.fallback = Some(model);
        Ok(())
    }

    /// Current fallback model
    pub const fn fallback(&self) -> Option<&Arc<Model>> {
        self.fallback.as_ref()
    }

    /// Whether a model is cached under this name
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(&name.to_ascii_lowercase())
    }

    /// Number of cached names
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Load a model by name
    ///
    /// Returns the cached model if present. Otherwise asks the loader; if the
    /// loader fails and a fallback is set, the fallback is cached under the
    /// requested name so the loader is not asked again.
    pub fn load(&mut self, name: &str) -> Option<Arc<Model>> {
        let key = name.to_ascii_lowercase();

        if let Some(model) = self.models.get(&key) {
            return Some(Arc::clone(model));
        }

        let model = match self.loader.load(name) {
            Some(model) => Arc::new(model),
            None => {
                let fallback = self.fallback.clone()?;
                log::warn!("Couldn't load model {}; using fallback {}", name, fallback.name());
                fallback
            }
        };

        self.models.insert(key, Arc::clone(&model));
        Some(model)
    }
}
