//! Registry of accepted generation models.
//!
//! Each model is a named config file handed to the generation script. The
//! registry is usually discovered from a directory of `*.py` config files,
//! where the file stem is the model name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{GeneratorError, GeneratorResult};

/// Extension of model config files.
const CONFIG_EXTENSION: &str = "py";

/// A model the registry accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub name: String,
    pub config_path: PathBuf,
}

/// Fixed set of named generation configurations.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, PathBuf>,
}

impl ModelRegistry {
    /// Build a registry from explicit `(name, config path)` pairs.
    pub fn from_entries<I, S, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            models: entries
                .into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
        }
    }

    /// Discover models from the `*.py` files in `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> GeneratorResult<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|_| GeneratorError::RegistryUnavailable(dir.to_path_buf()))?;

        let mut models = BTreeMap::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_config = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == CONFIG_EXTENSION);
            if !is_config {
                continue;
            }
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                debug!(model = %name, config = %path.display(), "Registered model config");
                models.insert(name.to_string(), path.clone());
            }
        }

        info!("Discovered {} model configs in {}", models.len(), dir.display());
        Ok(Self { models })
    }

    /// Look up a model by name.
    pub fn resolve(&self, name: &str) -> GeneratorResult<ResolvedModel> {
        self.models
            .get(name)
            .map(|path| ResolvedModel {
                name: name.to_string(),
                config_path: path.clone(),
            })
            .ok_or_else(|| GeneratorError::unknown_model(name, self.names()))
    }

    /// Accepted model names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_py_configs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("opensora-v1-2.py"), "resolution = '360p'").unwrap();
        std::fs::write(dir.path().join("lambda-720p.py"), "resolution = '720p'").unwrap();
        std::fs::write(dir.path().join("README.md"), "not a config").unwrap();
        std::fs::create_dir(dir.path().join("nested.py")).unwrap();

        let registry = ModelRegistry::discover(dir.path()).unwrap();
        assert_eq!(registry.names(), vec!["lambda-720p", "opensora-v1-2"]);

        let resolved = registry.resolve("opensora-v1-2").unwrap();
        assert_eq!(resolved.config_path, dir.path().join("opensora-v1-2.py"));
    }

    #[test]
    fn test_resolve_unknown_model() {
        let registry = ModelRegistry::from_entries([("opensora-v1-2", "/configs/opensora-v1-2.py")]);
        match registry.resolve("unknown-model") {
            Err(GeneratorError::UnknownModel { model, accepted }) => {
                assert_eq!(model, "unknown-model");
                assert_eq!(accepted, vec!["opensora-v1-2".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_directory() {
        let result = ModelRegistry::discover("/definitely/not/here");
        assert!(matches!(result, Err(GeneratorError::RegistryUnavailable(_))));
    }
}
