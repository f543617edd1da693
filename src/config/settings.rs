use super::ConfigError;
use crate::document::DEFAULT_NEW_NAME_PREFIX;
use crate::shared::{DefinitionKey, SchemaName};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_new_name_prefix() -> String {
    DEFAULT_NEW_NAME_PREFIX.to_string()
}

/// Where a file-backed viewer finds definitions and schemas and where it
/// stores completed documents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewerSettings {
    pub definitions_dir: PathBuf,
    pub schemas_dir: PathBuf,
    pub documents_dir: PathBuf,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(default = "default_new_name_prefix")]
    pub new_name_prefix: String,
}

impl ViewerSettings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut settings: ViewerSettings =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        if let Some(base) = path.parent() {
            settings.resolve_relative_to(base);
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, dir) in [
            ("definitions_dir", &self.definitions_dir),
            ("schemas_dir", &self.schemas_dir),
            ("documents_dir", &self.documents_dir),
        ] {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Settings(format!("`{key}` must be non-empty")));
            }
        }
        if self.new_name_prefix.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`new_name_prefix` must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Relative directories in a settings file are relative to that file.
    fn resolve_relative_to(&mut self, base: &Path) {
        for dir in [
            &mut self.definitions_dir,
            &mut self.schemas_dir,
            &mut self.documents_dir,
        ] {
            if dir.is_relative() && !dir.as_os_str().is_empty() {
                *dir = base.join(&*dir);
            }
        }
        if let Some(log_path) = self.log_path.as_mut() {
            if log_path.is_relative() {
                *log_path = base.join(&*log_path);
            }
        }
    }

    pub fn definition_path(&self, key: &DefinitionKey) -> PathBuf {
        self.definitions_dir
            .join(format!("{}.yaml", crate::shared::ids::slugify(key.as_str())))
    }

    pub fn schema_path(&self, schema: &SchemaName) -> PathBuf {
        self.schemas_dir.join(format!("{}.yaml", schema.slug()))
    }

    pub fn document_path(&self, schema: &SchemaName, name: &str) -> PathBuf {
        self.documents_dir
            .join(schema.slug())
            .join(format!("{}.json", urlencoding::encode(name)))
    }
}
