use super::providers::{
    DefinitionProvider, DocumentProvider, Permissions, ProviderError, SaveCollaborator,
    SchemaProvider,
};
use crate::config::{ConfigError, SlideViewDefinition, ViewerSettings};
use crate::document::Document;
use crate::schema::Schema;
use crate::shared::{atomic_write_file, DefinitionKey, SchemaName};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Collaborators over the directories named in `ViewerSettings`.
///
/// Nothing is resident locally: every existing record is read from disk.
#[derive(Debug, Clone)]
pub struct FileBackend {
    settings: ViewerSettings,
}

impl FileBackend {
    pub fn new(settings: ViewerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }
}

fn config_failure(err: ConfigError) -> ProviderError {
    match &err {
        ConfigError::Read { source, .. } if source.kind() == ErrorKind::NotFound => {
            ProviderError::NotFound
        }
        ConfigError::Read { source, .. } if source.kind() == ErrorKind::PermissionDenied => {
            ProviderError::Forbidden
        }
        _ => ProviderError::Failed(err.to_string()),
    }
}

fn read_document(path: &Path) -> Result<Document, ProviderError> {
    let raw = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ProviderError::NotFound,
        ErrorKind::PermissionDenied => ProviderError::Forbidden,
        _ => ProviderError::Failed(format!("failed to read {}: {err}", path.display())),
    })?;
    serde_json::from_str(&raw)
        .map_err(|err| ProviderError::Failed(format!("failed to parse {}: {err}", path.display())))
}

impl SchemaProvider for FileBackend {
    fn ensure_loaded(&self, name: &SchemaName) -> Result<Schema, ProviderError> {
        Schema::from_path(&self.settings.schema_path(name)).map_err(config_failure)
    }
}

impl DocumentProvider for FileBackend {
    fn local(&self, _schema: &SchemaName, _name: &str) -> Option<Document> {
        None
    }

    fn fetch(&self, schema: &SchemaName, name: &str) -> Result<Document, ProviderError> {
        read_document(&self.settings.document_path(schema, name))
    }
}

impl DefinitionProvider for FileBackend {
    fn definition(&self, key: &DefinitionKey) -> Result<SlideViewDefinition, ProviderError> {
        let mut definition = SlideViewDefinition::from_path(&self.settings.definition_path(key))
            .map_err(config_failure)?;
        if definition.route.is_none() {
            definition.route = Some(key.clone());
        }
        Ok(definition)
    }
}

impl SaveCollaborator for FileBackend {
    fn save(&self, document: &Document) -> Result<Document, ProviderError> {
        let mut saved = document.clone();
        saved.is_local = false;
        let path = self.settings.document_path(&saved.doctype, &saved.name);
        let body = serde_json::to_vec_pretty(&saved)
            .map_err(|err| ProviderError::Failed(format!("failed to encode document: {err}")))?;
        atomic_write_file(&path, &body)
            .map_err(|err| ProviderError::Failed(format!("failed to write {}: {err}", path.display())))?;
        Ok(saved)
    }
}

impl Permissions for FileBackend {
    fn can_create(&self, _schema: &SchemaName) -> bool {
        true
    }

    fn can_edit(&self, _schema: &SchemaName) -> bool {
        true
    }
}
