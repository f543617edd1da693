//! Collaborator contracts the viewer consumes.

use crate::config::SlideViewDefinition;
use crate::document::Document;
use crate::schema::Schema;
use crate::shared::{DefinitionKey, SchemaName};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("not found")]
    NotFound,
    #[error("permission denied")]
    Forbidden,
    #[error("{0}")]
    Failed(String),
}

pub trait SchemaProvider: Send + Sync {
    /// Loads the schema if needed and returns it.
    fn ensure_loaded(&self, name: &SchemaName) -> Result<Schema, ProviderError>;
}

pub trait DocumentProvider: Send + Sync {
    /// Record already held in the local cache, saved or not.
    fn local(&self, schema: &SchemaName, name: &str) -> Option<Document>;

    fn fetch(&self, schema: &SchemaName, name: &str) -> Result<Document, ProviderError>;

    fn create(&self, schema: &Schema, name: &str) -> Document {
        Document::new_local(schema, name)
    }
}

pub trait DefinitionProvider: Send + Sync {
    fn definition(&self, key: &DefinitionKey) -> Result<SlideViewDefinition, ProviderError>;
}

pub trait SaveCollaborator: Send + Sync {
    /// Persists `document` and returns it under its stored identity.
    fn save(&self, document: &Document) -> Result<Document, ProviderError>;
}

pub trait Permissions: Send + Sync {
    fn can_create(&self, schema: &SchemaName) -> bool;
    fn can_edit(&self, schema: &SchemaName) -> bool;
}

/// Grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Permissions for AllowAll {
    fn can_create(&self, _schema: &SchemaName) -> bool {
        true
    }

    fn can_edit(&self, _schema: &SchemaName) -> bool {
        true
    }
}
