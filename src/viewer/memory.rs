use super::providers::{
    DefinitionProvider, DocumentProvider, Permissions, ProviderError, SaveCollaborator,
    SchemaProvider,
};
use crate::config::SlideViewDefinition;
use crate::document::Document;
use crate::schema::Schema;
use crate::shared::{DefinitionKey, SchemaName};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    schemas: BTreeMap<SchemaName, Schema>,
    definitions: BTreeMap<DefinitionKey, SlideViewDefinition>,
    forbidden_definitions: BTreeSet<DefinitionKey>,
    /// Saved records, as the store knows them.
    stored: BTreeMap<(SchemaName, String), Document>,
    /// Records resident in the local cache, including unsaved ones.
    cached: BTreeMap<(SchemaName, String), Document>,
    forbidden_documents: BTreeSet<(SchemaName, String)>,
    no_create: BTreeSet<SchemaName>,
    no_edit: BTreeSet<SchemaName>,
    fail_saves: Option<String>,
    saves: Vec<Document>,
}

/// Every collaborator backed by maps, for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn with_schema(self, schema: Schema) -> Self {
        self.state().schemas.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_definition(self, key: DefinitionKey, definition: SlideViewDefinition) -> Self {
        self.state().definitions.insert(key, definition);
        self
    }

    pub fn with_stored(self, document: Document) -> Self {
        self.state()
            .stored
            .insert((document.doctype.clone(), document.name.clone()), document);
        self
    }

    pub fn with_cached(self, document: Document) -> Self {
        self.state()
            .cached
            .insert((document.doctype.clone(), document.name.clone()), document);
        self
    }

    pub fn forbid_definition(self, key: DefinitionKey) -> Self {
        self.state().forbidden_definitions.insert(key);
        self
    }

    pub fn forbid_document(self, schema: SchemaName, name: &str) -> Self {
        self.state()
            .forbidden_documents
            .insert((schema, name.to_string()));
        self
    }

    pub fn deny_create(self, schema: SchemaName) -> Self {
        self.state().no_create.insert(schema);
        self
    }

    pub fn deny_edit(self, schema: SchemaName) -> Self {
        self.state().no_edit.insert(schema);
        self
    }

    pub fn fail_saves(self, reason: &str) -> Self {
        self.state().fail_saves = Some(reason.to_string());
        self
    }

    /// Documents passed to `save`, oldest first.
    pub fn saves(&self) -> Vec<Document> {
        self.state().saves.clone()
    }

    pub fn stored(&self, schema: &SchemaName, name: &str) -> Option<Document> {
        self.state()
            .stored
            .get(&(schema.clone(), name.to_string()))
            .cloned()
    }
}

impl SchemaProvider for InMemoryBackend {
    fn ensure_loaded(&self, name: &SchemaName) -> Result<Schema, ProviderError> {
        self.state()
            .schemas
            .get(name)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }
}

impl DocumentProvider for InMemoryBackend {
    fn local(&self, schema: &SchemaName, name: &str) -> Option<Document> {
        self.state()
            .cached
            .get(&(schema.clone(), name.to_string()))
            .cloned()
    }

    fn fetch(&self, schema: &SchemaName, name: &str) -> Result<Document, ProviderError> {
        let state = self.state();
        let key = (schema.clone(), name.to_string());
        if state.forbidden_documents.contains(&key) {
            return Err(ProviderError::Forbidden);
        }
        state.stored.get(&key).cloned().ok_or(ProviderError::NotFound)
    }
}

impl DefinitionProvider for InMemoryBackend {
    fn definition(&self, key: &DefinitionKey) -> Result<SlideViewDefinition, ProviderError> {
        let state = self.state();
        if state.forbidden_definitions.contains(key) {
            return Err(ProviderError::Forbidden);
        }
        state
            .definitions
            .get(key)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }
}

impl SaveCollaborator for InMemoryBackend {
    fn save(&self, document: &Document) -> Result<Document, ProviderError> {
        let mut state = self.state();
        state.saves.push(document.clone());
        if let Some(reason) = state.fail_saves.clone() {
            return Err(ProviderError::Failed(reason));
        }
        let mut saved = document.clone();
        saved.is_local = false;
        let key = (saved.doctype.clone(), saved.name.clone());
        state.cached.insert(key.clone(), saved.clone());
        state.stored.insert(key, saved.clone());
        Ok(saved)
    }
}

impl Permissions for InMemoryBackend {
    fn can_create(&self, schema: &SchemaName) -> bool {
        !self.state().no_create.contains(schema)
    }

    fn can_edit(&self, schema: &SchemaName) -> bool {
        !self.state().no_edit.contains(schema)
    }
}
