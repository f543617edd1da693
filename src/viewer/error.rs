use super::providers::ProviderError;
use crate::config::ConfigError;
use crate::generation::GenerationError;
use crate::shared::{DefinitionKey, SchemaName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerErrorKind {
    DefinitionMissing,
    DefinitionForbidden,
    CannotCreate,
    CannotEdit,
    DocumentMissing,
    DocumentForbidden,
    NoSlides,
    InvalidDescriptor,
    SaveFailed,
    Config,
}

impl ViewerErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewerErrorKind::DefinitionMissing => "definition-missing",
            ViewerErrorKind::DefinitionForbidden => "definition-forbidden",
            ViewerErrorKind::CannotCreate => "cannot-create",
            ViewerErrorKind::CannotEdit => "cannot-edit",
            ViewerErrorKind::DocumentMissing => "document-missing",
            ViewerErrorKind::DocumentForbidden => "document-forbidden",
            ViewerErrorKind::NoSlides => "no-slides",
            ViewerErrorKind::InvalidDescriptor => "invalid-descriptor",
            ViewerErrorKind::SaveFailed => "save-failed",
            ViewerErrorKind::Config => "config",
        }
    }

    /// Access and missing-data kinds. These become an error page when the
    /// user navigated to the wizard directly.
    pub fn shows_error_page(self) -> bool {
        matches!(
            self,
            ViewerErrorKind::DefinitionMissing
                | ViewerErrorKind::DefinitionForbidden
                | ViewerErrorKind::CannotCreate
                | ViewerErrorKind::CannotEdit
                | ViewerErrorKind::DocumentMissing
                | ViewerErrorKind::DocumentForbidden
                | ViewerErrorKind::NoSlides
        )
    }

    pub fn is_permission_denial(self) -> bool {
        matches!(
            self,
            ViewerErrorKind::DefinitionForbidden
                | ViewerErrorKind::CannotCreate
                | ViewerErrorKind::CannotEdit
                | ViewerErrorKind::DocumentForbidden
        )
    }
}

impl std::fmt::Display for ViewerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no slide view definition for `{key}`")]
    DefinitionMissing { key: DefinitionKey },
    #[error("not permitted to read slide view definition `{key}`")]
    DefinitionForbidden { key: DefinitionKey },
    #[error("not permitted to create {schema}")]
    CannotCreate { schema: SchemaName },
    #[error("not permitted to edit {schema}")]
    CannotEdit { schema: SchemaName },
    #[error("{schema} `{name}` does not exist")]
    DocumentMissing { schema: SchemaName, name: String },
    #[error("not permitted to read {schema} `{name}`")]
    DocumentForbidden { schema: SchemaName, name: String },
    #[error("slide view `{title}` has no slides")]
    NoSlides { title: String },
    #[error("invalid slide descriptor: {0}")]
    InvalidDescriptor(#[from] GenerationError),
    #[error("failed to save {schema} `{name}`: {reason}")]
    SaveFailed {
        schema: SchemaName,
        name: String,
        reason: String,
    },
    #[error("failed to load schema {schema}")]
    Schema {
        schema: SchemaName,
        #[source]
        source: ProviderError,
    },
    #[error("failed to load {schema} `{name}`")]
    DocumentFailed {
        schema: SchemaName,
        name: String,
        #[source]
        source: ProviderError,
    },
    #[error("failed to load definition `{key}`")]
    DefinitionFailed {
        key: DefinitionKey,
        #[source]
        source: ProviderError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ViewerError {
    pub fn kind(&self) -> ViewerErrorKind {
        match self {
            ViewerError::DefinitionMissing { .. } => ViewerErrorKind::DefinitionMissing,
            ViewerError::DefinitionForbidden { .. } => ViewerErrorKind::DefinitionForbidden,
            ViewerError::CannotCreate { .. } => ViewerErrorKind::CannotCreate,
            ViewerError::CannotEdit { .. } => ViewerErrorKind::CannotEdit,
            ViewerError::DocumentMissing { .. } => ViewerErrorKind::DocumentMissing,
            ViewerError::DocumentForbidden { .. } => ViewerErrorKind::DocumentForbidden,
            ViewerError::NoSlides { .. } => ViewerErrorKind::NoSlides,
            ViewerError::InvalidDescriptor(_) => ViewerErrorKind::InvalidDescriptor,
            ViewerError::SaveFailed { .. } => ViewerErrorKind::SaveFailed,
            ViewerError::Schema { .. }
            | ViewerError::DocumentFailed { .. }
            | ViewerError::DefinitionFailed { .. }
            | ViewerError::Config(_) => ViewerErrorKind::Config,
        }
    }
}

/// What a directly navigated session shows instead of the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub kind: ViewerErrorKind,
    pub title: String,
    pub message: String,
}

impl ErrorPage {
    pub fn from_error(error: &ViewerError) -> Self {
        let kind = error.kind();
        let title = if kind.is_permission_denial() {
            "Not Permitted"
        } else {
            "Not Found"
        };
        Self {
            kind,
            title: title.to_string(),
            message: error.to_string(),
        }
    }
}
