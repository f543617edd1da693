use super::error::ViewerErrorKind;

/// Everything the document decision depends on, gathered up front so the
/// decision itself is a pure function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveFacts {
    pub is_single: bool,
    pub docname: Option<String>,
    /// The name follows the synthetic naming of never-saved records.
    pub name_is_new: bool,
    /// A record with this name is already in the local cache.
    pub resident: bool,
    pub can_create: bool,
    pub can_edit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentMode {
    /// Edit a saved record, fetching it unless it is resident.
    Edit { name: String, resident: bool },
    /// Keep editing an unsaved record from the local cache.
    EditLocals { name: String },
    /// Start a new record; `None` asks for a generated name.
    Create { name: Option<String> },
    Error(ViewerErrorKind),
}

impl DocumentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentMode::Edit { .. } => "edit",
            DocumentMode::EditLocals { .. } => "edit_locals",
            DocumentMode::Create { .. } => "create",
            DocumentMode::Error(_) => "error",
        }
    }
}

pub fn resolve_document_mode(facts: &ResolveFacts) -> DocumentMode {
    let wants_create = match (&facts.docname, facts.is_single) {
        (_, true) => false,
        (None, false) => true,
        (Some(_), false) => facts.name_is_new,
    };
    let needed = if wants_create {
        facts.can_create
    } else {
        facts.can_edit
    };
    if !needed {
        return DocumentMode::Error(if wants_create {
            ViewerErrorKind::CannotCreate
        } else {
            ViewerErrorKind::CannotEdit
        });
    }

    match (&facts.docname, facts.is_single, facts.name_is_new, facts.resident) {
        // Single-instance records are always edited under their own name;
        // the caller substitutes the schema name.
        (name, true, _, resident) => DocumentMode::Edit {
            name: name.clone().unwrap_or_default(),
            resident,
        },
        (None, false, _, _) => DocumentMode::Create { name: None },
        (Some(name), false, true, true) => DocumentMode::EditLocals { name: name.clone() },
        (Some(name), false, true, false) => DocumentMode::Create {
            name: Some(name.clone()),
        },
        (Some(name), false, false, resident) => DocumentMode::Edit {
            name: name.clone(),
            resident,
        },
    }
}
