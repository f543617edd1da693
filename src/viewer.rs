//! Resolves a definition and its document, then hosts one wizard session.

pub mod error;
pub mod files;
pub mod memory;
pub mod providers;
pub mod resolve;
pub mod route;

pub use error::{ErrorPage, ViewerError, ViewerErrorKind};
pub use files::FileBackend;
pub use memory::InMemoryBackend;
pub use providers::{
    AllowAll, DefinitionProvider, DocumentProvider, Permissions, ProviderError, SaveCollaborator,
    SchemaProvider,
};
pub use resolve::{resolve_document_mode, DocumentMode, ResolveFacts};
pub use route::{RouteError, SlideViewerRoute};

use crate::config::{ConfigError, SlideViewDefinition, ViewerSettings};
use crate::document::{generate_new_name, is_new_name, Document, ValueBag, DEFAULT_NEW_NAME_PREFIX};
use crate::expression::{DependsOnEvaluator, ExpressionEvaluator};
use crate::form::FormFactory;
use crate::generation::generate_slides;
use crate::schema::{Schema, NEW_NAME_FIELD};
use crate::shared::{DefinitionKey, SchemaName, SessionLog};
use crate::slides::sequencer::CompletionHandler;
use crate::slides::{
    FormScript, NavOutcome, SlideHooks, SlideViewerForm, Slides, SlidesError, SlidesOptions,
    ValidationTicket,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Fills the hosting page.
    Page,
    /// Modal on top of whatever the host shows.
    Dialog,
}

impl RenderTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderTarget::Page => "page",
            RenderTarget::Dialog => "dialog",
        }
    }
}

/// How the session was reached. Direct navigation turns access and
/// missing-data errors into an error page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Navigation {
    Direct,
    #[default]
    Programmatic,
}

#[derive(Debug, Clone)]
pub enum DefinitionSource {
    Inline(SlideViewDefinition),
    Key(DefinitionKey),
}

pub struct ViewerOptions {
    pub source: DefinitionSource,
    pub docname: Option<String>,
    pub starting_slide: usize,
    pub navigation: Navigation,
    pub with_form: bool,
    pub form_scripts: Vec<Box<dyn FormScript>>,
    pub hooks: BTreeMap<String, Arc<dyn SlideHooks>>,
    /// Replaces the default save-and-redirect completion.
    pub on_complete: Option<CompletionHandler>,
    pub evaluator: Arc<dyn ExpressionEvaluator>,
    pub form_factory: Option<FormFactory>,
}

impl ViewerOptions {
    fn with_source(source: DefinitionSource) -> Self {
        Self {
            source,
            docname: None,
            starting_slide: 0,
            navigation: Navigation::Programmatic,
            with_form: false,
            form_scripts: Vec::new(),
            hooks: BTreeMap::new(),
            on_complete: None,
            evaluator: Arc::new(DependsOnEvaluator),
            form_factory: None,
        }
    }

    pub fn inline(definition: SlideViewDefinition) -> Self {
        Self::with_source(DefinitionSource::Inline(definition))
    }

    pub fn for_key(key: DefinitionKey) -> Self {
        Self::with_source(DefinitionSource::Key(key))
    }

    /// Options for a session the user navigated to.
    pub fn from_route(route: &SlideViewerRoute) -> Self {
        let mut options = Self::for_key(route.key.clone());
        options.docname = route.docname.clone();
        options.starting_slide = route.starting_slide;
        options.navigation = Navigation::Direct;
        options
    }

    pub fn with_docname(mut self, docname: impl Into<String>) -> Self {
        self.docname = Some(docname.into());
        self
    }

    pub fn starting_at(mut self, slide: usize) -> Self {
        self.starting_slide = slide;
        self
    }

    pub fn with_navigation(mut self, navigation: Navigation) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn with_hooks(mut self, slide: impl Into<String>, hooks: Arc<dyn SlideHooks>) -> Self {
        self.hooks.insert(slide.into(), hooks);
        self
    }

    pub fn with_form(mut self, scripts: Vec<Box<dyn FormScript>>) -> Self {
        self.with_form = true;
        self.form_scripts = scripts;
        self
    }

    pub fn on_complete<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&ValueBag) + Send + 'static,
    {
        self.on_complete = Some(Box::new(handler));
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_form_factory(mut self, factory: FormFactory) -> Self {
        self.form_factory = Some(factory);
        self
    }
}

pub enum Rendered {
    Session(Box<ViewerSession>),
    ErrorPage(ErrorPage),
}

impl Rendered {
    pub fn session(self) -> Option<ViewerSession> {
        match self {
            Rendered::Session(session) => Some(*session),
            Rendered::ErrorPage(_) => None,
        }
    }

    pub fn error_page(&self) -> Option<&ErrorPage> {
        match self {
            Rendered::Session(_) => None,
            Rendered::ErrorPage(page) => Some(page),
        }
    }
}

pub struct SlideViewer {
    definitions: Arc<dyn DefinitionProvider>,
    schemas: Arc<dyn SchemaProvider>,
    documents: Arc<dyn DocumentProvider>,
    saver: Arc<dyn SaveCollaborator>,
    permissions: Arc<dyn Permissions>,
    log: SessionLog,
    new_name_prefix: String,
}

impl SlideViewer {
    /// Viewer whose collaborators are all served by one backend.
    pub fn new<B>(backend: Arc<B>) -> Self
    where
        B: DefinitionProvider
            + SchemaProvider
            + DocumentProvider
            + SaveCollaborator
            + Permissions
            + 'static,
    {
        Self {
            definitions: backend.clone(),
            schemas: backend.clone(),
            documents: backend.clone(),
            saver: backend.clone(),
            permissions: backend,
            log: SessionLog::disabled(),
            new_name_prefix: DEFAULT_NEW_NAME_PREFIX.to_string(),
        }
    }

    pub fn from_settings(settings: &ViewerSettings) -> Self {
        let log = settings
            .log_path
            .as_ref()
            .map(|path| SessionLog::to_path(path.clone()))
            .unwrap_or_else(SessionLog::disabled);
        Self::new(Arc::new(FileBackend::new(settings.clone())))
            .with_log(log)
            .with_new_name_prefix(&settings.new_name_prefix)
    }

    pub fn with_log(mut self, log: SessionLog) -> Self {
        self.log = log;
        self
    }

    pub fn with_new_name_prefix(mut self, prefix: &str) -> Self {
        self.new_name_prefix = prefix.to_string();
        self
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn Permissions>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn render_in_wrapper(&self, options: ViewerOptions) -> Result<Rendered, ViewerError> {
        self.render(options, RenderTarget::Page)
    }

    pub fn render_in_dialog(&self, options: ViewerOptions) -> Result<Rendered, ViewerError> {
        self.render(options, RenderTarget::Dialog)
    }

    fn render(&self, options: ViewerOptions, target: RenderTarget) -> Result<Rendered, ViewerError> {
        let navigation = options.navigation;
        match self.prepare(options, target) {
            Ok(session) => Ok(Rendered::Session(Box::new(session))),
            Err(err) if navigation == Navigation::Direct && err.kind().shows_error_page() => {
                self.log.warn("viewer.error_page", &err.to_string());
                Ok(Rendered::ErrorPage(ErrorPage::from_error(&err)))
            }
            Err(err) => {
                self.log.error("viewer.render_failed", &err.to_string());
                Err(err)
            }
        }
    }

    fn load_definition(&self, source: DefinitionSource) -> Result<SlideViewDefinition, ViewerError> {
        match source {
            DefinitionSource::Inline(definition) => {
                definition.validate()?;
                Ok(definition)
            }
            DefinitionSource::Key(key) => match self.definitions.definition(&key) {
                Ok(definition) => Ok(definition),
                Err(ProviderError::NotFound) => Err(ViewerError::DefinitionMissing { key }),
                Err(ProviderError::Forbidden) => Err(ViewerError::DefinitionForbidden { key }),
                Err(source) => Err(ViewerError::DefinitionFailed { key, source }),
            },
        }
    }

    fn fetch_document(&self, schema: &Schema, name: &str) -> Result<Document, ViewerError> {
        match self.documents.fetch(&schema.name, name) {
            Ok(document) => Ok(document),
            // Single-instance records exist implicitly.
            Err(ProviderError::NotFound) if schema.is_single() => {
                let mut document = self.documents.create(schema, name);
                document.is_local = false;
                Ok(document)
            }
            Err(ProviderError::NotFound) => Err(ViewerError::DocumentMissing {
                schema: schema.name.clone(),
                name: name.to_string(),
            }),
            Err(ProviderError::Forbidden) => Err(ViewerError::DocumentForbidden {
                schema: schema.name.clone(),
                name: name.to_string(),
            }),
            Err(source) => Err(ViewerError::DocumentFailed {
                schema: schema.name.clone(),
                name: name.to_string(),
                source,
            }),
        }
    }

    fn resolve_document(
        &self,
        definition: &SlideViewDefinition,
        schema: &Schema,
        docname: Option<String>,
    ) -> Result<(DocumentMode, Document), ViewerError> {
        let docname = if schema.is_single() {
            Some(schema.name.to_string())
        } else {
            docname.filter(|name| !name.trim().is_empty())
        };
        let facts = ResolveFacts {
            is_single: schema.is_single(),
            name_is_new: docname
                .as_deref()
                .is_some_and(|name| is_new_name(name, &self.new_name_prefix)),
            resident: docname
                .as_deref()
                .is_some_and(|name| self.documents.local(&schema.name, name).is_some()),
            docname,
            can_create: definition.can_create_doc && self.permissions.can_create(&schema.name),
            can_edit: definition.can_edit_doc && self.permissions.can_edit(&schema.name),
        };
        let mode = resolve_document_mode(&facts);
        let document = match &mode {
            DocumentMode::Error(ViewerErrorKind::CannotCreate) => {
                return Err(ViewerError::CannotCreate {
                    schema: schema.name.clone(),
                })
            }
            DocumentMode::Error(_) => {
                return Err(ViewerError::CannotEdit {
                    schema: schema.name.clone(),
                })
            }
            DocumentMode::Edit { name, resident: true } => self
                .documents
                .local(&schema.name, name)
                .ok_or_else(|| ViewerError::DocumentMissing {
                    schema: schema.name.clone(),
                    name: name.clone(),
                })?,
            DocumentMode::Edit { name, resident: false } => self.fetch_document(schema, name)?,
            DocumentMode::EditLocals { name } => self
                .documents
                .local(&schema.name, name)
                .ok_or_else(|| ViewerError::DocumentMissing {
                    schema: schema.name.clone(),
                    name: name.clone(),
                })?,
            DocumentMode::Create { name } => {
                let name = match name {
                    Some(name) => name.clone(),
                    None => generate_new_name(&schema.name, &self.new_name_prefix)
                        .map_err(|reason| ViewerError::Config(ConfigError::Settings(reason)))?,
                };
                self.documents.create(schema, &name)
            }
        };
        Ok((mode, document))
    }

    fn prepare(&self, options: ViewerOptions, target: RenderTarget) -> Result<ViewerSession, ViewerError> {
        let ViewerOptions {
            source,
            docname,
            starting_slide,
            navigation: _,
            with_form,
            form_scripts,
            hooks,
            on_complete,
            evaluator,
            form_factory,
        } = options;

        let definition = self.load_definition(source)?;
        let schema = match definition.reference_doctype.as_ref() {
            Some(name) => Some(
                self.schemas
                    .ensure_loaded(name)
                    .map_err(|source| ViewerError::Schema {
                        schema: name.clone(),
                        source,
                    })?,
            ),
            None => None,
        };

        let (mode, bag) = match schema.as_ref() {
            Some(schema) => {
                let (mode, document) = self.resolve_document(&definition, schema, docname)?;
                (Some(mode), ValueBag::Document(document))
            }
            None => (None, ValueBag::transient()),
        };
        let prompt_for_name = matches!(
            mode,
            Some(DocumentMode::Create { .. } | DocumentMode::EditLocals { .. })
        ) && schema
            .as_ref()
            .is_some_and(|schema| !schema.is_single() && schema.requires_user_name());

        let descriptors = generate_slides(&definition, schema.as_ref(), prompt_for_name)?;
        if descriptors.is_empty() {
            return Err(ViewerError::NoSlides {
                title: definition.title.clone(),
            });
        }

        let session_log = self
            .log
            .clone()
            .with_session_id(format!("{}:{}", target.as_str(), definition.title));
        let slide_options = SlidesOptions {
            starting_slide,
            unidirectional: !definition.allow_any,
            unidirectional_allow_back: definition.allow_back,
            clickable_progress_dots: definition.allow_any,
            done_state: definition.done_state,
            hooks,
            evaluator,
            form_factory,
            log: session_log.clone(),
        };
        // Construction only fails on an empty slide list, checked above.
        let mut slides = Slides::new(descriptors, bag, slide_options).map_err(|_| {
            ViewerError::NoSlides {
                title: definition.title.clone(),
            }
        })?;
        let custom_completion = on_complete.is_some();
        if let Some(handler) = on_complete {
            slides.set_on_complete(handler);
        }
        let wizard = if with_form {
            Wizard::Form(Box::new(SlideViewerForm::new(slides, form_scripts)))
        } else {
            Wizard::Plain(slides)
        };

        session_log.info(
            "viewer.rendered",
            &format!(
                "target={} mode={}",
                target.as_str(),
                mode.as_ref().map(DocumentMode::as_str).unwrap_or("transient")
            ),
        );
        Ok(ViewerSession {
            definition,
            target,
            schema,
            mode,
            wizard,
            saver: self.saver.clone(),
            custom_completion,
            completion: None,
            log: session_log,
        })
    }
}

enum Wizard {
    Plain(Slides),
    Form(Box<SlideViewerForm>),
}

impl Wizard {
    fn slides(&self) -> &Slides {
        match self {
            Wizard::Plain(slides) => slides,
            Wizard::Form(form) => form.slides(),
        }
    }

    fn slides_mut(&mut self) -> &mut Slides {
        match self {
            Wizard::Plain(slides) => slides,
            Wizard::Form(form) => form.slides_mut(),
        }
    }
}

#[derive(Debug)]
pub enum CompletionStatus {
    /// A custom handler ran, or there was no document to save.
    Handled,
    Saved { name: String, route: String },
    SaveFailed(ViewerError),
}

/// One rendered wizard and the collaborators it completes through.
pub struct ViewerSession {
    definition: SlideViewDefinition,
    target: RenderTarget,
    schema: Option<Schema>,
    mode: Option<DocumentMode>,
    wizard: Wizard,
    saver: Arc<dyn SaveCollaborator>,
    custom_completion: bool,
    completion: Option<CompletionStatus>,
    log: SessionLog,
}

impl ViewerSession {
    pub fn definition(&self) -> &SlideViewDefinition {
        &self.definition
    }

    pub fn title(&self) -> &str {
        &self.definition.title
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn document_mode(&self) -> Option<&DocumentMode> {
        self.mode.as_ref()
    }

    pub fn slides(&self) -> &Slides {
        self.wizard.slides()
    }

    pub fn slides_mut(&mut self) -> &mut Slides {
        self.wizard.slides_mut()
    }

    pub fn form(&self) -> Option<&SlideViewerForm> {
        match &self.wizard {
            Wizard::Form(form) => Some(form.as_ref()),
            Wizard::Plain(_) => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut SlideViewerForm> {
        match &mut self.wizard {
            Wizard::Form(form) => Some(form.as_mut()),
            Wizard::Plain(_) => None,
        }
    }

    pub fn completion(&self) -> Option<&CompletionStatus> {
        self.completion.as_ref()
    }

    /// Route of the bound document's full edit form, when the definition
    /// offers that link.
    pub fn fullpage_edit_route(&self) -> Option<String> {
        if !self.definition.add_fullpage_edit_btn {
            return None;
        }
        self.slides().bag().document().map(Document::form_route)
    }

    pub fn next(&mut self) -> Result<NavOutcome, SlidesError> {
        let outcome = self.slides_mut().next();
        self.after_navigation(outcome)
    }

    pub fn prev(&mut self) -> Result<NavOutcome, SlidesError> {
        self.slides_mut().prev()
    }

    pub fn jump_to(&mut self, slide: usize) -> Result<NavOutcome, SlidesError> {
        let outcome = self.slides_mut().jump_to(slide);
        self.after_navigation(outcome)
    }

    pub fn complete(&mut self) -> Result<NavOutcome, SlidesError> {
        let outcome = self.slides_mut().complete();
        self.after_navigation(outcome)
    }

    pub fn resolve_validation(
        &mut self,
        ticket: ValidationTicket,
        passed: bool,
    ) -> Result<NavOutcome, SlidesError> {
        let outcome = self.slides_mut().resolve_validation(ticket, passed);
        self.after_navigation(outcome)
    }

    pub fn set_value(&mut self, fieldname: &str, value: Value) -> Result<(), SlidesError> {
        match &mut self.wizard {
            Wizard::Form(form) => form.set_value(fieldname, value),
            Wizard::Plain(slides) => slides.set_value(fieldname, value),
        }
    }

    pub fn add_more_entry(&mut self) -> Result<usize, SlidesError> {
        self.slides_mut().add_more_entry()
    }

    pub fn hide(&mut self) {
        self.slides_mut().hide();
    }

    pub fn show(&mut self) {
        self.slides_mut().show();
    }

    pub fn dispose(&mut self) {
        self.slides_mut().dispose();
    }

    fn after_navigation(
        &mut self,
        outcome: Result<NavOutcome, SlidesError>,
    ) -> Result<NavOutcome, SlidesError> {
        if matches!(outcome, Ok(NavOutcome::Completed(_))) {
            let status = self.finish();
            self.completion = Some(status);
        }
        outcome
    }

    fn finish(&mut self) -> CompletionStatus {
        if self.custom_completion || !self.slides().bag().is_doc() {
            return CompletionStatus::Handled;
        }
        if let Wizard::Form(form) = &mut self.wizard {
            if let Err(failures) = form.validate() {
                return self.save_failed(failures.join("; "));
            }
            if let Err(reason) = form.before_save() {
                return self.save_failed(reason);
            }
        }
        let Some(mut document) = self.slides().bag().document().cloned() else {
            return CompletionStatus::Handled;
        };
        if let Some(Value::String(name)) = document.values.remove(NEW_NAME_FIELD) {
            if !name.trim().is_empty() {
                document.name = name.trim().to_string();
            }
        }
        match self.saver.save(&document) {
            Ok(saved) => {
                let route = saved.form_route();
                self.log
                    .info("viewer.saved", &format!("{} `{}` -> {route}", saved.doctype, saved.name));
                if let Wizard::Form(form) = &mut self.wizard {
                    form.after_save();
                }
                CompletionStatus::Saved {
                    name: saved.name,
                    route,
                }
            }
            Err(err) => self.save_failed(err.to_string()),
        }
    }

    fn save_failed(&self, reason: String) -> CompletionStatus {
        let (schema, name) = self
            .slides()
            .bag()
            .document()
            .map(|doc| (doc.doctype.clone(), doc.name.clone()))
            .unwrap_or_else(|| (SchemaName::from_trusted("-"), String::new()));
        let err = ViewerError::SaveFailed {
            schema,
            name,
            reason,
        };
        self.log.error("viewer.save_failed", &err.to_string());
        CompletionStatus::SaveFailed(err)
    }
}
