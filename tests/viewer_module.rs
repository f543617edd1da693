use serde_json::{json, Map};
use slideview::config::{SlideGroupSpec, SlideViewDefinition};
use slideview::document::Document;
use slideview::schema::{Schema, NEW_NAME_FIELD};
use slideview::shared::{DefinitionKey, SchemaName};
use slideview::slides::{FormHandle, FormScript, NavOutcome};
use slideview::viewer::{
    CompletionStatus, DocumentMode, InMemoryBackend, Navigation, RenderTarget, SlideViewer,
    SlideViewerRoute, ViewerErrorKind, ViewerOptions,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn lead_schema() -> Schema {
    serde_yaml::from_str(
        r#"
name: Lead
autoname: prompt
fields:
  - {fieldname: lead_name, fieldtype: Data, reqd: 1}
  - {fieldname: contact, fieldtype: Section Break, label: Contact}
  - {fieldname: email, fieldtype: Data}
"#,
    )
    .expect("schema")
}

fn lead() -> SchemaName {
    SchemaName::parse("Lead").expect("schema name")
}

fn key() -> DefinitionKey {
    DefinitionKey::parse("lead-intake").expect("key")
}

fn intake() -> SlideViewDefinition {
    SlideViewDefinition::new("Lead Intake").with_reference_doctype(lead())
}

fn backend() -> InMemoryBackend {
    InMemoryBackend::new()
        .with_schema(lead_schema())
        .with_definition(key(), intake())
}

fn stored_lead(name: &str) -> Document {
    let mut values = Map::new();
    values.insert("lead_name".to_string(), json!("Old Name"));
    Document::existing(lead(), name, values)
}

#[test]
fn viewer_module_missing_definition_is_a_page_only_for_direct_navigation() {
    let viewer = SlideViewer::new(Arc::new(InMemoryBackend::new()));

    let rendered = viewer
        .render_in_wrapper(ViewerOptions::for_key(key()).with_navigation(Navigation::Direct))
        .expect("error page");
    let page = rendered.error_page().expect("page");
    assert_eq!(page.kind, ViewerErrorKind::DefinitionMissing);
    assert_eq!(page.title, "Not Found");

    let err = match viewer.render_in_wrapper(ViewerOptions::for_key(key())) {
        Ok(_) => panic!("programmatic render must fail"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ViewerErrorKind::DefinitionMissing);
}

#[test]
fn viewer_module_forbidden_definition_shows_not_permitted() {
    let viewer = SlideViewer::new(Arc::new(backend().forbid_definition(key())));
    let rendered = viewer
        .render_in_wrapper(ViewerOptions::for_key(key()).with_navigation(Navigation::Direct))
        .expect("error page");
    let page = rendered.error_page().expect("page");
    assert_eq!(page.kind, ViewerErrorKind::DefinitionForbidden);
    assert_eq!(page.title, "Not Permitted");
}

#[test]
fn viewer_module_create_without_permission_is_refused() {
    let viewer = SlideViewer::new(Arc::new(backend().deny_create(lead())));
    let rendered = viewer
        .render_in_wrapper(ViewerOptions::for_key(key()).with_navigation(Navigation::Direct))
        .expect("error page");
    assert_eq!(
        rendered.error_page().map(|page| page.kind),
        Some(ViewerErrorKind::CannotCreate)
    );
}

#[test]
fn viewer_module_edit_without_permission_is_refused() {
    let viewer = SlideViewer::new(Arc::new(
        backend().with_stored(stored_lead("LEAD-1")).deny_edit(lead()),
    ));
    let err = match viewer.render_in_wrapper(ViewerOptions::for_key(key()).with_docname("LEAD-1")) {
        Ok(_) => panic!("edit must be refused"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ViewerErrorKind::CannotEdit);
}

#[test]
fn viewer_module_unknown_document_is_not_found() {
    let viewer = SlideViewer::new(Arc::new(backend()));
    let rendered = viewer
        .render_in_wrapper(
            ViewerOptions::for_key(key())
                .with_docname("LEAD-404")
                .with_navigation(Navigation::Direct),
        )
        .expect("error page");
    assert_eq!(
        rendered.error_page().map(|page| page.kind),
        Some(ViewerErrorKind::DocumentMissing)
    );
}

#[test]
fn viewer_module_forbidden_document_is_not_permitted() {
    let viewer = SlideViewer::new(Arc::new(
        backend()
            .with_stored(stored_lead("LEAD-1"))
            .forbid_document(lead(), "LEAD-1"),
    ));
    let rendered = viewer
        .render_in_wrapper(
            ViewerOptions::for_key(key())
                .with_docname("LEAD-1")
                .with_navigation(Navigation::Direct),
        )
        .expect("error page");
    let page = rendered.error_page().expect("page");
    assert_eq!(page.kind, ViewerErrorKind::DocumentForbidden);
    assert_eq!(page.title, "Not Permitted");
}

#[test]
fn viewer_module_rest_group_without_schema_is_invalid_even_when_direct() {
    let definition =
        SlideViewDefinition::new("Broken").with_slides(vec![SlideGroupSpec::Rest]);
    let viewer = SlideViewer::new(Arc::new(InMemoryBackend::new()));
    let err = match viewer.render_in_wrapper(
        ViewerOptions::inline(definition).with_navigation(Navigation::Direct),
    ) {
        Ok(_) => panic!("invalid descriptor must surface as an error"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ViewerErrorKind::InvalidDescriptor);
    assert_eq!(err.kind().as_str(), "invalid-descriptor");
}

#[test]
fn viewer_module_definition_without_slides_or_schema_has_no_slides() {
    let viewer = SlideViewer::new(Arc::new(InMemoryBackend::new()));
    let rendered = viewer
        .render_in_wrapper(
            ViewerOptions::inline(SlideViewDefinition::new("Empty"))
                .with_navigation(Navigation::Direct),
        )
        .expect("error page");
    assert_eq!(
        rendered.error_page().map(|page| page.kind),
        Some(ViewerErrorKind::NoSlides)
    );
}

#[test]
fn viewer_module_create_flow_saves_under_the_entered_name() {
    let backend = Arc::new(backend());
    let viewer = SlideViewer::new(backend.clone());
    let mut session = viewer
        .render_in_wrapper(ViewerOptions::for_key(key()))
        .expect("render")
        .session()
        .expect("session");

    assert_eq!(session.target(), RenderTarget::Page);
    assert!(matches!(
        session.document_mode(),
        Some(DocumentMode::Create { name: None })
    ));
    assert!(session.slides().is_unidirectional());
    let first_fields: Vec<String> = session
        .slides()
        .current_slide()
        .descriptor()
        .fields
        .iter()
        .map(|field| field.fieldname.to_string())
        .collect();
    assert_eq!(first_fields, vec![NEW_NAME_FIELD.to_string(), "lead_name".to_string()]);

    session.set_value(NEW_NAME_FIELD, json!("ACME")).expect("name");
    session.set_value("lead_name", json!("Ada")).expect("lead name");
    assert_eq!(
        session.next().expect("next"),
        NavOutcome::Moved { from: 0, to: 1 }
    );
    session.set_value("email", json!("ada@example.com")).expect("email");
    assert!(matches!(session.next().expect("finish"), NavOutcome::Completed(_)));

    match session.completion() {
        Some(CompletionStatus::Saved { name, route }) => {
            assert_eq!(name, "ACME");
            assert_eq!(route, "app/lead/ACME");
        }
        other => panic!("expected a save, got {other:?}"),
    }
    let saved = backend.stored(&lead(), "ACME").expect("stored");
    assert_eq!(saved.get("email"), Some(&json!("ada@example.com")));
    assert_eq!(saved.get(NEW_NAME_FIELD), None);
    assert!(!saved.is_local);
}

#[test]
fn viewer_module_edit_flow_loads_stored_values_and_offers_fullpage_link() {
    let mut definition = intake();
    definition.add_fullpage_edit_btn = true;
    let backend = Arc::new(
        backend()
            .with_definition(key(), definition)
            .with_stored(stored_lead("LEAD-1")),
    );
    let viewer = SlideViewer::new(backend.clone());
    let session = viewer
        .render_in_wrapper(ViewerOptions::for_key(key()).with_docname("LEAD-1"))
        .expect("render")
        .session()
        .expect("session");

    assert_eq!(
        session.document_mode(),
        Some(&DocumentMode::Edit {
            name: "LEAD-1".to_string(),
            resident: false
        })
    );
    let form = session.slides().current_slide().form().expect("form");
    assert_eq!(form.get_value("lead_name"), Some(&json!("Old Name")));
    assert!(!session
        .slides()
        .current_slide()
        .owns_field(NEW_NAME_FIELD));
    assert_eq!(
        session.fullpage_edit_route().as_deref(),
        Some("app/lead/LEAD-1")
    );
}

#[test]
fn viewer_module_unsaved_cached_record_keeps_editing_locally() {
    let mut values = Map::new();
    values.insert("lead_name".to_string(), json!("Draft"));
    let mut draft = Document::existing(lead(), "new-lead-abc123", values);
    draft.is_local = true;
    let viewer = SlideViewer::new(Arc::new(backend().with_cached(draft)));
    let session = viewer
        .render_in_wrapper(ViewerOptions::for_key(key()).with_docname("new-lead-abc123"))
        .expect("render")
        .session()
        .expect("session");
    assert_eq!(
        session.document_mode(),
        Some(&DocumentMode::EditLocals {
            name: "new-lead-abc123".to_string()
        })
    );
    assert!(session.slides().current_slide().owns_field(NEW_NAME_FIELD));
}

#[test]
fn viewer_module_single_schema_is_edited_under_its_own_name() {
    let settings: Schema = serde_yaml::from_str(
        r#"
name: Site Settings
issingle: 1
fields:
  - {fieldname: site_title, fieldtype: Data}
"#,
    )
    .expect("schema");
    let definition = SlideViewDefinition::new("Settings")
        .with_reference_doctype(SchemaName::parse("Site Settings").expect("schema"));
    let viewer = SlideViewer::new(Arc::new(InMemoryBackend::new().with_schema(settings)));
    let session = viewer
        .render_in_dialog(ViewerOptions::inline(definition))
        .expect("render")
        .session()
        .expect("session");
    assert_eq!(session.target(), RenderTarget::Dialog);
    assert_eq!(
        session.document_mode(),
        Some(&DocumentMode::Edit {
            name: "Site Settings".to_string(),
            resident: false
        })
    );
}

#[test]
fn viewer_module_custom_completion_replaces_saving() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let backend = Arc::new(backend());
    let viewer = SlideViewer::new(backend.clone());
    let mut session = viewer
        .render_in_wrapper(ViewerOptions::for_key(key()).on_complete(move |bag| {
            assert!(bag.is_doc());
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .expect("render")
        .session()
        .expect("session");

    session.set_value("lead_name", json!("Ada")).expect("lead name");
    assert!(matches!(session.complete().expect("complete"), NavOutcome::Completed(_)));
    assert!(matches!(session.completion(), Some(CompletionStatus::Handled)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(backend.saves().is_empty());
}

#[test]
fn viewer_module_failed_save_is_reported() {
    let viewer = SlideViewer::new(Arc::new(backend().fail_saves("disk full")));
    let mut session = viewer
        .render_in_wrapper(ViewerOptions::for_key(key()))
        .expect("render")
        .session()
        .expect("session");
    assert!(matches!(session.complete().expect("complete"), NavOutcome::Completed(_)));
    match session.completion() {
        Some(CompletionStatus::SaveFailed(err)) => {
            assert_eq!(err.kind(), ViewerErrorKind::SaveFailed);
            assert!(err.to_string().contains("disk full"));
        }
        other => panic!("expected a failed save, got {other:?}"),
    }
}

struct RequireEmail;

impl FormScript for RequireEmail {
    fn validate(&mut self, form: &mut FormHandle) -> Result<(), String> {
        match form.get("email") {
            Some(value) if value.as_str().is_some_and(|email| email.contains('@')) => Ok(()),
            _ => Err("email is required to save".to_string()),
        }
    }
}

struct UpperCaseName;

impl FormScript for UpperCaseName {
    fn on_change(&mut self, fieldname: &str, form: &mut FormHandle) {
        if fieldname != "lead_name" {
            return;
        }
        let upper = form
            .get("lead_name")
            .and_then(|value| value.as_str())
            .map(str::to_uppercase);
        if let Some(upper) = upper {
            if form.get("lead_name").and_then(|value| value.as_str()) != Some(upper.as_str()) {
                form.set_value("lead_name", json!(upper));
            }
        }
    }
}

#[test]
fn viewer_module_form_scripts_react_to_changes_and_gate_saving() {
    let backend = Arc::new(backend());
    let viewer = SlideViewer::new(backend.clone());
    let mut session = viewer
        .render_in_wrapper(
            ViewerOptions::for_key(key())
                .with_form(vec![Box::new(UpperCaseName), Box::new(RequireEmail)]),
        )
        .expect("render")
        .session()
        .expect("session");
    assert!(session.form().is_some());

    session.set_value("lead_name", json!("ada")).expect("lead name");
    assert_eq!(
        session.slides().bag().get("lead_name"),
        Some(&json!("ADA"))
    );

    assert!(matches!(session.complete().expect("complete"), NavOutcome::Completed(_)));
    assert!(matches!(
        session.completion(),
        Some(CompletionStatus::SaveFailed(_))
    ));
    assert!(backend.saves().is_empty());
}

#[test]
fn viewer_module_route_options_start_on_the_requested_slide() {
    let viewer = SlideViewer::new(Arc::new(backend().with_stored(stored_lead("LEAD-1"))));
    let route = SlideViewerRoute::parse("slide-viewer/lead-intake/LEAD-1/1").expect("route");
    let session = viewer
        .render_in_wrapper(ViewerOptions::from_route(&route))
        .expect("render")
        .session()
        .expect("session");
    assert_eq!(session.slides().current_id(), 1);
    assert_eq!(session.slides().current_slide().name(), "contact");
}
