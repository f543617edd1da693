use serde_json::{json, Value};
use slideview::config::ViewerSettings;
use slideview::document::Document;
use slideview::slides::NavOutcome;
use slideview::viewer::{
    CompletionStatus, DocumentMode, SlideViewer, SlideViewerRoute, ViewerErrorKind, ViewerOptions,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, body).expect("write fixture");
}

fn seed(root: &Path) -> ViewerSettings {
    write(
        &root.join("viewer.yaml"),
        r#"
definitions_dir: definitions
schemas_dir: schemas
documents_dir: documents
log_path: logs/viewer.log
"#,
    );
    write(
        &root.join("schemas/customer.yaml"),
        r#"
name: Customer
fields:
  - {fieldname: customer_name, fieldtype: Data, reqd: 1}
  - {fieldname: kind, fieldtype: Select, options: "Person\nCompany"}
  - {fieldname: company, fieldtype: Section Break, label: Company}
  - {fieldname: company_name, fieldtype: Data}
  - {fieldname: notes, fieldtype: Small Text}
"#,
    );
    write(
        &root.join("definitions/customer-onboarding.yaml"),
        r#"
title: Customer Onboarding
reference_doctype: Customer
allow_any: true
done_state: true
slides:
  - [customer_name]
  - section:company
  - "*"
"#,
    );
    ViewerSettings::from_path(&root.join("viewer.yaml")).expect("settings")
}

#[test]
fn viewer_files_module_completed_wizard_is_written_to_disk() {
    let dir = tempdir().expect("tempdir");
    let settings = seed(dir.path());
    let viewer = SlideViewer::from_settings(&settings);
    let route = SlideViewerRoute::parse("slide-viewer/customer-onboarding").expect("route");
    let mut session = viewer
        .render_in_wrapper(ViewerOptions::from_route(&route))
        .expect("render")
        .session()
        .expect("session");

    assert!(matches!(
        session.document_mode(),
        Some(DocumentMode::Create { name: None })
    ));
    let names: Vec<&str> = session
        .slides()
        .slides()
        .iter()
        .map(|slide| slide.name())
        .collect();
    assert_eq!(names, vec!["slide-0", "company", "slide-2"]);
    assert!(session.slides().dots().dots()[2].skip);
    assert!(session.slides().clickable_progress_dots());

    session.set_value("customer_name", json!("Ada")).expect("name");
    assert_eq!(
        session.jump_to(1).expect("jump"),
        NavOutcome::Moved { from: 0, to: 1 }
    );
    session
        .set_value("company_name", json!("Analytical Engines"))
        .expect("company");
    assert!(matches!(session.next().expect("finish"), NavOutcome::Completed(_)));

    let Some(CompletionStatus::Saved { name, route }) = session.completion() else {
        panic!("expected a save, got {:?}", session.completion());
    };
    assert!(name.starts_with("new-customer-"));
    assert_eq!(route, &format!("app/customer/{name}"));

    let stored = settings.document_path(&session.schema().expect("schema").name, name);
    let document: Document =
        serde_json::from_str(&fs::read_to_string(&stored).expect("read saved")).expect("parse saved");
    assert_eq!(document.get("customer_name"), Some(&json!("Ada")));
    assert_eq!(document.get("company_name"), Some(&json!("Analytical Engines")));
    assert!(!document.is_local);

    let log = fs::read_to_string(dir.path().join("logs/viewer.log")).expect("read log");
    let events: Vec<String> = log
        .lines()
        .map(|line| {
            let value: Value = serde_json::from_str(line).expect("json line");
            value["event"].as_str().expect("event").to_string()
        })
        .collect();
    assert!(events.iter().any(|event| event == "viewer.rendered"));
    assert!(events.iter().any(|event| event == "slides.completed"));
    assert!(events.iter().any(|event| event == "viewer.saved"));
}

#[test]
fn viewer_files_module_saved_record_reopens_in_edit_mode() {
    let dir = tempdir().expect("tempdir");
    let settings = seed(dir.path());
    write(
        &dir.path().join("documents/customer/CUST-1.json"),
        r#"{"doctype": "Customer", "name": "CUST-1", "values": {"customer_name": "Grace"}}"#,
    );
    let viewer = SlideViewer::from_settings(&settings);
    let route =
        SlideViewerRoute::parse("slide-viewer/customer-onboarding/CUST-1").expect("route");
    let session = viewer
        .render_in_wrapper(ViewerOptions::from_route(&route))
        .expect("render")
        .session()
        .expect("session");
    assert_eq!(
        session.document_mode(),
        Some(&DocumentMode::Edit {
            name: "CUST-1".to_string(),
            resident: false
        })
    );
    let form = session.slides().current_slide().form().expect("form");
    assert_eq!(form.get_value("customer_name"), Some(&json!("Grace")));
}

#[test]
fn viewer_files_module_unknown_route_renders_not_found_page() {
    let dir = tempdir().expect("tempdir");
    let settings = seed(dir.path());
    let viewer = SlideViewer::from_settings(&settings);
    let route = SlideViewerRoute::parse("slide-viewer/vendor-onboarding").expect("route");
    let rendered = viewer
        .render_in_wrapper(ViewerOptions::from_route(&route))
        .expect("error page");
    let page = rendered.error_page().expect("page");
    assert_eq!(page.kind, ViewerErrorKind::DefinitionMissing);
    assert_eq!(page.title, "Not Found");
}
