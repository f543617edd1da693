use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::Terminal;
use serde_json::json;
use slideview::config::SlideViewDefinition;
use slideview::render::{
    draw_error_page, draw_session, project_view_model, slide_action_from_key, SlideAction,
};
use slideview::schema::Schema;
use slideview::shared::SchemaName;
use slideview::slides::NavOutcome;
use slideview::viewer::{
    ErrorPage, InMemoryBackend, RenderTarget, SlideViewer, ViewerError, ViewerOptions,
    ViewerSession,
};
use std::sync::Arc;

fn schema() -> Schema {
    serde_yaml::from_str(
        r#"
name: Lead
fields:
  - {fieldname: lead_name, fieldtype: Data, label: Lead Name, reqd: 1}
  - {fieldname: contact, fieldtype: Section Break, label: Contact Details}
  - {fieldname: email, fieldtype: Data, label: Email}
"#,
    )
    .expect("schema")
}

fn session(dialog: bool) -> ViewerSession {
    let definition = SlideViewDefinition::new("Lead Intake")
        .with_reference_doctype(SchemaName::parse("Lead").expect("schema"));
    let viewer = SlideViewer::new(Arc::new(InMemoryBackend::new().with_schema(schema())));
    let options = ViewerOptions::inline(definition);
    let rendered = if dialog {
        viewer.render_in_dialog(options)
    } else {
        viewer.render_in_wrapper(options)
    };
    rendered.expect("render").session().expect("session")
}

fn buffer_text(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut text = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

#[test]
fn render_screens_module_projects_current_slide() {
    let mut session = session(false);
    let model = project_view_model(&session, 99, "ready");
    assert_eq!(model.target, RenderTarget::Page);
    assert_eq!(model.title, "Lead Intake");
    assert_eq!(model.slide_title, "Lead Intake");
    assert_eq!(model.fields.len(), 1);
    assert_eq!(model.selected, 0);
    assert!(model.fields[0].required);
    assert_eq!(model.fields[0].error, None);
    assert_eq!(model.next_label, "Next");
    assert!(!model.next_enabled);
    assert_eq!(model.progress, "0/2");

    session.set_value("lead_name", json!("Ada")).expect("value");
    session.next().expect("next");
    let model = project_view_model(&session, 0, "moved");
    assert_eq!(model.slide_title, "Contact Details");
    assert_eq!(model.next_label, "Complete");
    assert_eq!(model.prev_label.as_deref(), Some("Back"));
    assert_eq!(model.progress, "1/2");
}

#[test]
fn render_screens_module_shows_field_errors_after_failed_check() {
    let mut session = session(false);
    assert!(matches!(
        session.next().expect("next"),
        NavOutcome::Blocked { slide: 0, .. }
    ));
    let model = project_view_model(&session, 0, "");
    assert_eq!(model.fields[0].error.as_deref(), Some("required"));

    let definition = SlideViewDefinition {
        allow_any: true,
        ..SlideViewDefinition::new("Lead Intake")
            .with_reference_doctype(SchemaName::parse("Lead").expect("schema"))
    };
    let viewer = SlideViewer::new(Arc::new(InMemoryBackend::new().with_schema(schema())));
    let mut session = viewer
        .render_in_wrapper(ViewerOptions::inline(definition))
        .expect("render")
        .session()
        .expect("session");
    assert_eq!(
        session.next().expect("next"),
        NavOutcome::Moved { from: 0, to: 1 }
    );
    session.prev().expect("prev");
    let model = project_view_model(&session, 0, "");
    assert_eq!(model.fields[0].error.as_deref(), Some("required"));
    assert!(model.dots[0].active);
    assert!(model.hint_text.contains("jump"));
}

#[test]
fn render_screens_module_draws_page_and_dialog() {
    let page = session(false);
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
    terminal
        .draw(|frame| draw_session(frame, &project_view_model(&page, 0, "ready")))
        .expect("draw page");
    let text = buffer_text(terminal.backend().buffer());
    assert!(text.contains("Lead Intake"));
    assert!(text.contains("Lead Name *"));
    assert!(text.contains("[Next]"));
    let first_line = text.lines().next().expect("line");
    assert!(first_line.starts_with('┌'));

    let dialog = session(true);
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
    terminal
        .draw(|frame| draw_session(frame, &project_view_model(&dialog, 0, "ready")))
        .expect("draw dialog");
    let text = buffer_text(terminal.backend().buffer());
    assert!(text.contains("Lead Intake"));
    let first_line = text.lines().next().expect("line");
    assert!(!first_line.contains('┌'));
}

#[test]
fn render_screens_module_draws_error_page() {
    let page = ErrorPage::from_error(&ViewerError::NoSlides {
        title: "Empty".to_string(),
    });
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
    terminal
        .draw(|frame| draw_error_page(frame, &page))
        .expect("draw");
    let text = buffer_text(terminal.backend().buffer());
    assert!(text.contains("Not Found"));
    assert!(text.contains("no-slides"));
}

#[test]
fn render_screens_module_maps_wizard_keys() {
    let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
    assert_eq!(slide_action_from_key(key(KeyCode::Enter)), Some(SlideAction::Next));
    assert_eq!(slide_action_from_key(key(KeyCode::Left)), Some(SlideAction::Prev));
    assert_eq!(
        slide_action_from_key(key(KeyCode::F(3))),
        Some(SlideAction::JumpTo(2))
    );
    assert_eq!(
        slide_action_from_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)),
        Some(SlideAction::Complete)
    );
    assert_eq!(
        slide_action_from_key(key(KeyCode::Char('x'))),
        Some(SlideAction::Input('x'))
    );
}
