use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde_json::Value;
use slideview::config::ViewerSettings;
use slideview::render::{
    draw_error_page, draw_session, project_view_model, slide_action_from_key, SlideAction,
};
use slideview::slides::NavOutcome;
use slideview::viewer::{
    CompletionStatus, ErrorPage, Rendered, SlideViewer, SlideViewerRoute, ViewerOptions,
    ViewerSession,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

const USAGE: &str = "usage: slide-viewer <settings.yaml> <slide-viewer/<key>[/<docname>[/<slide>]]>";

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

fn with_terminal<T>(body: impl FnOnce(&mut Tui) -> Result<T, String>) -> Result<T, String> {
    let mut stdout = io::stdout();
    enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {e}"))?;
    execute!(stdout, EnterAlternateScreen, Hide)
        .map_err(|e| format!("failed to enter viewer screen: {e}"))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {e}"))?;
    let result = body(&mut terminal);
    disable_raw_mode().map_err(|e| format!("failed to disable raw mode: {e}"))?;
    execute!(terminal.backend_mut(), Show, LeaveAlternateScreen)
        .map_err(|e| format!("failed to leave viewer screen: {e}"))?;
    result
}

fn wait_for_key() -> Result<(), String> {
    loop {
        if let Event::Key(_) = event::read().map_err(|e| format!("failed to read input: {e}"))? {
            return Ok(());
        }
    }
}

fn show_error_page(terminal: &mut Tui, page: &ErrorPage) -> Result<(), String> {
    terminal
        .draw(|frame| draw_error_page(frame, page))
        .map_err(|e| format!("failed to render error page: {e}"))?;
    wait_for_key()
}

fn selected_fieldname(session: &ViewerSession, selected: usize) -> Option<String> {
    project_view_model(session, selected, "")
        .fields
        .get(selected)
        .map(|row| row.fieldname.clone())
}

fn edit_selected(
    session: &mut ViewerSession,
    selected: usize,
    edit: impl FnOnce(Option<&Value>) -> Value,
) -> Result<(), String> {
    let Some(fieldname) = selected_fieldname(session, selected) else {
        return Ok(());
    };
    let current = session.slides().values().get(&fieldname).cloned();
    let value = edit(current.as_ref());
    session
        .set_value(&fieldname, value)
        .map_err(|err| err.to_string())
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn describe(outcome: &NavOutcome) -> String {
    match outcome {
        NavOutcome::Moved { to, .. } => format!("moved to slide {}", to + 1),
        NavOutcome::Stayed => "nothing to do".to_string(),
        NavOutcome::Blocked { errors, .. } => format!("cannot continue: {}", errors.summary()),
        NavOutcome::Pending(_) => "validating...".to_string(),
        NavOutcome::Completed(_) => "completed".to_string(),
    }
}

/// Returns the route to report once the session ends.
fn run_session(terminal: &mut Tui, session: &mut ViewerSession) -> Result<Option<String>, String> {
    let mut selected = 0;
    let mut status = String::new();
    loop {
        let view_model = project_view_model(session, selected, &status);
        selected = view_model.selected;
        terminal
            .draw(|frame| draw_session(frame, &view_model))
            .map_err(|e| format!("failed to render slide: {e}"))?;

        if session.slides().is_complete() {
            wait_for_key()?;
            return Ok(match session.completion() {
                Some(CompletionStatus::Saved { route, .. }) => Some(route.clone()),
                _ => None,
            });
        }

        if !event::poll(Duration::from_millis(250))
            .map_err(|e| format!("failed to poll input: {e}"))?
        {
            continue;
        }
        let Event::Key(key) = event::read().map_err(|e| format!("failed to read input: {e}"))?
        else {
            continue;
        };
        let Some(action) = slide_action_from_key(key) else {
            continue;
        };
        let field_count = view_model.fields.len();
        let result = match action {
            SlideAction::Cancel => {
                session.dispose();
                return Ok(None);
            }
            SlideAction::Next => session.next().map(|outcome| describe(&outcome)),
            SlideAction::Prev => session.prev().map(|outcome| describe(&outcome)),
            SlideAction::Complete => session.complete().map(|outcome| describe(&outcome)),
            SlideAction::JumpTo(index) => session.jump_to(index).map(|outcome| describe(&outcome)),
            SlideAction::AddMore => session
                .add_more_entry()
                .map(|entries| format!("{entries} entries")),
            SlideAction::SelectPrevField => {
                selected = selected.saturating_sub(1);
                Ok(String::new())
            }
            SlideAction::SelectNextField => {
                if selected + 1 < field_count {
                    selected += 1;
                }
                Ok(String::new())
            }
            SlideAction::Input(ch) => {
                let outcome = edit_selected(session, selected, |current| {
                    let mut text = text_of(current);
                    text.push(ch);
                    Value::String(text)
                });
                status = outcome.err().unwrap_or_default();
                continue;
            }
            SlideAction::DeleteChar => {
                let outcome = edit_selected(session, selected, |current| {
                    let mut text = text_of(current);
                    text.pop();
                    Value::String(text)
                });
                status = outcome.err().unwrap_or_default();
                continue;
            }
            SlideAction::Toggle => {
                let outcome = edit_selected(session, selected, |current| {
                    Value::Bool(!matches!(current, Some(Value::Bool(true))))
                });
                status = outcome.err().unwrap_or_default();
                continue;
            }
        };
        status = match result {
            Ok(text) => text,
            Err(err) => err.to_string(),
        };
        if matches!(
            action,
            SlideAction::Next | SlideAction::Prev | SlideAction::JumpTo(_)
        ) {
            selected = 0;
        }
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [settings_path, route] = args.as_slice() else {
        return Err(USAGE.to_string());
    };
    let settings =
        ViewerSettings::from_path(&PathBuf::from(settings_path)).map_err(|err| err.to_string())?;
    let route = SlideViewerRoute::parse(route).map_err(|err| err.to_string())?;
    let viewer = SlideViewer::from_settings(&settings);
    let rendered = viewer
        .render_in_wrapper(ViewerOptions::from_route(&route))
        .map_err(|err| format!("{}: {err}", err.kind()))?;

    let saved_route = with_terminal(|terminal| match rendered {
        Rendered::ErrorPage(page) => {
            show_error_page(terminal, &page)?;
            Err(format!("{}: {}", page.kind, page.message))
        }
        Rendered::Session(mut session) => run_session(terminal, &mut session),
    })?;
    if let Some(route) = saved_route {
        println!("{route}");
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
