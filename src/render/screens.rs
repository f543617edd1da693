use crate::slides::{DotState, ValidationStatus};
use crate::viewer::{CompletionStatus, ErrorPage, RenderTarget, ViewerSession};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Padding, Paragraph, Row, Table, Wrap};
use ratatui::Frame;
use serde_json::Value;

const HINT_TEXT: &str =
    "Enter/PgDn next | PgUp back | Up/Down field | Ctrl-S complete | Ctrl-A add more | Esc quit";
const DOTS_HINT_TEXT: &str = "F1..F9 jump to slide";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub fieldname: String,
    pub label: String,
    pub fieldtype: String,
    pub value: String,
    pub required: bool,
    pub read_only: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideViewModel {
    pub target: RenderTarget,
    pub title: String,
    pub slide_title: String,
    pub subtitle: Option<String>,
    pub help: Option<String>,
    pub fields: Vec<FieldRow>,
    pub selected: usize,
    pub dots: Vec<DotState>,
    pub progress: String,
    pub prev_label: Option<String>,
    pub next_label: String,
    pub next_enabled: bool,
    pub fullpage_route: Option<String>,
    pub status_text: String,
    pub hint_text: String,
}

pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn dot_symbol(dot: &DotState) -> &'static str {
    if dot.active {
        "●"
    } else if dot.skip {
        "·"
    } else if dot.error {
        "✗"
    } else if dot.success {
        "✓"
    } else {
        "○"
    }
}

fn completion_text(status: Option<&CompletionStatus>) -> String {
    match status {
        Some(CompletionStatus::Saved { name, route }) => format!("Saved {name} ({route})"),
        Some(CompletionStatus::SaveFailed(err)) => err.to_string(),
        Some(CompletionStatus::Handled) | None => "Completed".to_string(),
    }
}

/// Visible fields of the current slide. Errors only show once the slide
/// has been validated and failed.
fn field_rows(session: &ViewerSession) -> Vec<FieldRow> {
    let slide = session.slides().current_slide();
    let Some(form) = slide.form() else {
        return Vec::new();
    };
    let show_errors = slide.last_validation() == ValidationStatus::Invalid;
    let invalid = form.invalid_fields();
    let missing = form.missing_required();
    form.fields()
        .iter()
        .filter(|field| !field.fieldtype.is_layout())
        .filter(|field| !form.is_field_hidden(field.fieldname.as_str()))
        .map(|field| {
            let fieldname = field.fieldname.as_str();
            let error = if !show_errors {
                None
            } else if let Some(issue) = invalid.iter().find(|issue| issue.fieldname == fieldname) {
                Some(issue.reason.clone())
            } else if missing.iter().any(|name| name == fieldname) {
                Some("required".to_string())
            } else {
                None
            };
            FieldRow {
                fieldname: fieldname.to_string(),
                label: field.display_label().to_string(),
                fieldtype: field.fieldtype.as_str().to_string(),
                value: display_value(form.get_value(fieldname)),
                required: field.reqd,
                read_only: field.read_only,
                error,
            }
        })
        .collect()
}

pub fn project_view_model(session: &ViewerSession, selected: usize, status: &str) -> SlideViewModel {
    let slides = session.slides();
    let dots = slides.dots();
    let actions = slides.action_state();
    let progress = format!("{}/{}", dots.completed(), dots.total());

    if slides.is_complete() {
        return SlideViewModel {
            target: session.target(),
            title: session.title().to_string(),
            slide_title: "Done".to_string(),
            subtitle: None,
            help: None,
            fields: Vec::new(),
            selected: 0,
            dots: dots.dots().to_vec(),
            progress,
            prev_label: None,
            next_label: "Close".to_string(),
            next_enabled: true,
            fullpage_route: session.fullpage_edit_route(),
            status_text: completion_text(session.completion()),
            hint_text: "Any key closes".to_string(),
        };
    }

    let descriptor = slides.current_slide().descriptor();
    let fields = field_rows(session);
    let selected = if fields.is_empty() {
        0
    } else {
        selected.min(fields.len() - 1)
    };
    let next_label = if actions.busy {
        "Validating..."
    } else if actions.next_completes {
        "Complete"
    } else {
        "Next"
    };
    let hint_text = if slides.clickable_progress_dots() {
        format!("{HINT_TEXT} | {DOTS_HINT_TEXT}")
    } else {
        HINT_TEXT.to_string()
    };
    SlideViewModel {
        target: session.target(),
        title: session.title().to_string(),
        slide_title: descriptor.title.clone(),
        subtitle: descriptor.subtitle.clone(),
        help: descriptor.help.clone(),
        fields,
        selected,
        dots: dots.dots().to_vec(),
        progress,
        prev_label: actions.can_prev.then(|| "Back".to_string()),
        next_label: next_label.to_string(),
        next_enabled: actions.next_enabled,
        fullpage_route: session.fullpage_edit_route(),
        status_text: status.to_string(),
        hint_text,
    }
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn target_area(frame: &mut Frame<'_>, target: RenderTarget) -> Rect {
    match target {
        RenderTarget::Page => frame.area(),
        RenderTarget::Dialog => {
            let area = centered_rect(80, 80, frame.area());
            frame.render_widget(Clear, area);
            area
        }
    }
}

fn dot_style(dot: &DotState) -> Style {
    if dot.active {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if dot.skip {
        Style::default().fg(Color::DarkGray)
    } else if dot.error {
        Style::default().fg(Color::Red)
    } else if dot.success {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    }
}

pub fn draw_session(frame: &mut Frame<'_>, view_model: &SlideViewModel) {
    let area = target_area(frame, view_model.target);
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(view_model.title.clone());
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(inner);

    let mut header = vec![Line::from(Span::styled(
        view_model.slide_title.clone(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];
    if let Some(subtitle) = view_model.subtitle.as_ref() {
        header.push(Line::from(subtitle.clone()));
    }
    if let Some(help) = view_model.help.as_ref() {
        header.push(Line::from(Span::styled(
            help.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    frame.render_widget(Paragraph::new(header).wrap(Wrap { trim: true }), chunks[0]);

    let mut dots: Vec<Span> = view_model
        .dots
        .iter()
        .flat_map(|dot| [Span::styled(dot_symbol(dot), dot_style(dot)), Span::raw(" ")])
        .collect();
    dots.push(Span::raw(format!(" {}", view_model.progress)));
    frame.render_widget(Paragraph::new(Line::from(dots)), chunks[1]);

    let rows = view_model.fields.iter().enumerate().map(|(idx, row)| {
        let style = if idx == view_model.selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if row.read_only {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let label = if row.required {
            format!("{} *", row.label)
        } else {
            row.label.clone()
        };
        Row::new(vec![
            Cell::from(label),
            Cell::from(row.value.clone()),
            Cell::from(Span::styled(
                row.error.clone().unwrap_or_default(),
                Style::default().fg(Color::Red),
            )),
        ])
        .style(style)
    });
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(35),
            Constraint::Percentage(40),
            Constraint::Percentage(25),
        ],
    )
    .column_spacing(2)
    .block(
        Block::default()
            .borders(Borders::TOP)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(table, chunks[2]);

    let mut action_spans = Vec::new();
    if let Some(prev) = view_model.prev_label.as_ref() {
        action_spans.push(Span::raw(format!("[{prev}] ")));
    }
    let next_style = if view_model.next_enabled {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    action_spans.push(Span::styled(format!("[{}]", view_model.next_label), next_style));
    if let Some(route) = view_model.fullpage_route.as_ref() {
        action_spans.push(Span::raw(format!("  Edit full form: {route}")));
    }
    let footer = Paragraph::new(vec![
        Line::from(action_spans),
        Line::from(view_model.hint_text.clone()),
        Line::from(format!("Status: {}", view_model.status_text)),
    ])
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);
}

pub fn draw_error_page(frame: &mut Frame<'_>, page: &ErrorPage) {
    let area = centered_rect(60, 40, frame.area());
    frame.render_widget(Clear, area);
    let body = Paragraph::new(vec![
        Line::from(Span::styled(
            page.title.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(page.message.clone()),
        Line::from(Span::styled(
            page.kind.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .padding(Padding::new(2, 2, 1, 1)),
    );
    frame.render_widget(body, area);
}
