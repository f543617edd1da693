use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideAction {
    Prev,
    Next,
    Complete,
    JumpTo(usize),
    SelectPrevField,
    SelectNextField,
    Input(char),
    DeleteChar,
    Toggle,
    AddMore,
    Cancel,
}

impl SlideAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SlideAction::Prev => "prev",
            SlideAction::Next => "next",
            SlideAction::Complete => "complete",
            SlideAction::JumpTo(_) => "jump_to",
            SlideAction::SelectPrevField => "select_prev_field",
            SlideAction::SelectNextField => "select_next_field",
            SlideAction::Input(_) => "input",
            SlideAction::DeleteChar => "delete_char",
            SlideAction::Toggle => "toggle",
            SlideAction::AddMore => "add_more",
            SlideAction::Cancel => "cancel",
        }
    }
}

pub fn slide_action_from_key(key: KeyEvent) -> Option<SlideAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(SlideAction::Cancel),
            KeyCode::Char('s') => Some(SlideAction::Complete),
            KeyCode::Char('a') => Some(SlideAction::AddMore),
            KeyCode::Char('t') => Some(SlideAction::Toggle),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Esc => Some(SlideAction::Cancel),
        KeyCode::PageUp | KeyCode::Left => Some(SlideAction::Prev),
        KeyCode::PageDown | KeyCode::Right | KeyCode::Enter => Some(SlideAction::Next),
        KeyCode::Up | KeyCode::BackTab => Some(SlideAction::SelectPrevField),
        KeyCode::Down | KeyCode::Tab => Some(SlideAction::SelectNextField),
        KeyCode::Backspace => Some(SlideAction::DeleteChar),
        KeyCode::F(n) if n >= 1 => Some(SlideAction::JumpTo(usize::from(n) - 1)),
        KeyCode::Char(ch) => Some(SlideAction::Input(ch)),
        _ => None,
    }
}
