//! Terminal presentation of a viewer session.

pub mod keys;
pub mod screens;

pub use keys::{slide_action_from_key, SlideAction};
pub use screens::{
    draw_error_page, draw_session, project_view_model, FieldRow, SlideViewModel,
};
