pub mod descriptor;
pub mod events;
pub mod form_adapter;
pub mod hooks;
pub mod progress;
pub mod sequencer;
pub mod slide;

pub use descriptor::SlideDescriptor;
pub use events::{ListenerId, SessionEvents, SlideEvent};
pub use form_adapter::{FormHandle, FormScript, SlideViewerForm};
pub use hooks::{DefaultHooks, SlideContext, SlideHooks, Validation};
pub use progress::{DotState, DotsUpdate, ProgressDots};
pub use sequencer::{
    ActionState, Direction, NavOutcome, Slides, SlidesError, SlidesOptions, ValidationTicket,
};
pub use slide::{ErrorCheck, Slide, SlideErrors, SlideMode, SlideState, ValidationStatus};
