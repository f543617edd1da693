pub mod definition;
pub mod error;
pub mod settings;

pub use definition::{FieldRef, GroupSpec, SlideBuilder, SlideGroupSpec, SlideViewDefinition};
pub use error::ConfigError;
pub use settings::ViewerSettings;
