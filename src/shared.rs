pub mod fs_atomic;
pub mod ids;
pub mod logging;
pub mod serde_ext;

pub use fs_atomic::atomic_write_file;
pub use ids::{DefinitionKey, Fieldname, SchemaName};
pub use logging::{LogLevel, SessionLog};
