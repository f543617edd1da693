/// Failures while loading or storing viewer settings, slide view definitions
/// and schemas.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize {path} as yaml: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("malformed yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid viewer settings: {0}")]
    Settings(String),
    #[error("invalid slide view definition: {0}")]
    Definition(String),
    #[error("invalid schema: {0}")]
    Schema(String),
}
