pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build the 'Environment' from the provided string.")]
    StringToEnvironmentFail,
    #[error("failed to parse 'DbConfig' from the provided string.")]
    StringToDbConfigFail,

    #[error("figment error: {0}")]
    Figment(#[from] figment::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
