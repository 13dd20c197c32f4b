use cloudspan_driver::ProviderKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Config file not found. Checked:\n\
        - $CLOUDSPAN_CONFIG\n\
        - $CLOUDSPAN_PATH/config/config.yaml\n\
        - ./config/config.yaml\n\
        - ~/.config/cloudspan/config.yaml"
    )]
    ConfigFileNotFound,

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No `{0}` section in config file")]
    MissingProvider(ProviderKind),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
